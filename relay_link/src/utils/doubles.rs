use crate::{
    components::relay_board::actuating::relay_controller::Channel,
    devices::{
        hardware::{
            output_pin::{Level, OutputError, OutputPin},
            serial_link::{Link, LinkError},
        },
        software::indicator::Indicator,
    },
};
use std::{
    cell::RefCell,
    collections::VecDeque,
    io,
    rc::Rc,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// A side effect observed by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Configured(u8),
    Level(u8, Level),
    Energized(Channel),
    Deenergized(Channel),
}

/// Shared log of output and indicator calls, in call order.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<RecordedCall>>>,
}

impl Recorder {
    pub fn pin(&self, pin_id: u8) -> RecordingPin {
        RecordingPin {
            pin_id,
            fail: false,
            calls: self.calls.clone(),
        }
    }

    /// A pin whose configure and every write fail and are not recorded.
    pub fn failing_pin(&self, pin_id: u8) -> RecordingPin {
        RecordingPin {
            fail: true,
            ..self.pin(pin_id)
        }
    }

    pub fn indicator(&self) -> RecordingIndicator {
        RecordingIndicator {
            calls: self.calls.clone(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

pub struct RecordingPin {
    pin_id: u8,
    fail: bool,
    calls: Rc<RefCell<Vec<RecordedCall>>>,
}

impl OutputPin for RecordingPin {
    fn pin_id(&self) -> u8 {
        self.pin_id
    }

    fn configure(&mut self) -> Result<(), OutputError> {
        if self.fail {
            return Err(OutputError::Configure {
                pin_id: self.pin_id,
                source: io::Error::new(io::ErrorKind::PermissionDenied, "gpio locked"),
            });
        }
        self.calls
            .borrow_mut()
            .push(RecordedCall::Configured(self.pin_id));
        Ok(())
    }

    fn set_level(&mut self, level: Level) -> Result<(), OutputError> {
        if self.fail {
            return Err(OutputError::Drive {
                pin_id: self.pin_id,
                level,
                source: io::Error::new(io::ErrorKind::PermissionDenied, "gpio locked"),
            });
        }
        self.calls
            .borrow_mut()
            .push(RecordedCall::Level(self.pin_id, level));
        Ok(())
    }
}

pub struct RecordingIndicator {
    calls: Rc<RefCell<Vec<RecordedCall>>>,
}

impl Indicator for RecordingIndicator {
    fn show_energized(&mut self, channel: Channel) {
        self.calls.borrow_mut().push(RecordedCall::Energized(channel));
    }

    fn show_deenergized(&mut self, channel: Channel) {
        self.calls
            .borrow_mut()
            .push(RecordedCall::Deenergized(channel));
    }
}

#[derive(Debug, Default)]
struct Script {
    pending: VecDeque<u8>,
    closed: bool,
    read_after_close: bool,
    broken: bool,
    polls: usize,
}

/// In memory link fed from the test. Clones share the same byte
/// stream so a test can keep feeding bytes after handing the link
/// to a reader thread.
#[derive(Debug, Default, Clone)]
pub struct ScriptedLink {
    script: Arc<Mutex<Script>>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the stream.
    pub fn feed(&self, bytes: &[u8]) {
        self.lock().pending.extend(bytes);
    }

    /// Make every following read fail with an i/o error.
    pub fn break_link(&self) {
        self.lock().broken = true;
    }

    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of times the reader asked how many bytes are waiting.
    pub fn polls(&self) -> usize {
        self.lock().polls
    }

    /// True if anything touched the link after it was closed.
    pub fn read_after_close(&self) -> bool {
        self.lock().read_after_close
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_open(script: &mut Script) -> Result<(), LinkError> {
        if script.closed {
            script.read_after_close = true;
            return Err(LinkError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "link closed",
            )));
        }
        if script.broken {
            return Err(LinkError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device unplugged",
            )));
        }
        Ok(())
    }
}

impl Link for ScriptedLink {
    fn bytes_available(&mut self) -> Result<usize, LinkError> {
        let mut script = self.lock();
        Self::check_open(&mut script)?;
        script.polls += 1;
        Ok(script.pending.len())
    }

    /// Like a serial port with a timeout, a short stream consumes what
    /// is there and then times out.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), LinkError> {
        let mut script = self.lock();
        Self::check_open(&mut script)?;
        for slot in buf.iter_mut() {
            match script.pending.pop_front() {
                Some(byte) => *slot = byte,
                None => return Err(LinkError::TimedOut),
            }
        }
        Ok(())
    }

    fn close(self) {
        self.lock().closed = true;
    }
}
