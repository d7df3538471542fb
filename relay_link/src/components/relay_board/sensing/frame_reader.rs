use crate::{
    components::relay_board::lifecycle::RunSignal,
    devices::hardware::serial_link::{Link, LinkError},
    messages::{
        control::llap::{DecodedMessage, FRAME_LEN, FRAME_START},
        transfer::QueueProducer,
    },
};
use std::{thread, time::Duration};
use tracing::{debug, error, info, trace};

/// Frames the raw byte stream of a link into LLAP messages. Runs on
/// its own thread until the run signal is stopped, then hands the
/// link back so it can be closed once the loop has exited.
///
/// Framing is fixed width and has no checksum: a byte outside a
/// frame is dropped, and after a lost byte the search for the next
/// `a` may start inside the payload of the broken frame.
pub struct FrameReader<L: Link> {
    link: L,
    queue: QueueProducer,
    run: RunSignal,
    idle_poll: Duration,
}

impl<L: Link> FrameReader<L> {
    /// * `link`: open link, owned by the reader until it returns.
    /// * `queue`: where completed messages are pushed.
    /// * `run`: stop flag checked every iteration.
    /// * `idle_poll`: sleep when the link has nothing to read.
    pub fn new(link: L, queue: QueueProducer, run: RunSignal, idle_poll: Duration) -> Self {
        Self {
            link,
            queue,
            run,
            idle_poll,
        }
    }

    /// Read until stopped. A timed out frame is abandoned and the
    /// search for a start marker resumes, any other link failure ends
    /// the loop and serial input stays off for the session.
    pub fn run(mut self) -> L {
        info!("frame reader started");
        while !self.run.is_stopped() {
            match self.step() {
                Ok(()) => {}
                Err(LinkError::TimedOut) => {
                    debug!("link read timed out, discarding partial frame");
                }
                Err(err) => {
                    error!(%err, "serial link failed, command input disabled");
                    break;
                }
            }
        }
        info!("frame reader stopped");
        self.link
    }

    /// One poll of the link: idle, drop a stray byte, or read a frame.
    fn step(&mut self) -> Result<(), LinkError> {
        if self.link.bytes_available()? == 0 {
            thread::sleep(self.idle_poll);
            return Ok(());
        }

        let mut frame = [0u8; FRAME_LEN];
        self.link.read_exact(&mut frame[..1])?;
        if frame[0] != FRAME_START {
            trace!(byte = frame[0], "discarding byte outside a frame");
            return Ok(());
        }
        self.link.read_exact(&mut frame[1..])?;

        // A frame finished after shutdown started is not delivered.
        if self.run.is_stopped() {
            return Ok(());
        }
        let message = DecodedMessage::from_frame(&frame);
        debug!(device = message.device_id(), payload = message.payload(), "frame received");
        self.queue.push(message);
        Ok(())
    }
}
