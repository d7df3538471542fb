use crate::{
    components::relay_board::sensing::frame_reader::FrameReader,
    devices::hardware::serial_link::{Link, LinkError},
    messages::transfer::{transfer_queue, QueueConsumer},
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tracing::{error, info, warn};

/// One shot stop flag shared between the lifecycle manager and the
/// reader thread. Once stopped it stays stopped.
#[derive(Debug, Clone, Default)]
pub struct RunSignal {
    stopped: Arc<AtomicBool>,
}

impl RunSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Owns the serial reader thread. Startup opens the transfer queue
/// and, if a link is available, starts the reader on it. Shutdown
/// stops the reader, joins it and only then closes the link, so no
/// read can happen on a closed link.
pub struct LifecycleManager<L: Link + 'static> {
    run: RunSignal,
    reader: Option<JoinHandle<L>>,
}

impl<L: Link + 'static> LifecycleManager<L> {
    /// Start serial ingestion. A link that failed to open leaves the
    /// panel in manual control only, this is not an error. Returns the
    /// consumer end of the transfer queue for the dispatcher.
    ///
    /// * `link`: result of opening the link.
    /// * `idle_poll`: reader sleep when no bytes are waiting.
    pub fn start(link: Result<L, LinkError>, idle_poll: Duration) -> (Self, QueueConsumer) {
        let (producer, consumer) = transfer_queue();
        let run = RunSignal::new();

        let reader = match link {
            Ok(link) => {
                let frame_reader = FrameReader::new(link, producer, run.clone(), idle_poll);
                match thread::Builder::new()
                    .name(String::from("llap-reader"))
                    .spawn(move || frame_reader.run())
                {
                    Ok(handle) => Some(handle),
                    Err(err) => {
                        warn!(%err, "could not start frame reader, serial input disabled");
                        None
                    }
                }
            }
            Err(err) => {
                warn!(%err, "serial input disabled, continuing with manual control only");
                None
            }
        };

        (Self { run, reader }, consumer)
    }

    /// True while a reader thread is attached. A reader that stopped
    /// on a link failure still counts until it is joined.
    #[cfg(test)]
    fn is_reading(&self) -> bool {
        self.reader.is_some()
    }

    #[cfg(test)]
    fn run_signal(&self) -> RunSignal {
        self.run.clone()
    }

    /// Stop the reader, wait for it to exit and close the link. Blocks
    /// for at most one idle poll plus one frame read.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.run.stop();
        let Some(handle) = self.reader.take() else {
            return;
        };
        info!("waiting for frame reader to exit");
        match handle.join() {
            Ok(link) => link.close(),
            Err(_) => error!("frame reader panicked, link dropped without close"),
        }
    }
}

impl<L: Link + 'static> Drop for LifecycleManager<L> {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
