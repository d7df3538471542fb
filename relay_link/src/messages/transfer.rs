use crate::messages::control::llap::DecodedMessage;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// Create the queue linking the frame reader to the dispatcher.
/// The queue is unbounded: the reader never stalls and never
/// drops a frame, at the cost of memory if the dispatcher stops
/// draining.
pub fn transfer_queue() -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueProducer { tx }, QueueConsumer { rx })
}

/// Reader side of the transfer queue.
#[derive(Clone, Debug)]
pub struct QueueProducer {
    tx: UnboundedSender<DecodedMessage>,
}

impl QueueProducer {
    /// Queue a message. Never blocks and never fails, a message
    /// pushed after the consumer is gone is discarded.
    pub fn push(&self, message: DecodedMessage) {
        if let Err(rejected) = self.tx.send(message) {
            trace!(message = ?rejected.0, "dispatcher gone, dropping message");
        }
    }
}

/// Dispatcher side of the transfer queue.
#[derive(Debug)]
pub struct QueueConsumer {
    rx: UnboundedReceiver<DecodedMessage>,
}

impl QueueConsumer {
    /// Remove every message queued so far, oldest first. Returns an
    /// empty vec when nothing is pending and never waits for input.
    pub fn drain_all(&mut self) -> Vec<DecodedMessage> {
        let mut drained = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            drained.push(message);
        }
        drained
    }
}
