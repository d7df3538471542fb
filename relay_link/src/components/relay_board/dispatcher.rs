use crate::{
    components::relay_board::actuating::relay_controller::{Channel, RelayController, RelayState},
    messages::{
        control::llap::{DecodedMessage, StateKeyword},
        transfer::QueueConsumer,
    },
    settings::RelayPanelConfig,
};
use tracing::{trace, warn};

/// Turns queued LLAP messages into relay transitions. Run on the
/// panel event loop timer, never on the reader thread.
///
/// A message is acted on only if it is addressed to the configured
/// device, its payload starts with the tag of channel A or B and the
/// rest is `HIGH` or `LOW`. Anything else is line noise from other
/// devices and is dropped without error.
pub struct CommandDispatcher {
    queue: QueueConsumer,
    device_id: String,
    tag_a: String,
    tag_b: String,
}

impl CommandDispatcher {
    /// * `queue`: consumer end of the transfer queue.
    /// * `config`: source of the device id and channel tags.
    pub fn new(queue: QueueConsumer, config: &RelayPanelConfig) -> Self {
        Self {
            queue,
            device_id: config.device_id.clone(),
            tag_a: config.channels.a.tag.clone(),
            tag_b: config.channels.b.tag.clone(),
        }
    }

    /// Match a message against the addressing and payload grammar.
    pub fn interpret(&self, message: &DecodedMessage) -> Option<(Channel, RelayState)> {
        if message.device_id() != self.device_id {
            return None;
        }
        let channel = match message.channel_tag()? {
            tag if tag == self.tag_a => Channel::A,
            tag if tag == self.tag_b => Channel::B,
            _ => return None,
        };
        let keyword: StateKeyword = message.keyword()?.parse().ok()?;
        Some((channel, keyword.into()))
    }

    /// Drain the queue and apply every recognised command in arrival
    /// order. Returns how many transitions were applied.
    ///
    /// * `controller`: relays to drive.
    pub fn dispatch_pending(&mut self, controller: &mut RelayController) -> usize {
        let mut applied = 0;
        for message in self.queue.drain_all() {
            let Some((channel, target)) = self.interpret(&message) else {
                trace!(?message, "dropping unrecognised message");
                continue;
            };
            match controller.set_channel_state(channel, target) {
                Ok(()) => applied += 1,
                Err(err) => warn!(%err, %channel, "relay command not applied"),
            }
        }
        applied
    }
}
