use crate::{
    devices::{
        hardware::output_pin::{output_for, Level, OutputError, OutputPin},
        software::indicator::Indicator,
    },
    messages::control::llap::StateKeyword,
    settings::RelayPanelConfig,
};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tracing::{debug, warn};

/// The two relay channels on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Channel {
    A,
    B,
}

/// Whether a relay coil is energised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RelayState {
    #[strum(serialize = "ON")]
    On,
    #[strum(serialize = "OFF")]
    Off,
}

impl RelayState {
    fn level(self) -> Level {
        match self {
            Self::On => Level::High,
            Self::Off => Level::Low,
        }
    }
}

impl From<StateKeyword> for RelayState {
    fn from(keyword: StateKeyword) -> Self {
        match keyword {
            StateKeyword::High => Self::On,
            StateKeyword::Low => Self::Off,
        }
    }
}

/// One relay: the output it drives and its last applied state.
struct RelayChannel {
    output: Box<dyn OutputPin>,
    state: RelayState,
}

/// Two channel ON/OFF state machine shared by the manual panel and
/// the command dispatcher. Every transition goes through
/// [`RelayController::set_channel_state`], so the output, the stored
/// state and the indicator cannot drift apart. Lives on the panel
/// event loop only.
pub struct RelayController {
    a: RelayChannel,
    b: RelayChannel,
    indicator: Box<dyn Indicator>,
}

impl RelayController {
    /// Both channels start OFF. Nothing is driven until the first
    /// transition or [`RelayController::initialise`].
    ///
    /// * `a`: output for channel A.
    /// * `b`: output for channel B.
    /// * `indicator`: panel presentation of both channels.
    pub fn new(a: Box<dyn OutputPin>, b: Box<dyn OutputPin>, indicator: Box<dyn Indicator>) -> Self {
        Self {
            a: RelayChannel {
                output: a,
                state: RelayState::Off,
            },
            b: RelayChannel {
                output: b,
                state: RelayState::Off,
            },
            indicator,
        }
    }

    /// Build the controller with the gpio outputs named in the config.
    pub fn from_config(config: &RelayPanelConfig, indicator: Box<dyn Indicator>) -> Self {
        Self::new(
            output_for(config.channels.a.pin, config.disable_gpio),
            output_for(config.channels.b.pin, config.disable_gpio),
            indicator,
        )
    }

    /// Configure both outputs and drive them low so the hardware
    /// matches the initial OFF state shown on the panel. A channel
    /// that fails is logged and stays OFF, the other is still set up.
    pub fn initialise(&mut self) {
        for channel in Channel::iter() {
            let result = self
                .relay_mut(channel)
                .output
                .configure()
                .and_then(|()| self.set_channel_state(channel, RelayState::Off));
            if let Err(err) = result {
                warn!(%err, %channel, "failed to initialise relay");
            }
        }
    }

    /// The single transition entry point. The output is driven first,
    /// if that fails the stored state and indicator are left alone.
    /// Setting the current state again re-drives the output.
    ///
    /// * `channel`: relay to change.
    /// * `target`: state to apply.
    pub fn set_channel_state(
        &mut self,
        channel: Channel,
        target: RelayState,
    ) -> Result<(), OutputError> {
        let relay = self.relay_mut(channel);
        relay.output.set_level(target.level())?;
        relay.state = target;
        debug!(%channel, pin = relay.output.pin_id(), state = %target, "relay set");

        match target {
            RelayState::On => self.indicator.show_energized(channel),
            RelayState::Off => self.indicator.show_deenergized(channel),
        }
        Ok(())
    }

    pub fn activate(&mut self, channel: Channel) -> Result<(), OutputError> {
        self.set_channel_state(channel, RelayState::On)
    }

    pub fn deactivate(&mut self, channel: Channel) -> Result<(), OutputError> {
        self.set_channel_state(channel, RelayState::Off)
    }

    pub fn state(&self, channel: Channel) -> RelayState {
        self.relay(channel).state
    }

    pub fn pin_id(&self, channel: Channel) -> u8 {
        self.relay(channel).output.pin_id()
    }

    /// Redraw the indicator of every channel from the stored state.
    pub fn refresh_indicators(&mut self) {
        for channel in Channel::iter() {
            match self.state(channel) {
                RelayState::On => self.indicator.show_energized(channel),
                RelayState::Off => self.indicator.show_deenergized(channel),
            }
        }
    }

    /// Switch both relays off on the way out. Failures are logged,
    /// the remaining channel is still released.
    pub fn release(&mut self) {
        for channel in Channel::iter() {
            if let Err(err) = self.deactivate(channel) {
                warn!(%err, %channel, "failed to release relay");
            }
        }
    }

    fn relay(&self, channel: Channel) -> &RelayChannel {
        match channel {
            Channel::A => &self.a,
            Channel::B => &self.b,
        }
    }

    fn relay_mut(&mut self, channel: Channel) -> &mut RelayChannel {
        match channel {
            Channel::A => &mut self.a,
            Channel::B => &mut self.b,
        }
    }
}
