use crate::components::relay_board::actuating::relay_controller::Channel;
use std::io::{self, Write};
use tracing::warn;

/// Visual state of a relay on the control panel. Each channel needs
/// exactly two presentations, energised and de-energised.
pub trait Indicator {
    fn show_energized(&mut self, channel: Channel);
    fn show_deenergized(&mut self, channel: Channel);
}

/// Text indicator printing one status line per change.
pub struct ConsoleIndicator<W: Write> {
    out: W,
}

impl ConsoleIndicator<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleIndicator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn show(&mut self, channel: Channel, label: &str) {
        let written = writeln!(self.out, "relay {channel}: [{label}]").and_then(|()| self.out.flush());
        if let Err(err) = written {
            warn!(%err, %channel, "failed to update relay indicator");
        }
    }
}

impl<W: Write> Indicator for ConsoleIndicator<W> {
    fn show_energized(&mut self, channel: Channel) {
        self.show(channel, "ON ");
    }

    fn show_deenergized(&mut self, channel: Channel) {
        self.show(channel, "OFF");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_indicator_lines() {
        let mut indicator = ConsoleIndicator::new(Vec::new());

        indicator.show_energized(Channel::A);
        indicator.show_deenergized(Channel::B);

        let printed = String::from_utf8(indicator.into_inner()).unwrap();
        assert_eq!(printed, "relay A: [ON ]\nrelay B: [OFF]\n");
    }
}
