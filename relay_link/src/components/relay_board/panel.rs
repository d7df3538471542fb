use crate::{
    components::relay_board::{
        actuating::relay_controller::{Channel, RelayController, RelayState},
        dispatcher::CommandDispatcher,
    },
    settings::ConfigError,
};
use std::{
    future::Future,
    io::{self, BufRead},
    str::FromStr,
    thread,
    time::Duration,
};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors that stop the panel from starting.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A manual control panel action, one per line of console input.
/// `a 1` / `a on` switch relay A on, `a 2` / `a off` switch it off,
/// likewise for `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Set(Channel, RelayState),
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised panel command {0:?}, expected `a|b on|off|1|2`, `status` or `quit`")]
pub struct UnknownCommand(String);

impl FromStr for PanelCommand {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let lowered = line.trim().to_ascii_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        let command = match words.as_slice() {
            ["status" | "s"] => Self::Status,
            ["quit" | "q" | "exit"] => Self::Quit,
            [channel, action] => {
                let channel = match *channel {
                    "a" => Channel::A,
                    "b" => Channel::B,
                    _ => return Err(UnknownCommand(line.to_owned())),
                };
                let target = match *action {
                    "1" | "on" => RelayState::On,
                    "2" | "off" => RelayState::Off,
                    _ => return Err(UnknownCommand(line.to_owned())),
                };
                Self::Set(channel, target)
            }
            _ => return Err(UnknownCommand(line.to_owned())),
        };
        Ok(command)
    }
}

/// Read console lines on a dedicated thread. Stdin blocks, so it
/// stays off the panel event loop; the thread is left detached and
/// ends with the process.
pub fn spawn_console_input() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name(String::from("panel-input"))
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(err) = spawned {
        warn!(%err, "console input unavailable, panel runs from serial commands only");
    }
    rx
}

/// The control panel: owns the relay controller and runs the manual
/// controls and the dispatcher timer on one cooperative loop.
pub struct RelayPanel {
    /// Unique id of the panel session, tags its log lines.
    uuid: Uuid,
    controller: RelayController,
    dispatcher: CommandDispatcher,
    dispatch_interval: Duration,
}

impl RelayPanel {
    /// * `controller`: relays, already initialised.
    /// * `dispatcher`: consumer of serial commands.
    /// * `dispatch_interval`: timer period of the dispatcher.
    pub fn new(
        controller: RelayController,
        dispatcher: CommandDispatcher,
        dispatch_interval: Duration,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            controller,
            dispatcher,
            dispatch_interval,
        }
    }

    #[cfg(test)]
    pub fn controller(&self) -> &RelayController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut RelayController {
        &mut self.controller
    }

    /// Run until a quit command or `shutdown` resolves. The dispatcher
    /// fires on every timer tick for as long as the loop runs; closed
    /// console input only disables the manual controls. Nothing in
    /// here blocks.
    ///
    /// * `input`: console lines.
    /// * `shutdown`: resolves when the process should stop, i.e. ctrl-c.
    pub async fn run<S: Future>(&mut self, mut input: UnboundedReceiver<String>, shutdown: S) {
        info!(panel = %self.uuid, "relay panel running");
        tokio::pin!(shutdown);
        let mut ticker = time::interval(self.dispatch_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut input_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.dispatcher.dispatch_pending(&mut self.controller);
                }
                line = input.recv(), if input_open => match line {
                    Some(line) => {
                        if self.handle_line(&line) == Some(PanelCommand::Quit) {
                            break;
                        }
                    }
                    None => {
                        debug!("console input closed, manual controls disabled");
                        input_open = false;
                    }
                },
                _ = &mut shutdown => {
                    info!(panel = %self.uuid, "shutdown requested");
                    break;
                }
            }
        }
        info!(panel = %self.uuid, "relay panel stopped");
    }

    /// Apply one line of manual input, returning the parsed command.
    pub fn handle_line(&mut self, line: &str) -> Option<PanelCommand> {
        if line.trim().is_empty() {
            return None;
        }
        let command = match line.parse::<PanelCommand>() {
            Ok(command) => command,
            Err(err) => {
                warn!(%err, "ignoring panel input");
                return None;
            }
        };
        match command {
            PanelCommand::Set(channel, target) => {
                if let Err(err) = self.controller.set_channel_state(channel, target) {
                    warn!(%err, %channel, "manual relay change failed");
                }
            }
            PanelCommand::Status => self.controller.refresh_indicators(),
            PanelCommand::Quit => {}
        }
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        messages::{control::llap::DecodedMessage, transfer::transfer_queue},
        settings::RelayPanelConfig,
        utils::doubles::{RecordedCall, Recorder},
    };
    use rstest::rstest;

    #[rstest]
    #[case("a 1", PanelCommand::Set(Channel::A, RelayState::On))]
    #[case("A on", PanelCommand::Set(Channel::A, RelayState::On))]
    #[case("a 2", PanelCommand::Set(Channel::A, RelayState::Off))]
    #[case(" b   off ", PanelCommand::Set(Channel::B, RelayState::Off))]
    #[case("B ON", PanelCommand::Set(Channel::B, RelayState::On))]
    #[case("status", PanelCommand::Status)]
    #[case("q", PanelCommand::Quit)]
    fn test_parse_panel_command(#[case] line: &str, #[case] expected: PanelCommand) {
        assert_eq!(line.parse::<PanelCommand>(), Ok(expected));
    }

    #[rstest]
    #[case("c on")]
    #[case("a 3")]
    #[case("a")]
    #[case("a on now")]
    fn test_reject_panel_command(#[case] line: &str) {
        assert!(line.parse::<PanelCommand>().is_err());
    }

    fn panel(recorder: &Recorder) -> (crate::messages::transfer::QueueProducer, RelayPanel) {
        let config = RelayPanelConfig::default();
        let (producer, consumer) = transfer_queue();
        let controller = RelayController::new(
            Box::new(recorder.pin(24)),
            Box::new(recorder.pin(25)),
            Box::new(recorder.indicator()),
        );
        let panel = RelayPanel::new(
            controller,
            CommandDispatcher::new(consumer, &config),
            Duration::from_millis(5),
        );
        (producer, panel)
    }

    #[test]
    fn test_manual_and_serial_paths_match() {
        let manual = Recorder::default();
        let (_producer, mut manual_panel) = panel(&manual);
        manual_panel.handle_line("a on");

        let serial = Recorder::default();
        let (producer, mut serial_panel) = panel(&serial);
        producer.push(DecodedMessage::new("AB", "D02HIGH"));
        serial_panel
            .dispatcher
            .dispatch_pending(&mut serial_panel.controller);

        assert_eq!(manual.calls(), serial.calls());
        assert_eq!(
            manual_panel.controller().state(Channel::A),
            serial_panel.controller().state(Channel::A)
        );
    }

    #[test]
    fn test_bad_input_is_ignored() {
        let recorder = Recorder::default();
        let (_producer, mut panel) = panel(&recorder);

        assert_eq!(panel.handle_line("flip everything"), None);
        assert_eq!(panel.handle_line("   "), None);
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_dispatches_on_timer() {
        let recorder = Recorder::default();
        let (producer, mut panel) = panel(&recorder);
        let (_input_tx, input_rx) = mpsc::unbounded_channel();

        producer.push(DecodedMessage::new("AB", "D03HIGH"));
        panel
            .run(input_rx, time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(panel.controller().state(Channel::B), RelayState::On);
    }

    #[tokio::test]
    async fn test_run_stops_on_quit() {
        let recorder = Recorder::default();
        let (_producer, mut panel) = panel(&recorder);
        let (input_tx, input_rx) = mpsc::unbounded_channel();

        input_tx.send(String::from("a 1")).unwrap();
        input_tx.send(String::from("quit")).unwrap();
        panel.run(input_rx, std::future::pending::<()>()).await;

        assert_eq!(panel.controller().state(Channel::A), RelayState::On);
        assert!(recorder.calls().contains(&RecordedCall::Energized(Channel::A)));
    }

    #[tokio::test]
    async fn test_closed_input_keeps_dispatching() {
        let recorder = Recorder::default();
        let (producer, mut panel) = panel(&recorder);
        let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();
        drop(input_tx);

        let feeder = async {
            time::sleep(Duration::from_millis(20)).await;
            producer.push(DecodedMessage::new("AB", "D02HIGH"));
            time::sleep(Duration::from_millis(30)).await;
        };
        panel.run(input_rx, feeder).await;

        assert_eq!(panel.controller().state(Channel::A), RelayState::On);
    }
}
