//! Relay panel binary
use clap::Parser;
use relay_link::{
    components::prelude::*,
    devices::{
        hardware::serial_link::SerialLink,
        software::indicator::ConsoleIndicator,
    },
    settings::RelayPanelConfig,
};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Arguments required for starting the program from the command line.
#[derive(Parser, Debug)]
#[command(about = "Two channel relay panel with LLAP serial control", version)]
struct Args {
    /// Path to the config file for the relay panel.
    #[arg(short, long)]
    filepath: String,
    /// Extra debug output.
    #[arg(short, long)]
    debug: bool,
    /// Write a default config to `filepath` if none exists, then exit.
    #[arg(long)]
    init: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), PanelError> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Keep logs off stdout, the relay status lines are printed there.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if args.init {
        if Path::new(&args.filepath).exists() {
            tracing::warn!("{} already exists, leaving it alone", args.filepath);
        } else {
            RelayPanelConfig::default().to_file(&args.filepath)?;
            tracing::info!("wrote default config to {}", args.filepath);
        }
        return Ok(());
    }

    let config = RelayPanelConfig::from_file(&args.filepath)?;
    tracing::debug!(?config, "config loaded");

    let (lifecycle, consumer) =
        LifecycleManager::start(SerialLink::open(&config.link), config.idle_poll());

    let mut controller = RelayController::from_config(&config, Box::new(ConsoleIndicator::stdout()));
    controller.initialise();
    let dispatcher = CommandDispatcher::new(consumer, &config);
    let mut panel = RelayPanel::new(controller, dispatcher, config.dispatch_interval());

    panel
        .run(spawn_console_input(), tokio::signal::ctrl_c())
        .await;

    panel.controller_mut().release();
    lifecycle.shutdown();
    Ok(())
}
