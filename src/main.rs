//! lamco-rc-receiver - vehicle-side receiver
//!
//! Entry point for the receiver binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lamco_rc_drive::config::Config;
use lamco_rc_drive::receiver::{build_actuator, ActuatorKind, Receiver};
use lamco_rc_drive::utils::{format_user_error, init_logging, log_banner};

/// Command-line arguments for lamco-rc-receiver
#[derive(Parser, Debug)]
#[command(name = "lamco-rc-receiver")]
#[command(version, about = "Remote-control vehicle receiver", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/lamco-rc/config.toml")]
    pub config: String,

    /// Listen address
    #[arg(short, long, env = "RC_LISTEN_ADDR")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short, long, env = "RC_PORT")]
    pub port: Option<u16>,

    /// Control device path
    #[arg(short, long, env = "RC_DEVICE")]
    pub device: Option<PathBuf>,

    /// Log commands instead of driving the device
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact), overrides [logging] format
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stdout), overrides [logging] log_file
    #[arg(long)]
    pub log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration first: its [logging] section sets up the subscriber
    let (config, load_error) = Config::load_or_default(&args.config);

    let _log_guard = init_logging(&config.logging.log_options(
        args.verbose,
        args.log_format.clone(),
        args.log_file.clone(),
    ))?;

    log_banner("lamco-rc-receiver");

    if let Some(e) = load_error {
        warn!("Failed to load config {}: {:#}, using defaults", args.config, e);
    }

    let mut config =
        config.with_receiver_overrides(args.listen.clone(), args.port, args.device.clone());
    if args.dry_run {
        config.receiver.actuator = ActuatorKind::Log;
    }

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    if let Err(e) = run(config).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    info!("Receiver shut down");
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let addr = config.listen_addr()?;
    let receiver = Receiver::bind(addr, config.receiver.max_line_length)
        .await
        .context(format!("Failed to bind {}", addr))?;

    let mut actuator = build_actuator(config.receiver.actuator, &config.receiver.device_path);
    info!(
        "Actuator: {:?} ({})",
        config.receiver.actuator,
        config.receiver.device_path.display()
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
        }
        signal_token.cancel();
    });

    // Display state: last applied command
    let mut applied = receiver.subscribe();
    let display_token = shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = display_token.cancelled() => break,
                changed = applied.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(command) = *applied.borrow_and_update() {
                        debug!("Display: {}", command);
                    }
                }
            }
        }
    });

    let report = receiver.run(actuator.as_mut(), shutdown).await;
    info!(
        "Served {} controllers: {} commands applied, {} rejected by actuator, {} malformed lines",
        report.listener.clients,
        report.dispatch.applied,
        report.dispatch.failed,
        report.listener.malformed
    );
    Ok(())
}
