//! lamco-rc-controller - headless joystick controller
//!
//! Drives a [`ControllerSession`] from a line-oriented script on stdin (or a
//! file), standing in for the touch UI:
//!
//! ```text
//! connect 192.168.4.1 8888
//! wait 200
//! down 300 300
//! move 400 200
//! wait 500
//! up
//! wait 300
//! disconnect
//! quit
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lamco_rc_drive::client::{parse_endpoint, ControllerSession, UiEvent, UiNotifier};
use lamco_rc_drive::config::Config;
use lamco_rc_drive::input::{JoystickSampler, PointerEvent};
use lamco_rc_drive::utils::{format_user_error, init_logging, log_banner};

/// Command-line arguments for lamco-rc-controller
#[derive(Parser, Debug)]
#[command(name = "lamco-rc-controller")]
#[command(version, about = "Remote-control joystick controller", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/lamco-rc/config.toml")]
    pub config: String,

    /// Receiver address to connect to at startup
    #[arg(long, env = "RC_HOST")]
    pub host: Option<String>,

    /// Receiver port
    #[arg(short, long, env = "RC_PORT")]
    pub port: Option<u16>,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    pub script: Option<PathBuf>,

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

/// One script line
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Connect { ip: String, port: String },
    Disconnect,
    Pointer(PointerEvent),
    Wait(Duration),
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, String> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| "empty command".to_string())?;
        let args: Vec<&str> = words.collect();

        let coord = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| format!("invalid coordinate: {}", s))
        };

        match (verb, args.as_slice()) {
            ("connect", [ip, port]) => Ok(Command::Connect {
                ip: ip.to_string(),
                port: port.to_string(),
            }),
            ("disconnect", []) => Ok(Command::Disconnect),
            ("down", [x, y]) => Ok(Command::Pointer(PointerEvent::Down {
                x: coord(x)?,
                y: coord(y)?,
            })),
            ("move", [x, y]) => Ok(Command::Pointer(PointerEvent::Move {
                x: coord(x)?,
                y: coord(y)?,
            })),
            ("up", []) => Ok(Command::Pointer(PointerEvent::Up)),
            ("wait", [ms]) => ms
                .parse::<u64>()
                .map(|ms| Command::Wait(Duration::from_millis(ms)))
                .map_err(|_| format!("invalid wait: {}", ms)),
            ("quit", []) => Ok(Command::Quit),
            _ => Err(format!("unknown command: {}", line)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, load_error) = Config::load_or_default(&args.config);

    let _log_guard = init_logging(&config.logging.log_options(
        args.verbose,
        args.log_format.clone(),
        args.log_file.clone(),
    ))?;

    log_banner("lamco-rc-controller");

    if let Some(e) = load_error {
        warn!("Failed to load config {}: {:#}, using defaults", args.config, e);
    }

    let config = config.with_controller_overrides(args.host.clone(), args.port);
    debug!("Config: {:?}", config);

    if let Err(e) = run(config, args.script).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }
    Ok(())
}

async fn run(config: Config, script: Option<PathBuf>) -> Result<()> {
    let geometry = config
        .joystick_geometry()
        .context("Invalid joystick view size in config")?;

    let (notifier, ui_rx) = UiNotifier::channel();
    let ui_task = tokio::spawn(render_events(ui_rx));

    let session = Arc::new(ControllerSession::new(config.session_settings(), notifier));

    let mut sampler = JoystickSampler::new(geometry)?;
    let sink = Arc::clone(&session);
    sampler.set_listener(move |sample| sink.handle_sample(sample));

    if let Some(host) = &config.controller.host {
        let _ = session.toggle_connection(host, &config.controller.port.to_string());
    }

    let result = match script {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .context(format!("Failed to open script {}", path.display()))?;
            run_script(BufReader::new(file), &session, &mut sampler).await
        }
        None => run_script(BufReader::new(tokio::io::stdin()), &session, &mut sampler).await,
    };

    session.shutdown().await;
    drop(sampler);
    drop(session);

    if tokio::time::timeout(Duration::from_millis(500), ui_task)
        .await
        .is_err()
    {
        debug!("UI task still draining at exit");
    }

    result
}

async fn run_script<R>(
    reader: R,
    session: &ControllerSession,
    sampler: &mut JoystickSampler,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read command")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        };
        let Some(line) = line else { break };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        match command {
            Command::Connect { ip, port } => match parse_endpoint(&ip, &port) {
                Ok(endpoint) => session.connect(endpoint),
                Err(e) => println!("{}", e),
            },
            Command::Disconnect => session.disconnect(),
            Command::Pointer(event) => {
                if let Err(e) = sampler.handle_event(event) {
                    warn!("Ignoring pointer event: {}", e);
                }
            }
            Command::Wait(duration) => tokio::time::sleep(duration).await,
            Command::Quit => break,
        }
    }

    Ok(())
}

/// Console stand-in for the UI thread
async fn render_events(mut rx: mpsc::UnboundedReceiver<UiEvent>) {
    let mut last_direction = None;

    while let Some(event) = rx.recv().await {
        match event {
            UiEvent::Sample(sample) => {
                if last_direction != Some(sample.direction) {
                    last_direction = Some(sample.direction);
                    println!("{}", sample.direction.label());
                }
                debug!(
                    "Speed: {:.0}%  Angle: {:.0}°",
                    sample.speed_ratio * 100.0,
                    sample.angle_degrees
                );
            }
            UiEvent::ConnectionState(state) => info!("Connection: {}", state),
            UiEvent::Status(message) => println!("{}", message),
            UiEvent::ControlEnabled(enabled) => debug!("Connect control enabled: {}", enabled),
        }
    }
}
