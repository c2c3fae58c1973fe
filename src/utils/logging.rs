//! Logging setup shared by both binaries

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resolved logging options
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Level for this crate's targets ("trace" .. "error")
    pub level: String,
    /// "json", "compact" or "pretty"
    pub format: String,
    /// Also write to this file
    pub log_file: Option<String>,
}

/// Level name for a `-v` count
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(level: &str) -> String {
    format!("lamco_rc_drive={level},lamco_rc={level},warn")
}

/// Install the global subscriber
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the file writer.
pub fn init_logging(options: &LogOptions) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive(&options.level)));

    // If log file is specified, write to both stdout and file
    if let Some(log_file_path) = &options.log_file {
        let file = std::fs::File::create(log_file_path)
            .context(format!("Failed to create log file: {}", log_file_path))?;
        let (writer, guard) = tracing_appender::non_blocking(file);

        match options.format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .try_init()?;
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .try_init()?;
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .try_init()?;
            }
        }
        tracing::info!("Logging to file: {}", log_file_path);
        Ok(Some(guard))
    } else {
        // Stdout only
        match options.format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json())
                    .try_init()?;
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact())
                    .try_init()?;
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .try_init()?;
            }
        }
        Ok(None)
    }
}

/// Startup banner with build metadata
pub fn log_banner(binary: &str) {
    tracing::info!("════════════════════════════════════════════════════════");
    tracing::info!("  {} v{}", binary, env!("CARGO_PKG_VERSION"));
    tracing::info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    tracing::info!("  Commit: {}", env!("GIT_HASH"));
    tracing::info!(
        "  Profile: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );
    tracing::info!("════════════════════════════════════════════════════════");
}
