//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::receiver::ActuatorKind;
use crate::utils::logging::{level_for, LogOptions};

/// Receiver (vehicle side) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Address to listen on (e.g., "0.0.0.0:8888")
    pub listen_addr: String,

    /// Actuator backend ("device", "log")
    pub actuator: ActuatorKind,

    /// Control device path
    pub device_path: PathBuf,

    /// Longest accepted line in bytes
    pub max_line_length: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8888".to_string(),
            actuator: ActuatorKind::Device,
            device_path: PathBuf::from(crate::receiver::DEFAULT_DEVICE_PATH),
            max_line_length: crate::protocol::MAX_LINE_LENGTH,
        }
    }
}

/// Controller (joystick side) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Receiver IPv4 address to connect to at startup (None = wait for a
    /// `connect` command)
    pub host: Option<String>,

    /// Receiver port
    pub port: u16,

    /// Minimum spacing between transmitted updates in milliseconds
    pub send_interval_ms: u64,

    /// Idle stop-command cadence in milliseconds
    pub keepalive_interval_ms: u64,

    /// TCP connect timeout in milliseconds
    ///
    /// The controller never reads from the link, so there is no read
    /// timeout; `socket_timeout_ms` is accepted as an older spelling.
    #[serde(alias = "socket_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Wait for a lazy reconnect inside a send, in milliseconds
    pub reconnect_wait_ms: u64,

    /// Joystick pad geometry
    pub joystick: JoystickConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: crate::protocol::DEFAULT_PORT,
            send_interval_ms: 50,
            keepalive_interval_ms: 50,
            connect_timeout_ms: 3000,
            reconnect_wait_ms: 1000,
            joystick: JoystickConfig::default(),
        }
    }
}

/// Joystick view size; the pad is centered with radius min(w, h) / 3
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// View width in pixels
    pub view_width: f64,

    /// View height in pixels
    pub view_height: f64,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            view_width: 600.0,
            view_height: 600.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    pub format: String,

    /// Log file (None = console only)
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            log_file: None,
        }
    }
}

impl LoggingConfig {
    /// Logging options with CLI flags layered over this section
    ///
    /// A non-zero `-v` count replaces `level`.
    pub fn log_options(
        &self,
        verbose: u8,
        format: Option<String>,
        log_file: Option<String>,
    ) -> LogOptions {
        LogOptions {
            level: if verbose > 0 {
                level_for(verbose).to_string()
            } else {
                self.level.clone()
            },
            format: format.unwrap_or_else(|| self.format.clone()),
            log_file: log_file.or_else(|| self.log_file.as_ref().map(|p| p.display().to_string())),
        }
    }
}
