//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - Environment variables (through the binaries' CLI)
//! - CLI arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod types;

pub use types::{ControllerConfig, JoystickConfig, LoggingConfig, ReceiverConfig};

use crate::client::{validate_ip, ConnectionSettings, SessionSettings};
use crate::input::JoystickGeometry;

/// Shortest line length the receiver may be configured with
const MIN_LINE_LENGTH: usize = 32;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Receiver configuration
    #[serde(default)]
    pub receiver: ReceiverConfig,
    /// Controller configuration
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults
    ///
    /// The load error is handed back instead of logged, since logging is
    /// configured from the result.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<anyhow::Error>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default_config(), Some(e)),
        }
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            receiver: ReceiverConfig::default(),
            controller: ControllerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Receiver
        self.receiver
            .listen_addr
            .parse::<SocketAddr>()
            .context("Invalid listen address")?;

        if self.receiver.max_line_length < MIN_LINE_LENGTH {
            anyhow::bail!(
                "max_line_length ({}) must be at least {}",
                self.receiver.max_line_length,
                MIN_LINE_LENGTH
            );
        }

        // Controller
        if let Some(host) = &self.controller.host {
            validate_ip(host).context(format!("Invalid controller host: {}", host))?;
        }
        if self.controller.port == 0 {
            anyhow::bail!("Controller port must be in 1..=65535");
        }

        for (name, value) in [
            ("send_interval_ms", self.controller.send_interval_ms),
            ("keepalive_interval_ms", self.controller.keepalive_interval_ms),
            ("connect_timeout_ms", self.controller.connect_timeout_ms),
            ("reconnect_wait_ms", self.controller.reconnect_wait_ms),
        ] {
            if value == 0 {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        self.joystick_geometry()
            .context("Invalid joystick view size")?;

        // Logging
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }
        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        Ok(())
    }

    /// Override receiver settings with CLI arguments
    pub fn with_receiver_overrides(
        mut self,
        listen: Option<String>,
        port: Option<u16>,
        device: Option<PathBuf>,
    ) -> Self {
        match (listen, port) {
            (Some(listen_addr), Some(port)) => {
                self.receiver.listen_addr = format!("{}:{}", listen_addr, port);
            }
            (Some(listen_addr), None) => {
                let port = self
                    .receiver
                    .listen_addr
                    .parse::<SocketAddr>()
                    .map(|a| a.port())
                    .unwrap_or(crate::protocol::DEFAULT_PORT);
                self.receiver.listen_addr = format!("{}:{}", listen_addr, port);
            }
            (None, Some(port)) => {
                // Just update port
                if let Ok(mut addr) = self.receiver.listen_addr.parse::<SocketAddr>() {
                    addr.set_port(port);
                    self.receiver.listen_addr = addr.to_string();
                }
            }
            (None, None) => {}
        }

        if let Some(device) = device {
            self.receiver.device_path = device;
        }

        self
    }

    /// Override controller settings with CLI arguments
    pub fn with_controller_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if host.is_some() {
            self.controller.host = host;
        }
        if let Some(port) = port {
            self.controller.port = port;
        }
        self
    }

    /// Receiver listen address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.receiver
            .listen_addr
            .parse()
            .context(format!("Invalid listen address: {}", self.receiver.listen_addr))
    }

    /// Controller session timing
    pub fn session_settings(&self) -> SessionSettings {
        let c = &self.controller;
        SessionSettings {
            send_interval: Duration::from_millis(c.send_interval_ms),
            keepalive_interval: Duration::from_millis(c.keepalive_interval_ms),
            connection: ConnectionSettings {
                connect_timeout: Duration::from_millis(c.connect_timeout_ms),
                reconnect_wait: Duration::from_millis(c.reconnect_wait_ms),
            },
        }
    }

    /// Joystick pad geometry for the configured view
    pub fn joystick_geometry(&self) -> crate::input::Result<JoystickGeometry> {
        let j = &self.controller.joystick;
        JoystickGeometry::for_view(j.view_width, j.view_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receiver::ActuatorKind;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.receiver.listen_addr, "0.0.0.0:8888");
        assert_eq!(config.receiver.actuator, ActuatorKind::Device);
        assert_eq!(config.controller.send_interval_ms, 50);
        assert_eq!(config.controller.connect_timeout_ms, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_address() {
        let mut config = Config::default_config();
        config.receiver.listen_addr = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_host() {
        let mut config = Config::default_config();
        config.controller.host = Some("256.1.1.1".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let mut config = Config::default_config();
        config.controller.keepalive_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_view() {
        let mut config = Config::default_config();
        config.controller.joystick.view_width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[receiver]\nlisten_addr = \"127.0.0.1:9000\"\nactuator = \"log\"\n\n[controller]\nhost = \"192.168.4.1\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.receiver.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.receiver.actuator, ActuatorKind::Log);
        assert_eq!(config.controller.host.as_deref(), Some("192.168.4.1"));
        assert_eq!(config.controller.port, 8888);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[receiver]\nlisten_addr = \"nope\"").unwrap();

        assert!(Config::load(file.path()).is_err());
        let (config, error) = Config::load_or_default(file.path());
        assert_eq!(config.receiver.listen_addr, "0.0.0.0:8888");
        assert!(error.is_some());
    }

    #[test]
    fn test_socket_timeout_key_sets_connect_timeout() {
        let config: Config = toml::from_str("[controller]\nsocket_timeout_ms = 1500").unwrap();
        assert_eq!(config.controller.connect_timeout_ms, 1500);
        assert_eq!(
            config.session_settings().connection.connect_timeout,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_logging_section_feeds_log_options() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[logging]\nlevel = \"debug\"\nformat = \"json\"\nlog_file = \"/tmp/rc.log\""
        )
        .unwrap();

        let (config, error) = Config::load_or_default(file.path());
        assert!(error.is_none());

        let options = config.logging.log_options(0, None, None);
        assert_eq!(options.level, "debug");
        assert_eq!(options.format, "json");
        assert_eq!(options.log_file.as_deref(), Some("/tmp/rc.log"));

        // Flags win over the file
        let options = config
            .logging
            .log_options(2, Some("compact".to_string()), Some("/var/log/rc.log".to_string()));
        assert_eq!(options.level, "trace");
        assert_eq!(options.format, "compact");
        assert_eq!(options.log_file.as_deref(), Some("/var/log/rc.log"));
    }

    #[test]
    fn test_receiver_overrides() {
        let config = Config::default_config().with_receiver_overrides(None, Some(9999), None);
        assert_eq!(config.receiver.listen_addr, "0.0.0.0:9999");

        let config = Config::default_config().with_receiver_overrides(
            Some("127.0.0.1".to_string()),
            None,
            Some(PathBuf::from("/dev/rc0")),
        );
        assert_eq!(config.receiver.listen_addr, "127.0.0.1:8888");
        assert_eq!(config.receiver.device_path, PathBuf::from("/dev/rc0"));
    }

    #[test]
    fn test_session_settings() {
        let settings = Config::default_config().session_settings();
        assert_eq!(settings.send_interval, Duration::from_millis(50));
        assert_eq!(settings.connection.reconnect_wait, Duration::from_millis(1000));
    }
}
