//! Actuator backends
//!
//! The vehicle is driven through a character device: one `ioctl` per
//! command with the speed as request code and the angle as argument. Hosts
//! without the device can use [`LogActuator`], which only traces commands.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default control device
pub const DEFAULT_DEVICE_PATH: &str = "/dev/mydevice";

/// Result type for actuator operations
pub type Result<T> = std::result::Result<T, ActuatorError>;

/// Actuator errors
#[derive(Error, Debug)]
pub enum ActuatorError {
    /// Device could not be opened
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Device path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Device control call failed
    #[error("Control (angle={angle}, speed={speed}) failed: {source}")]
    Control {
        /// Requested angle
        angle: i32,
        /// Requested speed
        speed: i32,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Control requested with no device open
    #[error("Device not open")]
    NotOpen,
}

/// Which backend the receiver drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    /// Character device via ioctl
    #[default]
    Device,
    /// Trace-only
    Log,
}

/// Vehicle control interface
///
/// `control` is synchronous and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait Actuator: Send {
    /// Acquire the device
    fn open(&mut self) -> Result<()>;

    /// Release the device
    fn close(&mut self) -> Result<()>;

    /// Apply one command
    fn control(&mut self, angle: i32, speed: i32) -> Result<()>;
}

/// Build the configured backend
pub fn build_actuator(kind: ActuatorKind, device_path: &Path) -> Box<dyn Actuator> {
    match kind {
        ActuatorKind::Device => Box::new(DeviceActuator::new(device_path)),
        ActuatorKind::Log => Box::new(LogActuator::default()),
    }
}

/// ioctl-driven character device
#[derive(Debug)]
pub struct DeviceActuator {
    path: PathBuf,
    file: Option<File>,
}

impl DeviceActuator {
    /// Backend for the device at `path` (not opened yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    /// Device path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True while the device is open
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl Actuator for DeviceActuator {
    fn open(&mut self) -> Result<()> {
        if self.file.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NDELAY | libc::O_NOCTTY)
            .open(&self.path)
            .map_err(|source| ActuatorError::Open {
                path: self.path.clone(),
                source,
            })?;

        info!("Opened control device {}", self.path.display());
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.file.take().is_some() {
            info!("Closed control device {}", self.path.display());
        }
        Ok(())
    }

    fn control(&mut self, angle: i32, speed: i32) -> Result<()> {
        let Some(file) = self.file.as_ref() else {
            return Err(ActuatorError::NotOpen);
        };

        // SAFETY: the fd stays valid while `file` is borrowed; the driver
        // reads the request code and one int argument only.
        #[allow(unsafe_code)]
        let ret = unsafe { libc::ioctl(file.as_raw_fd(), speed as _, angle as libc::c_int) };

        if ret < 0 {
            return Err(ActuatorError::Control {
                angle,
                speed,
                source: std::io::Error::last_os_error(),
            });
        }
        debug!("ioctl(speed={}, angle={}) -> {}", speed, angle, ret);
        Ok(())
    }
}

impl Drop for DeviceActuator {
    fn drop(&mut self) {
        if self.file.is_some() {
            warn!("Control device {} dropped while open", self.path.display());
        }
    }
}

/// Trace-only backend
#[derive(Debug, Default)]
pub struct LogActuator {
    open: bool,
    commands: u64,
    last: Option<(i32, i32)>,
}

impl LogActuator {
    /// Commands applied so far
    pub fn commands(&self) -> u64 {
        self.commands
    }

    /// Last applied (angle, speed)
    pub fn last(&self) -> Option<(i32, i32)> {
        self.last
    }
}

impl Actuator for LogActuator {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        info!("Log actuator ready (no device)");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        info!("Log actuator closed after {} commands", self.commands);
        Ok(())
    }

    fn control(&mut self, angle: i32, speed: i32) -> Result<()> {
        self.commands += 1;
        self.last = Some((angle, speed));
        info!("control(angle={}, speed={})", angle, speed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_open_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut actuator = DeviceActuator::new(dir.path().join("no-such-device"));

        assert!(matches!(actuator.open(), Err(ActuatorError::Open { .. })));
        assert!(!actuator.is_open());
        assert!(matches!(actuator.control(10, 10), Err(ActuatorError::NotOpen)));
        assert!(actuator.close().is_ok());
    }

    #[test]
    fn test_device_ioctl_on_regular_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut actuator = DeviceActuator::new(file.path());

        actuator.open().unwrap();
        assert!(actuator.is_open());
        assert!(matches!(
            actuator.control(90, 40),
            Err(ActuatorError::Control { angle: 90, speed: 40, .. })
        ));
        actuator.close().unwrap();
        assert!(!actuator.is_open());
    }

    #[test]
    fn test_log_actuator_records() {
        let mut actuator = LogActuator::default();
        actuator.open().unwrap();
        actuator.control(45, 30).unwrap();
        actuator.control(0, 0).unwrap();
        assert_eq!(actuator.commands(), 2);
        assert_eq!(actuator.last(), Some((0, 0)));
    }

    #[test]
    fn test_build_actuator_kinds() {
        let mut log = build_actuator(ActuatorKind::Log, Path::new(DEFAULT_DEVICE_PATH));
        assert!(log.control(1, 1).is_ok());

        let mut device = build_actuator(ActuatorKind::Device, Path::new("/nonexistent/rc"));
        assert!(matches!(device.control(1, 1), Err(ActuatorError::NotOpen)));
    }
}
