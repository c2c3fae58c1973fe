//! Controller Session
//!
//! Glue between the joystick, the connection worker and the UI:
//!
//! ```text
//! ControlSample ──> handle_sample ──┬──> UiEvent::Sample
//!                                   ├──> direction NONE: KeepAliveDriver::start
//!                                   └──> otherwise:      KeepAliveDriver::stop + CommandEncoder
//!
//! (ip, port) text ──> toggle_connection ──> validate ──> ClientWorker (Connect / Disconnect)
//! ```

use std::time::Duration;

use tracing::{debug, info};

use super::connection::{ConnectionManager, ConnectionSettings};
use super::encoder::CommandEncoder;
use super::events::{ConnectionState, UiEvent, UiNotifier};
use super::keepalive::{KeepAliveDriver, DEFAULT_KEEPALIVE_INTERVAL};
use super::throttle::{SendThrottle, DEFAULT_SEND_INTERVAL};
use super::validation::{parse_endpoint, Endpoint, ValidationError};
use super::worker::ClientWorker;
use crate::input::ControlSample;

/// Timing for a controller session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Minimum spacing between transmitted updates
    pub send_interval: Duration,
    /// Stop-command cadence while idle
    pub keepalive_interval: Duration,
    /// Connect / reconnect timing
    pub connection: ConnectionSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            send_interval: DEFAULT_SEND_INTERVAL,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            connection: ConnectionSettings::default(),
        }
    }
}

/// What a toggle request queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Connect to the endpoint
    Connect(Endpoint),
    /// Close the current connection
    Disconnect,
}

/// Client-side session state
#[derive(Debug)]
pub struct ControllerSession {
    manager: ConnectionManager,
    worker: ClientWorker,
    encoder: CommandEncoder,
    keepalive: KeepAliveDriver,
    notifier: UiNotifier,
}

impl ControllerSession {
    /// Build the session and spawn its worker on the current runtime
    pub fn new(settings: SessionSettings, notifier: UiNotifier) -> Self {
        let manager = ConnectionManager::new(settings.connection, notifier.clone());
        let worker = ClientWorker::spawn(manager.clone());
        let encoder = CommandEncoder::new(SendThrottle::new(settings.send_interval), worker.clone());
        let keepalive =
            KeepAliveDriver::new(encoder.clone(), manager.subscribe(), settings.keepalive_interval);

        debug!("Controller session created: {:?}", settings);
        Self {
            manager,
            worker,
            encoder,
            keepalive,
            notifier,
        }
    }

    /// Route one joystick sample
    pub fn handle_sample(&self, sample: &ControlSample) {
        self.notifier.publish(UiEvent::Sample(*sample));

        if self.manager.state() != ConnectionState::Connected {
            return;
        }

        if sample.direction.is_none() {
            if self.keepalive.start() {
                debug!("Joystick released, keep-alive running");
            }
        } else {
            self.keepalive.stop();
            self.encoder.submit_sample(sample);
        }
    }

    /// Connect/disconnect control pressed
    ///
    /// Connected: queues a disconnect. Otherwise the fields are validated
    /// and a connect is queued; invalid input is reported through a status
    /// event and changes nothing.
    pub fn toggle_connection(&self, ip: &str, port: &str) -> Result<ToggleAction, ValidationError> {
        if self.manager.state() == ConnectionState::Connected {
            self.disconnect();
            return Ok(ToggleAction::Disconnect);
        }

        let endpoint = match parse_endpoint(ip, port) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                debug!("Rejected endpoint input ({:?}, {:?}): {}", ip, port, e);
                self.notifier.status(e.to_string());
                return Err(e);
            }
        };

        self.connect(endpoint);
        Ok(ToggleAction::Connect(endpoint))
    }

    /// Queue a connect to an already-validated endpoint
    pub fn connect(&self, endpoint: Endpoint) {
        self.notifier.control_enabled(false);
        if self.worker.connect(endpoint) {
            info!("Connecting to {}", endpoint);
            self.notifier.status("Connecting...");
        } else {
            self.notifier.control_enabled(true);
        }
    }

    /// Queue a disconnect
    pub fn disconnect(&self) {
        self.keepalive.stop();
        self.worker.disconnect();
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Connection manager
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Command encoder
    pub fn encoder(&self) -> &CommandEncoder {
        &self.encoder
    }

    /// True while the idle keep-alive loop runs
    pub fn keepalive_running(&self) -> bool {
        self.keepalive.is_running()
    }

    /// Stop background work and close the connection
    ///
    /// A job already executing on the worker finishes first.
    pub async fn shutdown(&self) {
        self.keepalive.stop();
        if let Some(stats) = self.worker.shutdown().await {
            debug!("Worker final stats: {:?}", stats);
        }
        self.manager.shutdown().await;
        info!("Controller session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Direction;

    #[tokio::test]
    async fn test_invalid_input_changes_nothing() {
        let (notifier, mut rx) = UiNotifier::channel();
        let session = ControllerSession::new(SessionSettings::default(), notifier);

        assert_eq!(
            session.toggle_connection("300.1.1.1", "8888"),
            Err(ValidationError::InvalidIp("300.1.1.1".into()))
        );
        assert_eq!(session.toggle_connection("", ""), Err(ValidationError::MissingField));
        assert!(matches!(
            session.toggle_connection("10.0.0.1", "70000"),
            Err(ValidationError::PortOutOfRange(70000))
        ));

        assert_eq!(rx.recv().await, Some(UiEvent::Status("IP format error".into())));
        assert_eq!(rx.recv().await, Some(UiEvent::Status("Please enter IP and port".into())));
        assert_eq!(rx.recv().await, Some(UiEvent::Status("port out of range".into())));
        assert_eq!(session.state(), ConnectionState::Disconnected);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_samples_published_while_disconnected() {
        let (notifier, mut rx) = UiNotifier::channel();
        let session = ControllerSession::new(SessionSettings::default(), notifier);

        let sample = ControlSample {
            direction: Direction::Up,
            speed_ratio: 0.5,
            angle_degrees: 0.0,
        };
        session.handle_sample(&sample);
        session.handle_sample(&ControlSample::RELEASED);

        assert_eq!(rx.recv().await, Some(UiEvent::Sample(sample)));
        assert_eq!(rx.recv().await, Some(UiEvent::Sample(ControlSample::RELEASED)));
        assert!(!session.keepalive_running());
        assert_eq!(session.encoder().stats().accepted, 0);

        session.shutdown().await;
    }
}
