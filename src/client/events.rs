//! Client-side notifications
//!
//! Everything the UI needs to observe flows through a single unbounded
//! channel of [`UiEvent`]s and is consumed in order on the UI context.

use std::fmt;

use tokio::sync::mpsc;
use tracing::trace;

use crate::input::ControlSample;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No socket
    #[default]
    Disconnected,
    /// Connect in progress
    Connecting,
    /// Socket open and writable
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("DISCONNECTED"),
            ConnectionState::Connecting => f.write_str("CONNECTING"),
            ConnectionState::Connected => f.write_str("CONNECTED"),
        }
    }
}

/// UI notification
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Latest joystick reading (direction label, speed, angle)
    Sample(ControlSample),
    /// Connection state changed
    ConnectionState(ConnectionState),
    /// Short status message for the user
    Status(String),
    /// Connect/disconnect control enabled or disabled
    ControlEnabled(bool),
}

/// Sending half of the UI notification channel
///
/// Cheap to clone. A closed UI side is not an error for the producers.
#[derive(Debug, Clone)]
pub struct UiNotifier {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl UiNotifier {
    /// Create a notifier and the receiver the UI drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish an event
    pub fn publish(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            trace!("UI channel closed, dropping notification");
        }
    }

    /// Publish a status message
    pub fn status(&self, message: impl Into<String>) {
        self.publish(UiEvent::Status(message.into()));
    }

    /// Publish a connection state change
    pub fn state(&self, state: ConnectionState) {
        self.publish(UiEvent::ConnectionState(state));
    }

    /// Enable or disable the connect/disconnect control
    pub fn control_enabled(&self, enabled: bool) {
        self.publish(UiEvent::ControlEnabled(enabled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (notifier, mut rx) = UiNotifier::channel();
        notifier.state(ConnectionState::Connecting);
        notifier.status("Connecting...");
        notifier.control_enabled(false);

        assert_eq!(rx.recv().await, Some(UiEvent::ConnectionState(ConnectionState::Connecting)));
        assert_eq!(rx.recv().await, Some(UiEvent::Status("Connecting...".into())));
        assert_eq!(rx.recv().await, Some(UiEvent::ControlEnabled(false)));
    }

    #[test]
    fn test_publish_after_receiver_dropped() {
        let (notifier, rx) = UiNotifier::channel();
        drop(rx);
        notifier.status("ignored");
    }
}
