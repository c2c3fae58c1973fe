//! Rate-limited command encoder
//!
//! Rounds joystick samples into wire units and hands them to the client
//! worker, subject to the [`SendThrottle`] gates.

use std::sync::Arc;

use tracing::trace;

use super::throttle::{SendThrottle, ThrottleStats};
use super::worker::ClientWorker;
use crate::input::ControlSample;
use crate::protocol::ControlMessage;

/// Encoder shared by the session and the keep-alive driver
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    throttle: Arc<SendThrottle>,
    worker: ClientWorker,
}

impl CommandEncoder {
    /// Create an encoder feeding `worker`
    pub fn new(throttle: SendThrottle, worker: ClientWorker) -> Self {
        Self {
            throttle: Arc::new(throttle),
            worker,
        }
    }

    /// Request transmission of `(angle, speed)`
    ///
    /// Returns whether the request was queued. Dropped requests are not
    /// retried.
    pub fn submit(&self, angle: i32, speed: i32) -> bool {
        self.submit_message(ControlMessage::new(angle, speed))
    }

    /// Request transmission of an already-built message
    pub fn submit_message(&self, message: ControlMessage) -> bool {
        let Some(permit) = self.throttle.try_acquire() else {
            trace!("Throttled {}", message);
            return false;
        };
        self.worker.send(message, Some(permit))
    }

    /// Encode a joystick sample and request its transmission
    pub fn submit_sample(&self, sample: &ControlSample) -> bool {
        self.submit_message(ControlMessage::from_sample(sample))
    }

    /// Throttle counters
    pub fn stats(&self) -> ThrottleStats {
        self.throttle.stats()
    }

    /// Underlying worker
    pub fn worker(&self) -> &ClientWorker {
        &self.worker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::connection::{ConnectionManager, ConnectionSettings};
    use crate::client::events::UiNotifier;
    use crate::client::validation::Endpoint;
    use crate::input::Direction;
    use std::time::Duration;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_submit_sample_rounds_and_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (notifier, _rx) = UiNotifier::channel();
        let manager = ConnectionManager::new(ConnectionSettings::default(), notifier);
        manager
            .connect(Endpoint::new(std::net::Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();

        let worker = ClientWorker::spawn(manager);
        let encoder = CommandEncoder::new(SendThrottle::new(Duration::from_millis(50)), worker.clone());

        let sample = ControlSample {
            direction: Direction::UpLeft,
            speed_ratio: 0.306,
            angle_degrees: 44.5,
        };
        assert!(encoder.submit_sample(&sample));
        // Same window: dropped
        assert!(!encoder.submit(10, 10));
        worker.shutdown().await;

        let (socket, _) = listener.accept().await.unwrap();
        let mut lines = tokio::io::BufReader::new(socket).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 0, Speed: 0");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 45, Speed: 31");

        let stats = encoder.stats();
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.dropped_interval, 1);
    }
}
