//! Actuator dispatcher
//!
//! Parsed commands from client tasks are funneled through one unbounded
//! queue and applied on the receiver's main task, in arrival order. The last
//! applied command is published on a watch channel for display.

use std::fmt;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::actuator::{Actuator, ActuatorError};
use crate::protocol::ControlMessage;

/// Policy-applied command ready for the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorCommand {
    /// Effective angle (0 when stopped)
    pub angle: i32,
    /// Speed in percent
    pub speed: i32,
}

impl From<ControlMessage> for ActuatorCommand {
    fn from(message: ControlMessage) -> Self {
        let message = message.with_policy();
        Self {
            angle: message.angle,
            speed: message.speed,
        }
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Angle: {}, Speed: {}", self.angle, self.speed)
    }
}

/// Dispatcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Commands applied successfully
    pub applied: u64,
    /// Commands the actuator rejected
    pub failed: u64,
}

/// Producer side, held by client tasks
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<ActuatorCommand>,
}

impl DispatchHandle {
    /// Queue a command; false once the dispatcher is gone
    pub fn dispatch(&self, command: ActuatorCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Consumer side, run on the main task
#[derive(Debug)]
pub struct Dispatcher {
    rx: mpsc::UnboundedReceiver<ActuatorCommand>,
    applied_tx: watch::Sender<Option<ActuatorCommand>>,
}

impl Dispatcher {
    /// Create a dispatcher and its producer handle
    pub fn channel() -> (DispatchHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (applied_tx, _) = watch::channel(None);
        (DispatchHandle { tx }, Self { rx, applied_tx })
    }

    /// Watch the last applied command
    pub fn subscribe(&self) -> watch::Receiver<Option<ActuatorCommand>> {
        self.applied_tx.subscribe()
    }

    /// Apply commands until every producer is gone or `shutdown` fires
    pub async fn run<A>(mut self, actuator: &mut A, shutdown: CancellationToken) -> DispatchStats
    where
        A: Actuator + ?Sized,
    {
        info!("Actuator dispatcher started");
        let mut stats = DispatchStats::default();

        loop {
            let command = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                command = self.rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };
            self.apply(actuator, command, &mut stats);
        }

        info!(
            "Actuator dispatcher stopped: applied={}, failed={}",
            stats.applied, stats.failed
        );
        stats
    }

    fn apply<A>(&self, actuator: &mut A, command: ActuatorCommand, stats: &mut DispatchStats)
    where
        A: Actuator + ?Sized,
    {
        match actuator.control(command.angle, command.speed) {
            Ok(()) => stats.applied += 1,
            Err(ActuatorError::NotOpen) => {
                stats.failed += 1;
                debug!("No device open, ignoring {}", command);
            }
            Err(e) => {
                stats.failed += 1;
                warn!("Actuator rejected {}: {}", command, e);
            }
        }
        // Display follows what was received, even when the device refused it
        self.applied_tx.send_replace(Some(command));
    }
}
