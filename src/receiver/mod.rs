//! Vehicle Receiver
//!
//! Listens for one controller at a time and drives the actuator.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────┐
//! │  ReceiverListener      │ ← background task, accept loop
//! │   └─ serve_client      │ ← one client at a time
//! └────────────────────────┘
//!           │ ActuatorCommand (policy applied)
//!           ▼
//! ┌────────────────────────┐
//! │  Dispatcher            │ ← caller's task, arrival order
//! └────────────────────────┘
//!           │ control(angle, speed)
//!           ▼
//! ┌────────────────────────┐
//! │  Actuator              │ ← ioctl device or log-only
//! └────────────────────────┘
//! ```

pub mod actuator;
pub mod dispatcher;
pub mod listener;

use std::net::SocketAddr;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use actuator::{
    build_actuator, Actuator, ActuatorError, ActuatorKind, DeviceActuator, LogActuator,
    DEFAULT_DEVICE_PATH,
};
pub use dispatcher::{ActuatorCommand, DispatchHandle, DispatchStats, Dispatcher};
pub use listener::{serve_client, ClientStats, ListenerStats, ReceiverListener};

/// Summary returned when the receiver stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverReport {
    /// Accept loop counters
    pub listener: ListenerStats,
    /// Actuator counters
    pub dispatch: DispatchStats,
}

/// Receiver bound and ready to run
#[derive(Debug)]
pub struct Receiver {
    listener: ReceiverListener,
    dispatcher: Dispatcher,
}

impl Receiver {
    /// Bind the listening socket
    pub async fn bind(addr: SocketAddr, max_line_length: usize) -> std::io::Result<Self> {
        let (handle, dispatcher) = Dispatcher::channel();
        let listener = ReceiverListener::bind(addr, handle)
            .await?
            .with_max_line_length(max_line_length);
        Ok(Self {
            listener,
            dispatcher,
        })
    }

    /// Bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Watch the last applied command
    pub fn subscribe(&self) -> watch::Receiver<Option<ActuatorCommand>> {
        self.dispatcher.subscribe()
    }

    /// Open the actuator, serve until `shutdown`, then close it
    ///
    /// Device open and close failures are logged; the receiver keeps
    /// accepting connections either way.
    pub async fn run<A>(self, actuator: &mut A, shutdown: CancellationToken) -> ReceiverReport
    where
        A: Actuator + ?Sized,
    {
        if let Err(e) = actuator.open() {
            warn!("Actuator unavailable: {}", e);
        }

        let accept_task = self.listener.spawn(shutdown.clone());
        let dispatch = self.dispatcher.run(actuator, shutdown.clone()).await;

        // Dispatcher is done; stop accepting
        shutdown.cancel();
        let listener = match accept_task.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Accept loop task failed: {}", e);
                ListenerStats::default()
            }
        };

        if let Err(e) = actuator.close() {
            warn!("Actuator close failed: {}", e);
        }

        info!("Receiver stopped");
        ReceiverReport { listener, dispatch }
    }
}
