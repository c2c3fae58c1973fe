//! Client Worker Task
//!
//! A single tokio task executes connection jobs strictly in submission
//! order, so a connect queued before a send always finishes first.
//!
//! ```text
//! Session / Encoder / Keep-alive
//!      │  submit(Job)            (unbounded, never blocks the caller)
//!      ▼
//! Job Queue ──> Worker Task ──> ConnectionManager
//!                  │
//!                  └─> SendPermit dropped after the write completes
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::connection::ConnectionManager;
use super::throttle::SendPermit;
use super::validation::Endpoint;
use crate::protocol::ControlMessage;

/// Work item for the client worker
#[derive(Debug)]
pub enum Job {
    /// Open (or replace) the connection
    Connect(Endpoint),
    /// Write one control line
    Send {
        /// Line to write
        message: ControlMessage,
        /// Throttle permit released once the write finishes
        permit: Option<SendPermit>,
    },
    /// Close the connection
    Disconnect,
}

/// Counters reported when the worker exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Connect jobs executed
    pub connects: u64,
    /// Send jobs executed successfully
    pub sends: u64,
    /// Send jobs that failed
    pub send_failures: u64,
    /// Disconnect jobs executed
    pub disconnects: u64,
}

struct WorkerShared {
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    task: Mutex<Option<JoinHandle<WorkerStats>>>,
}

/// Handle to the client worker task
///
/// Cloning shares the same queue.
#[derive(Clone)]
pub struct ClientWorker {
    shared: Arc<WorkerShared>,
}

impl ClientWorker {
    /// Spawn the worker on the current runtime
    pub fn spawn(manager: ConnectionManager) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_worker(rx, manager));

        Self {
            shared: Arc::new(WorkerShared {
                tx: Mutex::new(Some(tx)),
                task: Mutex::new(Some(task)),
            }),
        }
    }

    /// Queue a job; false once the worker is shut down
    pub fn submit(&self, job: Job) -> bool {
        match self.shared.tx.lock().as_ref() {
            Some(tx) => tx.send(job).is_ok(),
            None => {
                debug!("Worker shut down, dropping {:?}", job);
                false
            }
        }
    }

    /// Queue a connect
    pub fn connect(&self, endpoint: Endpoint) -> bool {
        self.submit(Job::Connect(endpoint))
    }

    /// Queue a send holding `permit` until it completes
    pub fn send(&self, message: ControlMessage, permit: Option<SendPermit>) -> bool {
        self.submit(Job::Send { message, permit })
    }

    /// Queue a disconnect
    pub fn disconnect(&self) -> bool {
        self.submit(Job::Disconnect)
    }

    /// True until `shutdown` is called
    pub fn is_accepting(&self) -> bool {
        self.shared.tx.lock().is_some()
    }

    /// Close the queue and wait for queued jobs to drain
    ///
    /// Returns the final counters the first time it is called.
    pub async fn shutdown(&self) -> Option<WorkerStats> {
        drop(self.shared.tx.lock().take());
        let task = self.shared.task.lock().take()?;
        task.await.ok()
    }
}

impl std::fmt::Debug for ClientWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientWorker")
            .field("accepting", &self.is_accepting())
            .finish()
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<Job>, manager: ConnectionManager) -> WorkerStats {
    info!("Client worker started");
    let mut stats = WorkerStats::default();

    while let Some(job) = rx.recv().await {
        match job {
            Job::Connect(endpoint) => {
                stats.connects += 1;
                let _ = manager.connect(endpoint).await;
            }
            Job::Send { message, permit } => {
                match manager.send(message).await {
                    Ok(()) => stats.sends += 1,
                    Err(_) => stats.send_failures += 1,
                }
                drop(permit);
            }
            Job::Disconnect => {
                stats.disconnects += 1;
                manager.disconnect().await;
            }
        }
    }

    info!(
        "Client worker stopped: connects={}, sends={}, failures={}, disconnects={}",
        stats.connects, stats.sends, stats.send_failures, stats.disconnects
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::connection::ConnectionSettings;
    use crate::client::events::{ConnectionState, UiNotifier};
    use crate::client::throttle::SendThrottle;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_jobs_run_in_order_and_drain_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let endpoint = Endpoint::new(std::net::Ipv4Addr::LOCALHOST, port);

        let (notifier, _rx) = UiNotifier::channel();
        let manager = ConnectionManager::new(ConnectionSettings::default(), notifier);
        let worker = ClientWorker::spawn(manager.clone());

        assert!(worker.connect(endpoint));
        assert!(worker.send(ControlMessage::new(1, 2), None));
        assert!(worker.send(ControlMessage::new(3, 4), None));
        assert!(worker.disconnect());

        let stats = worker.shutdown().await.unwrap();
        assert_eq!(stats.connects, 1);
        assert_eq!(stats.sends, 2);
        assert_eq!(stats.disconnects, 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!worker.send(ControlMessage::STOP, None));

        let (socket, _) = listener.accept().await.unwrap();
        let mut lines = tokio::io::BufReader::new(socket).lines();
        let mut received = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            received.push(line);
        }
        assert_eq!(
            received,
            vec![
                "Angle: 0, Speed: 0",
                "Angle: 1, Speed: 2",
                "Angle: 3, Speed: 4",
                "Angle: 0, Speed: 0",
            ]
        );
    }

    #[tokio::test]
    async fn test_permit_released_after_job() {
        let (notifier, _rx) = UiNotifier::channel();
        let manager = ConnectionManager::new(ConnectionSettings::default(), notifier);
        let worker = ClientWorker::spawn(manager);
        let throttle = SendThrottle::default();

        let permit = throttle.try_acquire();
        assert!(throttle.is_in_flight());
        worker.send(ControlMessage::STOP, permit);

        let stats = worker.shutdown().await.unwrap();
        assert_eq!(stats.send_failures, 1);
        assert!(!throttle.is_in_flight());
        assert_eq!(worker.shutdown().await, None);
    }
}
