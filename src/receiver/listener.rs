//! Receiver Listener
//!
//! Accepts controller connections one at a time and turns their lines into
//! actuator commands.
//!
//! # Architecture
//!
//! ```text
//! TcpListener (0.0.0.0:8888)
//!      │ accept
//!      ▼
//! Client Task ── FramedRead<ControlCodec> ──┬── Control ──> policy ──> DispatchHandle
//!      │                                    └── Malformed ─> warn!, skip
//!      │ EOF / error
//!      ▼
//! back to accept
//! ```
//!
//! A second controller connecting while one is served waits in the listen
//! backlog until the first disconnects.

use std::io;
use std::net::SocketAddr;

use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::dispatcher::{ActuatorCommand, DispatchHandle};
use crate::protocol::{ControlCodec, InboundLine, MAX_LINE_LENGTH};

/// Per-client counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Lines accepted and dispatched
    pub commands: u64,
    /// Lines skipped as malformed
    pub malformed: u64,
}

/// Listener-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Clients served
    pub clients: u64,
    /// Commands dispatched across all clients
    pub commands: u64,
    /// Malformed lines across all clients
    pub malformed: u64,
}

/// Bound receiver socket
#[derive(Debug)]
pub struct ReceiverListener {
    listener: TcpListener,
    dispatch: DispatchHandle,
    max_line_length: usize,
}

impl ReceiverListener {
    /// Bind the listening socket
    pub async fn bind(addr: SocketAddr, dispatch: DispatchHandle) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Receiver listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            dispatch,
            max_line_length: MAX_LINE_LENGTH,
        })
    }

    /// Override the maximum accepted line length
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Actual bound address (useful with port 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the accept loop on a background task
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<ListenerStats> {
        tokio::spawn(self.run(shutdown))
    }

    /// Accept and serve clients until `shutdown` fires
    pub async fn run(self, shutdown: CancellationToken) -> ListenerStats {
        let mut stats = ListenerStats::default();

        loop {
            let (stream, peer) = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        // Transient (EMFILE, ECONNABORTED): keep listening
                        warn!("Accept failed: {}", e);
                        continue;
                    }
                },
            };

            info!("Controller connected: {}", peer);
            stats.clients += 1;

            let client = tokio::spawn(serve_client(
                stream,
                peer,
                self.dispatch.clone(),
                self.max_line_length,
                shutdown.clone(),
            ));

            match client.await {
                Ok(client_stats) => {
                    stats.commands += client_stats.commands;
                    stats.malformed += client_stats.malformed;
                    info!(
                        "Controller {} disconnected ({} commands, {} malformed)",
                        peer, client_stats.commands, client_stats.malformed
                    );
                }
                Err(e) => error!("Client task for {} failed: {}", peer, e),
            }
        }

        info!(
            "Receiver listener stopped: clients={}, commands={}, malformed={}",
            stats.clients, stats.commands, stats.malformed
        );
        stats
    }
}

/// Read lines from one controller until EOF, error or shutdown
pub async fn serve_client(
    stream: TcpStream,
    peer: SocketAddr,
    dispatch: DispatchHandle,
    max_line_length: usize,
    shutdown: CancellationToken,
) -> ClientStats {
    let mut stats = ClientStats::default();
    let mut lines = FramedRead::new(stream, ControlCodec::with_max_length(max_line_length));

    loop {
        let item = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            item = lines.next() => item,
        };

        match item {
            Some(Ok(InboundLine::Control(message))) => {
                let command = ActuatorCommand::from(message);
                debug!("{} -> {}", peer, command);
                stats.commands += 1;
                if !dispatch.dispatch(command) {
                    warn!("Dispatcher gone, dropping client {}", peer);
                    break;
                }
            }
            Some(Ok(InboundLine::Malformed { line, reason })) => {
                stats.malformed += 1;
                warn!("Skipping malformed line from {}: {:?} ({})", peer, line, reason);
            }
            Some(Err(e)) => {
                warn!("Read error from {}: {}", peer, e);
                break;
            }
            None => break,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receiver::dispatcher::Dispatcher;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_malformed_lines_do_not_close_client() {
        let (handle, dispatcher) = Dispatcher::channel();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            serve_client(stream, peer, handle, MAX_LINE_LENGTH, CancellationToken::new()).await
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"Angle: 45, Speed: 30\ngarbage\nAngle: x, Speed: 30\nAngle: 173, Speed: 0\n")
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        let stats = server.await.unwrap();
        assert_eq!(stats, ClientStats { commands: 2, malformed: 2 });

        let applied = dispatcher.subscribe();
        let mut actuator = crate::receiver::actuator::LogActuator::default();
        let run = dispatcher.run(&mut actuator, CancellationToken::new()).await;
        assert_eq!(run.applied, 2);
        assert_eq!(actuator.last(), Some((0, 0)));
        assert_eq!(*applied.borrow(), Some(ActuatorCommand { angle: 0, speed: 0 }));
    }

    #[tokio::test]
    async fn test_accept_loop_serves_clients_sequentially() {
        let (handle, dispatcher) = Dispatcher::channel();
        let listener = ReceiverListener::bind("127.0.0.1:0".parse().unwrap(), handle)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let task = listener.spawn(shutdown.clone());

        for angle in [10, 20] {
            let mut client = TcpStream::connect(addr).await.unwrap();
            client
                .write_all(format!("Angle: {angle}, Speed: 50\n").as_bytes())
                .await
                .unwrap();
            client.shutdown().await.unwrap();
            drop(client);
        }

        let mut applied = dispatcher.subscribe();
        let dispatcher_shutdown = shutdown.clone();
        let dispatch_task = tokio::spawn(async move {
            let mut actuator = crate::receiver::actuator::LogActuator::default();
            dispatcher.run(&mut actuator, dispatcher_shutdown).await;
            actuator.commands()
        });

        applied
            .wait_for(|c| *c == Some(ActuatorCommand { angle: 20, speed: 50 }))
            .await
            .unwrap();

        shutdown.cancel();
        let stats = task.await.unwrap();
        assert_eq!(stats.clients, 2);
        assert_eq!(stats.commands, 2);
        assert_eq!(dispatch_task.await.unwrap(), 2);
    }
}
