//! Client Connection Manager
//!
//! Owns the single TCP link to the receiver. Callers get operations
//! (connect, send, disconnect), never the socket.
//!
//! # Architecture
//!
//! ```text
//!  connect(endpoint) ─┐
//!  send(message) ─────┼──> link mutex ──> Link { conn, endpoint }
//!  disconnect() ──────┘        │
//!                              ├──> state watch  (Disconnected/Connecting/Connected)
//!                              ├──> ready Notify (wakes a send waiting on reconnect)
//!                              └──> UiNotifier   (status text, control enable)
//! ```
//!
//! All three operations take the same async mutex, so the link is never
//! observed half-open. A `send` that finds the link dead starts a reconnect
//! to the last endpoint on a separate task, releases the mutex and waits up
//! to `reconnect_wait` for the ready notification before writing. If the
//! reconnect fails the write fails too; there is no retry loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::SinkExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex, Notify};
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};

use super::error::{ConnectionError, Result};
use super::events::{ConnectionState, UiNotifier};
use super::validation::Endpoint;
use crate::protocol::{ControlCodec, ControlMessage};

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Default wait for a lazy reconnect inside `send`
pub const DEFAULT_RECONNECT_WAIT: Duration = Duration::from_millis(1000);

/// Bound on the best-effort stop line written while closing
const CLOSE_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Connection timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Upper bound for the TCP handshake
    ///
    /// This is the only socket timeout. The link is write-only, so no read
    /// timeout is set.
    pub connect_timeout: Duration,
    /// How long `send` waits for a reconnect it triggered
    pub reconnect_wait: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_wait: DEFAULT_RECONNECT_WAIT,
        }
    }
}

/// One open TCP stream to the receiver
struct Connection {
    writer: FramedWrite<TcpStream, ControlCodec>,
    peer: SocketAddr,
    read_closed: bool,
    write_closed: bool,
}

impl Connection {
    async fn open(endpoint: Endpoint, connect_timeout: Duration) -> Result<Self> {
        let addr = endpoint.socket_addr();
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ConnectionError::Timeout(connect_timeout))?
            .map_err(ConnectionError::Connect)?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY on {}: {}", addr, e);
        }
        let peer = stream.peer_addr().map_err(ConnectionError::Connect)?;

        Ok(Self {
            writer: FramedWrite::new(stream, ControlCodec::new()),
            peer,
            read_closed: false,
            write_closed: false,
        })
    }

    /// Socket still connected with both directions open
    fn is_live(&mut self) -> bool {
        if self.read_closed || self.write_closed {
            return false;
        }

        let stream = self.writer.get_ref();
        if stream.peer_addr().is_err() {
            return false;
        }

        // The receiver never writes; a readable socket means EOF or reset.
        let mut probe = [0u8; 64];
        match stream.try_read(&mut probe) {
            Ok(0) => {
                debug!("Peer {} closed its side", self.peer);
                self.read_closed = true;
                false
            }
            Ok(_) => true,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => true,
            Err(e) => {
                debug!("Read probe on {} failed: {}", self.peer, e);
                self.read_closed = true;
                false
            }
        }
    }

    async fn write(&mut self, message: ControlMessage) -> Result<()> {
        match self.writer.send(message).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.write_closed = true;
                Err(ConnectionError::Write(e))
            }
        }
    }

    /// Best-effort stop line, then shut the stream down
    async fn close(mut self) {
        if !self.write_closed {
            match tokio::time::timeout(CLOSE_WRITE_TIMEOUT, self.writer.send(ControlMessage::STOP))
                .await
            {
                Ok(Ok(())) => debug!("Sent final stop to {}", self.peer),
                Ok(Err(e)) => debug!("Final stop to {} failed: {}", self.peer, e),
                Err(_) => debug!("Final stop to {} timed out", self.peer),
            }
        }
        if let Err(e) = self.writer.get_mut().shutdown().await {
            debug!("Shutdown of {} failed: {}", self.peer, e);
        }
    }
}

#[derive(Default)]
struct Link {
    conn: Option<Connection>,
    endpoint: Option<Endpoint>,
}

impl Link {
    fn is_live(&mut self) -> bool {
        self.conn.as_mut().is_some_and(Connection::is_live)
    }
}

struct Inner {
    link: Mutex<Link>,
    ready: Notify,
    state_tx: watch::Sender<ConnectionState>,
    notifier: UiNotifier,
    settings: ConnectionSettings,
}

/// Client-side owner of the receiver connection
///
/// Cheap to clone; clones share the same link.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager in the `Disconnected` state
    pub fn new(settings: ConnectionSettings, notifier: UiNotifier) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                link: Mutex::new(Link::default()),
                ready: Notify::new(),
                state_tx,
                notifier,
                settings,
            }),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Watch connection state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.inner.state_tx.send_replace(state);
        if previous != state {
            debug!("Connection state: {} -> {}", previous, state);
            self.inner.notifier.state(state);
        }
    }

    /// Connect to `endpoint`, replacing any existing connection
    ///
    /// Whatever the outcome, the connect/disconnect control is re-enabled and
    /// tasks waiting on the ready notification are woken.
    pub async fn connect(&self, endpoint: Endpoint) -> Result<()> {
        let mut link = self.inner.link.lock().await;
        link.endpoint = Some(endpoint);

        if let Some(old) = link.conn.take() {
            debug!("Closing previous connection to {}", old.peer);
            old.close().await;
        }

        self.set_state(ConnectionState::Connecting);
        info!("Connecting to {}", endpoint);

        let result = self.establish(&mut link, endpoint).await;
        match &result {
            Ok(()) => {
                info!("Connected to {}", endpoint);
                self.set_state(ConnectionState::Connected);
                self.inner.notifier.status("Connected");
            }
            Err(e) => {
                warn!("Connect to {} failed: {}", endpoint, e);
                self.set_state(ConnectionState::Disconnected);
                self.inner.notifier.status(format!("Connect failed: {e}"));
            }
        }

        self.inner.notifier.control_enabled(true);
        self.inner.ready.notify_waiters();
        result
    }

    async fn establish(&self, link: &mut Link, endpoint: Endpoint) -> Result<()> {
        let mut conn = Connection::open(endpoint, self.inner.settings.connect_timeout).await?;
        conn.write(ControlMessage::STOP).await?;
        link.conn = Some(conn);
        Ok(())
    }

    /// Close the connection after a final stop line
    ///
    /// Clears the remembered endpoint, so later sends do not reconnect on
    /// their own.
    pub async fn disconnect(&self) {
        let mut link = self.inner.link.lock().await;
        link.endpoint = None;

        if let Some(conn) = link.conn.take() {
            info!("Disconnecting from {}", conn.peer);
            conn.close().await;
        }

        self.set_state(ConnectionState::Disconnected);
        self.inner.notifier.status("Disconnected");
        self.inner.notifier.control_enabled(true);
        self.inner.ready.notify_waiters();
    }

    /// Write one control line
    ///
    /// A dead link triggers one reconnect to the last endpoint, bounded by
    /// `reconnect_wait`. Any write failure closes the link.
    pub async fn send(&self, message: ControlMessage) -> Result<()> {
        let mut link = self.inner.link.lock().await;

        if !link.is_live() {
            let Some(endpoint) = link.endpoint else {
                debug!("Dropping {}: not connected", message);
                return Err(ConnectionError::NotConnected);
            };

            let ready = self.inner.ready.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();
            drop(link);

            debug!("Link to {} not live, reconnecting", endpoint);
            let manager = self.clone();
            tokio::spawn(async move {
                let _ = manager.connect(endpoint).await;
            });

            if tokio::time::timeout(self.inner.settings.reconnect_wait, ready)
                .await
                .is_err()
            {
                debug!("Reconnect to {} still pending after {:?}", endpoint, self.inner.settings.reconnect_wait);
            }
            link = self.inner.link.lock().await;
        }

        let Some(conn) = link.conn.as_mut() else {
            return Err(ConnectionError::NotConnected);
        };

        match conn.write(message).await {
            Ok(()) => {
                debug!("Sent {}", message);
                Ok(())
            }
            Err(e) => {
                warn!("Send to {} failed: {}", conn.peer, e);
                self.inner.notifier.status(format!("Send failed: {e}"));
                if let Some(conn) = link.conn.take() {
                    conn.close().await;
                }
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// True when a connection exists and both directions are open
    pub async fn is_live(&self) -> bool {
        self.inner.link.lock().await.is_live()
    }

    /// Peer of the current connection, if any
    pub async fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.link.lock().await.conn.as_ref().map(|c| c.peer)
    }

    /// Final teardown on exit: close without status notifications
    pub async fn shutdown(&self) {
        let mut link = self.inner.link.lock().await;
        link.endpoint = None;
        if let Some(conn) = link.conn.take() {
            conn.close().await;
        }
        self.set_state(ConnectionState::Disconnected);
        self.inner.ready.notify_waiters();
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::events::UiEvent;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, Endpoint::new(std::net::Ipv4Addr::LOCALHOST, port))
    }

    fn manager() -> (ConnectionManager, tokio::sync::mpsc::UnboundedReceiver<UiEvent>) {
        let (notifier, rx) = UiNotifier::channel();
        (ConnectionManager::new(ConnectionSettings::default(), notifier), rx)
    }

    #[tokio::test]
    async fn test_connect_sends_initial_stop() {
        let (listener, endpoint) = listener().await;
        let (manager, _rx) = manager();

        manager.connect(endpoint).await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.is_live().await);

        let (socket, _) = listener.accept().await.unwrap();
        let mut lines = tokio::io::BufReader::new(socket).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 0, Speed: 0");

        manager.send(ControlMessage::new(90, 40)).await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 90, Speed: 40");
    }

    #[tokio::test]
    async fn test_connect_failure_reports_status() {
        let (listener, endpoint) = listener().await;
        drop(listener);
        let (manager, mut rx) = manager();

        assert!(manager.connect(endpoint).await.is_err());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.is_live().await);

        let mut saw_failure = false;
        let mut saw_enable = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                UiEvent::Status(s) if s.starts_with("Connect failed: ") => saw_failure = true,
                UiEvent::ControlEnabled(true) => saw_enable = true,
                _ => {}
            }
        }
        assert!(saw_failure && saw_enable);
    }

    #[tokio::test]
    async fn test_disconnect_writes_stop_and_closes() {
        let (listener, endpoint) = listener().await;
        let (manager, _rx) = manager();
        manager.connect(endpoint).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();

        manager.send(ControlMessage::new(45, 30)).await.unwrap();
        manager.disconnect().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.is_live().await);

        let mut lines = tokio::io::BufReader::new(socket).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 0, Speed: 0");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 45, Speed: 30");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 0, Speed: 0");
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_before_any_connect_is_not_connected() {
        let (manager, _rx) = manager();
        assert!(matches!(
            manager.send(ControlMessage::new(90, 40)).await,
            Err(ConnectionError::NotConnected)
        ));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_after_disconnect_does_not_reconnect() {
        let (listener, endpoint) = listener().await;
        let (manager, _rx) = manager();
        manager.connect(endpoint).await.unwrap();
        let _socket = listener.accept().await.unwrap();
        manager.disconnect().await;

        assert!(matches!(
            manager.send(ControlMessage::STOP).await,
            Err(ConnectionError::NotConnected)
        ));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_reconnects_after_peer_close() {
        let (listener, endpoint) = listener().await;
        let (manager, _rx) = manager();
        manager.connect(endpoint).await.unwrap();

        let (first, _) = listener.accept().await.unwrap();
        drop(first);

        // Give the reactor a moment to observe the FIN
        tokio::time::sleep(Duration::from_millis(50)).await;

        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        manager.send(ControlMessage::new(10, 20)).await.unwrap();

        let second = accept.await.unwrap();
        let mut lines = tokio::io::BufReader::new(second).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 0, Speed: 0");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "Angle: 10, Speed: 20");
    }
}
