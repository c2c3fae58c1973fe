//! Idle keep-alive
//!
//! While the joystick rests at center and the link is up, a background task
//! re-sends the stop command at a fixed cadence. A lost final stop line can
//! then never leave the vehicle moving.
//!
//! ```text
//!              start()                      direction != NONE / stop()
//!  STOPPED ───────────────> RUNNING ─────────────────────────────> STOPPED
//!                              │  state leaves CONNECTED
//!                              └──────────────────────────────────> STOPPED
//! ```
//!
//! Cancellation is checked between ticks only; a stop that is being queued
//! always completes.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::encoder::CommandEncoder;
use super::events::ConnectionState;
use crate::protocol::ControlMessage;

/// Default keep-alive cadence
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_millis(50);

struct KeepAliveLoop {
    token: CancellationToken,
    handle: JoinHandle<u64>,
}

/// Periodic stop-command driver
pub struct KeepAliveDriver {
    encoder: CommandEncoder,
    state_rx: watch::Receiver<ConnectionState>,
    interval: Duration,
    current: Mutex<Option<KeepAliveLoop>>,
}

impl KeepAliveDriver {
    /// Create a stopped driver
    pub fn new(
        encoder: CommandEncoder,
        state_rx: watch::Receiver<ConnectionState>,
        interval: Duration,
    ) -> Self {
        Self {
            encoder,
            state_rx,
            interval,
            current: Mutex::new(None),
        }
    }

    /// Start the loop unless one is already live
    ///
    /// Returns true when a new loop was spawned.
    pub fn start(&self) -> bool {
        let mut current = self.current.lock();

        if let Some(existing) = current.as_ref() {
            if !existing.handle.is_finished() && !existing.token.is_cancelled() {
                return false;
            }
        }
        if let Some(stale) = current.take() {
            stale.token.cancel();
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_keepalive(
            self.encoder.clone(),
            self.state_rx.clone(),
            self.interval,
            token.clone(),
        ));
        *current = Some(KeepAliveLoop { token, handle });
        true
    }

    /// Cancel the running loop, if any
    pub fn stop(&self) {
        if let Some(running) = self.current.lock().take() {
            running.token.cancel();
        }
    }

    /// True while a loop is live
    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|l| !l.handle.is_finished() && !l.token.is_cancelled())
    }
}

impl Drop for KeepAliveDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for KeepAliveDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepAliveDriver")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run_keepalive(
    encoder: CommandEncoder,
    mut state_rx: watch::Receiver<ConnectionState>,
    period: Duration,
    token: CancellationToken,
) -> u64 {
    let mut queued = 0u64;

    if *state_rx.borrow_and_update() != ConnectionState::Connected {
        debug!("Keep-alive not started: link not connected");
        return queued;
    }
    debug!("Keep-alive started ({:?})", period);

    'keepalive: loop {
        if encoder.submit_message(ControlMessage::STOP) {
            queued += 1;
        } else {
            trace!("Keep-alive stop throttled");
        }

        // The pause starts after the submit so the next stop clears the send gate
        let pause = tokio::time::sleep(period);
        tokio::pin!(pause);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break 'keepalive,
                changed = state_rx.changed() => {
                    if changed.is_err() || *state_rx.borrow_and_update() != ConnectionState::Connected {
                        break 'keepalive;
                    }
                }
                _ = &mut pause => break,
            }
        }
    }

    debug!("Keep-alive stopped after {} stops", queued);
    queued
}
