//! Send rate limiting
//!
//! Two independent gates decide whether a control update goes out:
//!
//! 1. **Interval gate** - requests arriving less than `min_interval` after
//!    the previous accepted one are dropped. The timestamp is taken before
//!    the in-flight check, so a request rejected by gate 2 still restarts
//!    the window.
//! 2. **In-flight gate** - while a previously accepted send is queued or
//!    executing, new requests are dropped. The returned [`SendPermit`] holds
//!    the gate closed until it is dropped by the worker.
//!
//! Nothing is ever buffered: a dropped request is simply lost, and the next
//! joystick sample supersedes it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Default minimum spacing between accepted sends
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_millis(50);

/// Throttle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleStats {
    /// Requests that passed both gates
    pub accepted: u64,
    /// Requests dropped by the interval gate
    pub dropped_interval: u64,
    /// Requests dropped because a send was in flight
    pub dropped_in_flight: u64,
}

/// Rate limiter for outgoing control updates
#[derive(Debug)]
pub struct SendThrottle {
    min_interval: Duration,
    last_send: Mutex<Option<Instant>>,
    in_flight: Arc<AtomicBool>,
    accepted: AtomicU64,
    dropped_interval: AtomicU64,
    dropped_in_flight: AtomicU64,
}

impl SendThrottle {
    /// Create a throttle with the given minimum spacing
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_send: Mutex::new(None),
            in_flight: Arc::new(AtomicBool::new(false)),
            accepted: AtomicU64::new(0),
            dropped_interval: AtomicU64::new(0),
            dropped_in_flight: AtomicU64::new(0),
        }
    }

    /// Try to start a send
    ///
    /// Returns a permit when both gates are open; the in-flight gate stays
    /// closed until the permit is dropped.
    pub fn try_acquire(&self) -> Option<SendPermit> {
        let now = Instant::now();
        {
            let mut last = self.last_send.lock();
            if let Some(previous) = *last {
                if now.duration_since(previous) < self.min_interval {
                    self.dropped_interval.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
            *last = Some(now);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.dropped_in_flight.fetch_add(1, Ordering::Relaxed);
            trace!("Send still in flight, dropping update");
            return None;
        }

        self.accepted.fetch_add(1, Ordering::Relaxed);
        Some(SendPermit {
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// True while an accepted send has not finished
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Configured minimum spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Counter snapshot
    pub fn stats(&self) -> ThrottleStats {
        ThrottleStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped_interval: self.dropped_interval.load(Ordering::Relaxed),
            dropped_in_flight: self.dropped_in_flight.load(Ordering::Relaxed),
        }
    }
}

impl Default for SendThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_INTERVAL)
    }
}

/// Proof that a send was accepted; releases the in-flight gate on drop
#[derive(Debug)]
pub struct SendPermit {
    in_flight: Arc<AtomicBool>,
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_yields_one_send_per_window() {
        let throttle = SendThrottle::default();
        let mut accepted = 0;

        // 100 requests spread over 10 ms
        for _ in 0..100 {
            if let Some(permit) = throttle.try_acquire() {
                accepted += 1;
                drop(permit);
            }
            tokio::time::advance(Duration::from_micros(100)).await;
        }

        assert_eq!(accepted, 1);
        assert_eq!(throttle.stats().dropped_interval, 99);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reopens_after_interval() {
        let throttle = SendThrottle::new(Duration::from_millis(50));
        drop(throttle.try_acquire().unwrap());

        tokio::time::advance(Duration::from_millis(49)).await;
        assert!(throttle.try_acquire().is_none());

        // The rejected request above did not move the window
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(throttle.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_blocks_and_still_restarts_window() {
        let throttle = SendThrottle::new(Duration::from_millis(50));
        let permit = throttle.try_acquire().unwrap();
        assert!(throttle.is_in_flight());

        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(throttle.try_acquire().is_none());
        assert_eq!(throttle.stats().dropped_in_flight, 1);

        drop(permit);
        assert!(!throttle.is_in_flight());

        // The in-flight rejection at 60 ms restarted the window
        tokio::time::advance(Duration::from_millis(10)).await;
        assert!(throttle.try_acquire().is_none());
        tokio::time::advance(Duration::from_millis(40)).await;
        assert!(throttle.try_acquire().is_some());
    }
}
