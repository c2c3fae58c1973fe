//! Client Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Connection manager errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// TCP connect did not complete in time
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// TCP connect failed
    #[error("{0}")]
    Connect(#[source] std::io::Error),

    /// Writing a line failed
    #[error("{0}")]
    Write(#[source] std::io::Error),

    /// No live connection to write to
    #[error("not connected")]
    NotConnected,
}
