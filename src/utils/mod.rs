//! Utility Functions
//!
//! Logging setup and user-friendly error formatting for the binaries.
//!
//! ## Logging
//!
//! [`init_logging`] installs the `tracing` subscriber both binaries use:
//! `RUST_LOG` wins, otherwise the `-v` count picks the level for this crate.
//! Output format is `pretty`, `compact` or `json`; an optional log file is
//! written through a non-blocking appender.
//!
//! ## Error Formatting
//!
//! ```rust
//! use lamco_rc_drive::utils::format_user_error;
//!
//! let err = anyhow::anyhow!("Failed to bind 0.0.0.0:8888");
//! eprintln!("{}", format_user_error(&err));
//! ```

pub mod errors;
pub mod logging;

// Re-export key types
pub use errors::format_user_error;
pub use logging::{init_logging, log_banner, LogOptions};
