//! Control Protocol
//!
//! Line-oriented text protocol carried over a raw TCP stream. Every message is
//! one ASCII line:
//!
//! ```text
//! Angle: <integer>, Speed: <integer>\n
//! ```
//!
//! There is no acknowledgement, no framing beyond the newline and no
//! versioning. The receiver is the authoritative enforcement point for the
//! actuator policy (zero speed forces a zero angle).
//!
//! # Modules
//!
//! - [`message`] - [`ControlMessage`] and line parsing
//! - [`codec`] - `tokio_util` codec used by both ends of the link
//! - [`policy`] - the actuator policy

pub mod codec;
pub mod message;
pub mod policy;

pub use codec::{ControlCodec, InboundLine, MAX_LINE_LENGTH};
pub use message::{parse_line, ControlMessage, ProtocolError};
pub use policy::apply;

/// Well-known TCP port the receiver listens on
pub const DEFAULT_PORT: u16 = 8888;
