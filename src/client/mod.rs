//! Remote-Control Client
//!
//! Everything on the controller side between a joystick sample and the TCP
//! socket.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  ControllerSession   │ ← samples in, UiEvents out
//! └──────────────────────┘
//!        │            │
//!        ▼            ▼
//! ┌──────────────┐ ┌──────────────────┐
//! │ Command      │ │ KeepAliveDriver  │ ← stop every 50 ms while idle
//! │ Encoder      │◀┤                  │
//! │ (throttled)  │ └──────────────────┘
//! └──────────────┘
//!        │ Job::Send + SendPermit
//!        ▼
//! ┌──────────────────────┐
//! │  ClientWorker        │ ← single task, jobs in order
//! └──────────────────────┘
//!        │
//!        ▼
//! ┌──────────────────────┐
//! │  ConnectionManager   │ ← mutex + notify, lazy reconnect
//! └──────────────────────┘
//!        │
//!        ▼
//!   "Angle: <a>, Speed: <s>\n"
//! ```

pub mod connection;
pub mod encoder;
pub mod error;
pub mod events;
pub mod keepalive;
pub mod session;
pub mod throttle;
pub mod validation;
pub mod worker;

pub use connection::{ConnectionManager, ConnectionSettings};
pub use encoder::CommandEncoder;
pub use error::{ConnectionError, Result};
pub use events::{ConnectionState, UiEvent, UiNotifier};
pub use keepalive::KeepAliveDriver;
pub use session::{ControllerSession, SessionSettings, ToggleAction};
pub use throttle::{SendPermit, SendThrottle, ThrottleStats};
pub use validation::{parse_endpoint, validate_ip, validate_port, Endpoint, ValidationError};
pub use worker::{ClientWorker, Job, WorkerStats};
