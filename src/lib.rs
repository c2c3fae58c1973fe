//! # lamco-rc-drive
//!
//! Remote-control link between a virtual joystick and a vehicle.
//!
//! The controller samples a joystick pad, rate-limits the resulting
//! (angle, speed) pairs and writes them as text lines over TCP; the
//! receiver parses each line, applies the stop policy and drives the
//! vehicle's control device.
//!
//! # Architecture
//!
//! ```text
//! lamco-rc-controller                          lamco-rc-receiver
//!   ├─> JoystickSampler (input)                  ├─> ReceiverListener (accept loop)
//!   ├─> ControllerSession (client)               ├─> ControlCodec (line parser)
//!   │     ├─> CommandEncoder + SendThrottle      ├─> policy (speed 0 ⇒ angle 0)
//!   │     ├─> KeepAliveDriver                    ├─> Dispatcher (main task)
//!   │     └─> ClientWorker → ConnectionManager   └─> Actuator (ioctl / log)
//!   └─> UiEvent stream
//! ```
//!
//! # Wire Format
//!
//! One command per line, no acknowledgement:
//!
//! ```text
//! Angle: <int>, Speed: <int>\n
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Controller side: connection, throttling, keep-alive, session
pub mod client;

/// Configuration
pub mod config;

/// Joystick sampling
pub mod input;

/// Wire protocol
pub mod protocol;

/// Vehicle side: listener, dispatcher, actuators
pub mod receiver;

/// Utility functions
pub mod utils;
