//! Joystick Input
//!
//! Converts pointer gestures on a virtual joystick pad into control samples.
//!
//! # Architecture
//!
//! ```text
//! Pointer down / move / up
//!       ↓
//! ┌─────────────────────────┐
//! │  JoystickSampler        │ ← clamp to radius, angle, speed ratio
//! └─────────────────────────┘
//!       ↓
//! ┌─────────────────────────┐
//! │  Direction              │ ← octant + diagonal override
//! └─────────────────────────┘
//!       ↓
//! ControlSample → listener (controller session)
//! ```
//!
//! # Usage Example
//!
//! ```rust
//! use lamco_rc_drive::input::{Direction, JoystickGeometry, JoystickSampler};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let geometry = JoystickGeometry::for_view(600.0, 600.0)?;
//! let mut sampler = JoystickSampler::new(geometry)?;
//!
//! // Push straight up, half way to the rim
//! let sample = sampler.pointer_at(300.0, 200.0)?;
//! assert_eq!(sample.direction, Direction::Up);
//! assert!((sample.speed_ratio - 0.5).abs() < 1e-9);
//!
//! let released = sampler.release();
//! assert_eq!(released.direction, Direction::None);
//! # Ok(())
//! # }
//! ```

pub mod direction;
pub mod error;
pub mod joystick;

pub use direction::Direction;
pub use error::{InputError, Result};
pub use joystick::{
    clamp_offset, sample_offset, ControlSample, JoystickGeometry, JoystickSampler, PointerEvent,
    DIAGONAL_SENSITIVITY,
};
