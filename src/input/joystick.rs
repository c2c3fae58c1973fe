//! Virtual Joystick Sampler
//!
//! Turns pointer positions on a circular joystick pad into
//! [`ControlSample`]s. The pad has a fixed center and a maximum radius `R`;
//! offsets beyond `R` are scaled back onto the rim so the speed ratio never
//! exceeds 1.0.
//!
//! # Angle convention
//!
//! ```text
//!              0° (up / forward)
//!                   │
//!     90° (left) ───┼─── 270° (right)
//!                   │
//!                 180° (down)
//! ```
//!
//! `angle = (atan2(-dx, -dy) + 360) mod 360` with screen coordinates
//! (`dy` grows downward).
//!
//! A sample is emitted for every down, move and up event, not only when the
//! direction changes, so the consumer sees a continuous stream while the
//! pointer is held.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::direction::Direction;
use super::error::{InputError, Result};

/// Fraction of `R` both offset components must exceed for the diagonal
/// override to apply
pub const DIAGONAL_SENSITIVITY: f64 = 0.4;

/// One joystick reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlSample {
    /// Octant of the current offset
    pub direction: Direction,
    /// Normalized displacement in `[0, 1]`
    pub speed_ratio: f64,
    /// Heading in `[0, 360)`
    pub angle_degrees: f64,
}

impl ControlSample {
    /// The released / centered sample
    pub const RELEASED: ControlSample = ControlSample {
        direction: Direction::None,
        speed_ratio: 0.0,
        angle_degrees: 0.0,
    };
}

/// Pointer action on the joystick pad
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed at (x, y)
    Down {
        /// X coordinate
        x: f64,
        /// Y coordinate
        y: f64,
    },
    /// Pointer dragged to (x, y)
    Move {
        /// X coordinate
        x: f64,
        /// Y coordinate
        y: f64,
    },
    /// Pointer released
    Up,
}

/// Fixed pad geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoystickGeometry {
    /// Pad center X
    pub center_x: f64,
    /// Pad center Y
    pub center_y: f64,
    /// Maximum handle travel `R`
    pub radius: f64,
}

impl JoystickGeometry {
    /// Geometry with explicit center and radius
    pub fn new(center_x: f64, center_y: f64, radius: f64) -> Result<Self> {
        let geometry = Self {
            center_x,
            center_y,
            radius,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Geometry for a pad drawn in a `width` x `height` view
    ///
    /// Center is the middle of the view, radius a third of the shorter side.
    pub fn for_view(width: f64, height: f64) -> Result<Self> {
        Self::new(width / 2.0, height / 2.0, width.min(height) / 3.0)
    }

    fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(InputError::InvalidRadius(self.radius));
        }
        if !self.center_x.is_finite() || !self.center_y.is_finite() {
            return Err(InputError::InvalidCoordinate(self.center_x, self.center_y));
        }
        Ok(())
    }
}

/// Clamp an offset onto the pad: returns the (possibly scaled) offset
pub fn clamp_offset(dx: f64, dy: f64, radius: f64) -> (f64, f64) {
    let distance = dx.hypot(dy);
    if distance > radius {
        let ratio = radius / distance;
        (dx * ratio, dy * ratio)
    } else {
        (dx, dy)
    }
}

/// Sample a raw pointer offset from the pad center
///
/// Speed comes from the unclamped distance, so anything at or past the rim
/// reads exactly 1.0. The diagonal test runs on the clamped handle offset.
pub fn sample_offset(raw_dx: f64, raw_dy: f64, radius: f64) -> ControlSample {
    let speed_ratio = (raw_dx.hypot(raw_dy) / radius).min(1.0);
    let angle_degrees = ((-raw_dx).atan2(-raw_dy).to_degrees() + 360.0) % 360.0;
    let (dx, dy) = clamp_offset(raw_dx, raw_dy, radius);

    let mut direction = Direction::from_angle(angle_degrees);

    // Pointer precision is poor near the center: a clearly two-axis push is
    // treated as diagonal even when the raw angle lands in a cardinal sector.
    let threshold = radius * DIAGONAL_SENSITIVITY;
    if dx.abs() > threshold && dy.abs() > threshold {
        if let Some(diagonal) = Direction::diagonal_for(dx, dy) {
            direction = diagonal;
        }
    }

    ControlSample {
        direction,
        speed_ratio,
        angle_degrees,
    }
}

type SampleListener = Box<dyn FnMut(&ControlSample) + Send>;

/// Joystick pad state
pub struct JoystickSampler {
    geometry: JoystickGeometry,
    handle_dx: f64,
    handle_dy: f64,
    current: ControlSample,
    listener: Option<SampleListener>,
    samples_emitted: u64,
}

impl JoystickSampler {
    /// Create a sampler for the given pad geometry
    pub fn new(geometry: JoystickGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            handle_dx: 0.0,
            handle_dy: 0.0,
            current: ControlSample::RELEASED,
            listener: None,
            samples_emitted: 0,
        })
    }

    /// Register the observer called with every emitted sample
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&ControlSample) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Process a pointer event
    pub fn handle_event(&mut self, event: PointerEvent) -> Result<ControlSample> {
        match event {
            PointerEvent::Down { x, y } | PointerEvent::Move { x, y } => self.pointer_at(x, y),
            PointerEvent::Up => Ok(self.release()),
        }
    }

    /// Pointer pressed or dragged to (x, y)
    pub fn pointer_at(&mut self, x: f64, y: f64) -> Result<ControlSample> {
        if !x.is_finite() || !y.is_finite() {
            return Err(InputError::InvalidCoordinate(x, y));
        }

        let radius = self.geometry.radius;
        let (raw_dx, raw_dy) = (x - self.geometry.center_x, y - self.geometry.center_y);
        let (dx, dy) = clamp_offset(raw_dx, raw_dy, radius);
        self.handle_dx = dx;
        self.handle_dy = dy;

        let sample = sample_offset(raw_dx, raw_dy, radius);
        trace!(
            "Joystick: dx={:.1} dy={:.1} -> {} speed={:.2} angle={:.1}",
            dx,
            dy,
            sample.direction,
            sample.speed_ratio,
            sample.angle_degrees
        );
        Ok(self.emit(sample))
    }

    /// Pointer released: recenter and emit the final neutral sample
    pub fn release(&mut self) -> ControlSample {
        self.handle_dx = 0.0;
        self.handle_dy = 0.0;
        self.emit(ControlSample::RELEASED)
    }

    fn emit(&mut self, sample: ControlSample) -> ControlSample {
        self.current = sample;
        self.samples_emitted += 1;
        if let Some(listener) = self.listener.as_mut() {
            listener(&sample);
        }
        sample
    }

    /// Last emitted sample
    pub fn current(&self) -> ControlSample {
        self.current
    }

    /// Current direction
    pub fn current_direction(&self) -> Direction {
        self.current.direction
    }

    /// Pad geometry
    pub fn geometry(&self) -> JoystickGeometry {
        self.geometry
    }

    /// Absolute handle position for rendering
    pub fn handle_position(&self) -> (f64, f64) {
        (
            self.geometry.center_x + self.handle_dx,
            self.geometry.center_y + self.handle_dy,
        )
    }

    /// Horizontal handle ratio in `[-1, 1]` (left negative)
    pub fn x_ratio(&self) -> f64 {
        self.handle_dx / self.geometry.radius
    }

    /// Vertical handle ratio in `[-1, 1]` (up negative, screen convention)
    pub fn y_ratio(&self) -> f64 {
        self.handle_dy / self.geometry.radius
    }

    /// Number of samples emitted so far
    pub fn samples_emitted(&self) -> u64 {
        self.samples_emitted
    }
}

impl std::fmt::Debug for JoystickSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoystickSampler")
            .field("geometry", &self.geometry)
            .field("handle", &(self.handle_dx, self.handle_dy))
            .field("current", &self.current)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}
