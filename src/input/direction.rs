//! Joystick direction octants

use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-width of an octant in degrees
const HALF_SECTOR: f64 = 22.5;

/// Width of an octant in degrees
const SECTOR: f64 = 45.0;

/// Joystick direction
///
/// Derived from the last pointer offset; never stored beyond the sample that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Control released / centered
    #[default]
    None,
    /// Forward
    Up,
    /// Backward
    Down,
    /// Left
    Left,
    /// Right
    Right,
    /// Forward-left
    UpLeft,
    /// Forward-right
    UpRight,
    /// Backward-left
    DownLeft,
    /// Backward-right
    DownRight,
}

/// Octants in angle order, starting at the sector centered on 0°
const OCTANTS: [Direction; 8] = [
    Direction::Up,
    Direction::UpLeft,
    Direction::Left,
    Direction::DownLeft,
    Direction::Down,
    Direction::DownRight,
    Direction::Right,
    Direction::UpRight,
];

impl Direction {
    /// Classify an angle (degrees, any range) into its octant
    ///
    /// Sector `k` covers `[22.5 + 45(k-1), 22.5 + 45k)`; each boundary belongs
    /// to the sector that starts at it. The angle convention is the
    /// sampler's: 0° is up and the angle grows toward the pointer's left, so
    /// 90° is `Left` and 270° is `Right`.
    pub fn from_angle(angle_degrees: f64) -> Self {
        let normalized = angle_degrees.rem_euclid(360.0);
        let shifted = (normalized + HALF_SECTOR).rem_euclid(360.0);
        let index = ((shifted / SECTOR).floor() as usize).min(OCTANTS.len() - 1);
        OCTANTS[index]
    }

    /// Diagonal octant for the quadrant of a screen-space offset
    ///
    /// Screen coordinates: `dy < 0` is up, `dx > 0` is right. Returns `None`
    /// when either component is zero.
    pub fn diagonal_for(dx: f64, dy: f64) -> Option<Self> {
        if dx == 0.0 || dy == 0.0 {
            return None;
        }
        Some(match (dx > 0.0, dy < 0.0) {
            (true, true) => Direction::UpRight,
            (false, true) => Direction::UpLeft,
            (true, false) => Direction::DownRight,
            (false, false) => Direction::DownLeft,
        })
    }

    /// True for the four diagonal octants
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Direction::UpLeft | Direction::UpRight | Direction::DownLeft | Direction::DownRight
        )
    }

    /// True when the control is at rest
    pub fn is_none(&self) -> bool {
        *self == Direction::None
    }

    /// Short display label for UI notifications
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Up => "↑ Forward",
            Direction::Right => "→ Right",
            Direction::Down => "↓ Backward",
            Direction::Left => "← Left",
            Direction::UpRight => "↗ Forward right",
            Direction::DownRight => "↘ Backward right",
            Direction::DownLeft => "↙ Backward left",
            Direction::UpLeft => "↖ Forward left",
            Direction::None => "○ Stopped",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::None => "NONE",
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
            Direction::UpLeft => "UP_LEFT",
            Direction::UpRight => "UP_RIGHT",
            Direction::DownLeft => "DOWN_LEFT",
            Direction::DownRight => "DOWN_RIGHT",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_centers() {
        assert_eq!(Direction::from_angle(0.0), Direction::Up);
        assert_eq!(Direction::from_angle(45.0), Direction::UpLeft);
        assert_eq!(Direction::from_angle(90.0), Direction::Left);
        assert_eq!(Direction::from_angle(135.0), Direction::DownLeft);
        assert_eq!(Direction::from_angle(180.0), Direction::Down);
        assert_eq!(Direction::from_angle(225.0), Direction::DownRight);
        assert_eq!(Direction::from_angle(270.0), Direction::Right);
        assert_eq!(Direction::from_angle(315.0), Direction::UpRight);
    }

    #[test]
    fn test_boundaries_belong_to_next_sector() {
        let expected = [
            (22.5, Direction::UpLeft),
            (67.5, Direction::Left),
            (112.5, Direction::DownLeft),
            (157.5, Direction::Down),
            (202.5, Direction::DownRight),
            (247.5, Direction::Right),
            (292.5, Direction::UpRight),
            (337.5, Direction::Up),
        ];
        for (angle, direction) in expected {
            assert_eq!(Direction::from_angle(angle), direction, "angle {angle}");
        }
    }

    #[test]
    fn test_just_below_boundaries() {
        assert_eq!(Direction::from_angle(22.499), Direction::Up);
        assert_eq!(Direction::from_angle(337.499), Direction::UpRight);
        assert_eq!(Direction::from_angle(359.999), Direction::Up);
    }

    #[test]
    fn test_out_of_range_angles_wrap() {
        assert_eq!(Direction::from_angle(360.0), Direction::Up);
        assert_eq!(Direction::from_angle(-90.0), Direction::Right);
        assert_eq!(Direction::from_angle(450.0), Direction::Left);
    }

    #[test]
    fn test_classification_never_yields_none() {
        let mut angle = 0.0;
        while angle < 360.0 {
            assert_ne!(Direction::from_angle(angle), Direction::None);
            angle += 0.25;
        }
    }

    #[test]
    fn test_diagonal_for_quadrants() {
        assert_eq!(Direction::diagonal_for(1.0, -1.0), Some(Direction::UpRight));
        assert_eq!(Direction::diagonal_for(-1.0, -1.0), Some(Direction::UpLeft));
        assert_eq!(Direction::diagonal_for(1.0, 1.0), Some(Direction::DownRight));
        assert_eq!(Direction::diagonal_for(-1.0, 1.0), Some(Direction::DownLeft));
        assert_eq!(Direction::diagonal_for(0.0, 1.0), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Direction::UpRight.to_string(), "UP_RIGHT");
        assert_eq!(Direction::None.to_string(), "NONE");
        assert!(Direction::None.is_none());
        assert!(Direction::DownLeft.is_diagonal());
        assert!(!Direction::Left.is_diagonal());
    }
}
