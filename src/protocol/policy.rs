//! Actuator policy
//!
//! A stopped vehicle has no heading: whenever the speed is zero the angle
//! handed to the actuator is zero as well, whatever the sender reported.

use super::message::ControlMessage;

/// Apply the actuator policy to a raw (angle, speed) pair
///
/// Returns `(effective_angle, speed)`.
pub fn apply(angle: i32, speed: i32) -> (i32, i32) {
    if speed == 0 {
        (0, speed)
    } else {
        (angle, speed)
    }
}

impl ControlMessage {
    /// Message with the actuator policy applied
    pub fn with_policy(self) -> Self {
        let (angle, speed) = apply(self.angle, self.speed);
        Self { angle, speed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_speed_forces_zero_angle() {
        assert_eq!(apply(173, 0), (0, 0));
        assert_eq!(apply(173, 0), apply(0, 0));
    }

    #[test]
    fn test_moving_keeps_angle() {
        assert_eq!(apply(90, 40), (90, 40));
        assert_eq!(apply(-30, 5), (-30, 5));
    }

    #[test]
    fn test_policy_is_idempotent() {
        for (angle, speed) in [(0, 0), (359, 0), (45, 100), (180, 1)] {
            let once = apply(angle, speed);
            assert_eq!(apply(once.0, once.1), once);
        }
    }

    #[test]
    fn test_message_with_policy() {
        assert_eq!(ControlMessage::new(200, 0).with_policy(), ControlMessage::STOP);
        assert_eq!(
            ControlMessage::new(200, 10).with_policy(),
            ControlMessage::new(200, 10)
        );
    }
}
