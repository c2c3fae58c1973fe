//! Control message type and line parsing

use std::fmt;

use thiserror::Error;

use crate::input::ControlSample;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Reasons a received line is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Line did not split into exactly four tokens
    #[error("Expected 4 tokens, got {0}")]
    TokenCount(usize),

    /// Token in a label position was not the expected label
    #[error("Unexpected label '{found}' (expected '{expected}')")]
    UnexpectedLabel {
        /// Label that was required
        expected: &'static str,
        /// Label that was received
        found: String,
    },

    /// Value token is not an integer
    #[error("Invalid {field} value: '{value}'")]
    InvalidNumber {
        /// Field name ("angle" or "speed")
        field: &'static str,
        /// Raw token
        value: String,
    },

    /// Line exceeded the decoder's maximum length
    #[error("Line too long (max {0} bytes)")]
    LineTooLong(usize),

    /// Line is not valid UTF-8
    #[error("Line is not valid UTF-8")]
    InvalidEncoding,
}

/// Wire-level motion command
///
/// `angle` is in integer degrees, `speed` in integer percent (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControlMessage {
    /// Heading in degrees
    pub angle: i32,
    /// Speed in percent
    pub speed: i32,
}

impl ControlMessage {
    /// The neutral "stop" command
    pub const STOP: ControlMessage = ControlMessage { angle: 0, speed: 0 };

    /// Create a message from already-rounded values
    pub const fn new(angle: i32, speed: i32) -> Self {
        Self { angle, speed }
    }

    /// Round a sampled angle / speed ratio into wire units
    ///
    /// Angle is rounded to the nearest degree, speed to the nearest percent of
    /// `speed_ratio * 100`.
    pub fn from_values(angle_degrees: f64, speed_ratio: f64) -> Self {
        Self {
            angle: angle_degrees.round() as i32,
            speed: (speed_ratio * 100.0).round() as i32,
        }
    }

    /// Encode a joystick sample
    pub fn from_sample(sample: &ControlSample) -> Self {
        Self::from_values(sample.angle_degrees, sample.speed_ratio)
    }

    /// True for the neutral stop command
    pub fn is_stop(&self) -> bool {
        self.speed == 0
    }

    /// Render the wire line without the trailing newline
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Angle: {}, Speed: {}", self.angle, self.speed)
    }
}

impl std::str::FromStr for ControlMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        parse_line(s)
    }
}

/// Parse one received line (without its newline)
///
/// The line is split on `": "` and `", "`. Trailing empty tokens are
/// discarded, then exactly four tokens must remain: `Angle`, a number,
/// `Speed`, a number. Numbers are trimmed before parsing.
pub fn parse_line(line: &str) -> Result<ControlMessage> {
    let tokens = split_tokens(line);

    if tokens.len() != 4 {
        return Err(ProtocolError::TokenCount(tokens.len()));
    }

    expect_label(tokens[0], "Angle")?;
    expect_label(tokens[2], "Speed")?;

    let angle = parse_number(tokens[1], "angle")?;
    let speed = parse_number(tokens[3], "speed")?;

    Ok(ControlMessage { angle, speed })
}

fn split_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::with_capacity(4);
    let mut rest = line;

    loop {
        let next = [rest.find(": "), rest.find(", ")]
            .into_iter()
            .flatten()
            .min();

        match next {
            Some(idx) => {
                tokens.push(&rest[..idx]);
                rest = &rest[idx + 2..];
            }
            None => {
                tokens.push(rest);
                break;
            }
        }
    }

    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }

    tokens
}

fn expect_label(token: &str, expected: &'static str) -> Result<()> {
    if token.trim() == expected {
        Ok(())
    } else {
        Err(ProtocolError::UnexpectedLabel {
            expected,
            found: token.to_string(),
        })
    }
}

fn parse_number(token: &str, field: &'static str) -> Result<i32> {
    token
        .trim()
        .parse::<i32>()
        .map_err(|_| ProtocolError::InvalidNumber {
            field,
            value: token.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        assert_eq!(parse_line("Angle: 45, Speed: 30"), Ok(ControlMessage::new(45, 30)));
    }

    #[test]
    fn test_parse_negative_and_signed_values() {
        assert_eq!(parse_line("Angle: -15, Speed: +20"), Ok(ControlMessage::new(-15, 20)));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_line("garbage"), Err(ProtocolError::TokenCount(1)));
        assert_eq!(parse_line(""), Err(ProtocolError::TokenCount(0)));
    }

    #[test]
    fn test_parse_non_numeric_angle() {
        assert!(matches!(
            parse_line("Angle: x, Speed: 30"),
            Err(ProtocolError::InvalidNumber { field: "angle", .. })
        ));
    }

    #[test]
    fn test_parse_extra_tokens() {
        assert_eq!(
            parse_line("Angle: 1, Speed: 2, Extra: 3"),
            Err(ProtocolError::TokenCount(6))
        );
    }

    #[test]
    fn test_parse_trailing_separator_is_tolerated() {
        assert_eq!(parse_line("Angle: 10, Speed: 20, "), Ok(ControlMessage::new(10, 20)));
    }

    #[test]
    fn test_parse_wrong_label() {
        assert!(matches!(
            parse_line("Heading: 10, Speed: 20"),
            Err(ProtocolError::UnexpectedLabel { expected: "Angle", .. })
        ));
    }

    #[test]
    fn test_parse_separator_without_space_is_one_token() {
        // ":" alone is not a separator
        assert_eq!(parse_line("Angle:45, Speed:30"), Err(ProtocolError::TokenCount(2)));
    }

    #[test]
    fn test_display_matches_wire_format() {
        assert_eq!(ControlMessage::new(270, 100).to_line(), "Angle: 270, Speed: 100");
        assert_eq!(ControlMessage::STOP.to_string(), "Angle: 0, Speed: 0");
    }

    #[test]
    fn test_from_values_rounding() {
        assert_eq!(ControlMessage::from_values(44.5, 0.306), ControlMessage::new(45, 31));
        assert_eq!(ControlMessage::from_values(359.4, 1.0), ControlMessage::new(359, 100));
        assert_eq!(ControlMessage::from_values(0.0, 0.0), ControlMessage::STOP);
    }

    #[test]
    fn test_from_str() {
        let msg: ControlMessage = "Angle: 90, Speed: 40".parse().unwrap();
        assert_eq!(msg, ControlMessage::new(90, 40));
    }
}
