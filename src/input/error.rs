//! Input Error Types

use thiserror::Error;

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;

/// Joystick input errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// Pad radius is zero, negative or not finite
    #[error("Invalid joystick radius: {0}")]
    InvalidRadius(f64),

    /// Pointer or center coordinate is not finite
    #[error("Invalid coordinate: ({0}, {1})")]
    InvalidCoordinate(f64, f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            InputError::InvalidRadius(-1.0).to_string(),
            "Invalid joystick radius: -1"
        );
        assert_eq!(
            InputError::InvalidCoordinate(1.5, 2.0).to_string(),
            "Invalid coordinate: (1.5, 2)"
        );
    }
}
