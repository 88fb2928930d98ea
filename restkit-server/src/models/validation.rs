//! Validation error types

use std::fmt;

/// Validation error for request bodies
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field is shorter than its minimum length
    TooShort { field: &'static str, min: usize },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Body could not be read as the expected JSON shape
    /// (syntax, wrong type, unknown or missing field)
    InvalidBody { reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidBody { reason } => write!(f, "invalid request body: {}", reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Per-endpoint validation, run by the `ValidJson` extractor.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Check a string's length in characters against `min..=max`.
pub fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if min > 0 && len == 0 {
        return Err(ValidationError::Empty { field });
    }
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "name exceeds maximum length of 100 characters"
        );

        let err = ValidationError::TooShort { field: "name", min: 3 };
        assert_eq!(err.to_string(), "name must be at least 3 characters");
    }

    #[test]
    fn length_counts_characters() {
        // 3 characters, 6 bytes
        assert!(check_length("name", "ñáé", 3, 100).is_ok());
    }

    #[test]
    fn length_bounds() {
        assert!(matches!(
            check_length("name", "", 3, 100),
            Err(ValidationError::Empty { .. })
        ));
        assert!(matches!(
            check_length("name", "ab", 3, 100),
            Err(ValidationError::TooShort { min: 3, .. })
        ));
        assert!(matches!(
            check_length("name", &"a".repeat(101), 3, 100),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
        assert!(check_length("description", "", 0, 500).is_ok());
    }
}
