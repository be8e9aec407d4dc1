//! Validation error types

use thiserror::Error;

/// Input rejected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Field is empty (or whitespace only) when it shouldn't be
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Field exceeds maximum length
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Post positions are 1-based
    #[error("post position must be at least 1, got {position}")]
    InvalidPosition { position: i64 },
}

/// Trim `s` and check it is non-empty and at most `max` bytes.
pub(crate) fn bounded_trimmed(
    s: &str,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    if trimmed.len() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "title",
            max: 256,
        };
        assert_eq!(
            err.to_string(),
            "title exceeds maximum length of 256 characters"
        );

        let err = ValidationError::Empty { field: "username" };
        assert_eq!(err.to_string(), "username cannot be empty");
    }

    #[test]
    fn bounded_trimmed_rules() {
        assert_eq!(bounded_trimmed("  ada ", "name", 8).unwrap(), "ada");
        assert!(matches!(
            bounded_trimmed("   ", "name", 8),
            Err(ValidationError::Empty { field: "name" })
        ));
        assert!(matches!(
            bounded_trimmed("abcdefghi", "name", 8),
            Err(ValidationError::TooLong { max: 8, .. })
        ));
    }
}
