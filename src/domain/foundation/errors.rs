//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction and state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Field '{field}' is immutable once set")]
    Immutable { field: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an immutability violation error.
    pub fn immutable(field: impl Into<String>) -> Self {
        ValidationError::Immutable {
            field: field.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("session_id");
        assert_eq!(format!("{}", err), "Field 'session_id' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("request_type", "unknown variant");
        assert_eq!(
            format!("{}", err),
            "Field 'request_type' has invalid format: unknown variant"
        );
    }

    #[test]
    fn validation_error_immutable_displays_correctly() {
        let err = ValidationError::immutable("product");
        assert_eq!(format!("{}", err), "Field 'product' is immutable once set");
    }
}
