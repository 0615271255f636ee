//! Core error types for minorm.
//!
//! [`OrmError`] is the single error enum used across the workspace. It covers
//! field validation failures, definition-time configuration mistakes, and the
//! database error categories surfaced by the backends.

use std::fmt;

use thiserror::Error;

/// A field validation failure.
///
/// Carries the failing field's name, a short machine-readable code
/// (e.g. `"out_of_range"`, `"max_length"`), and a human-readable message.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The name of the field that failed validation.
    pub field: String,
    /// A short code identifying the kind of failure.
    pub code: String,
    /// The human-readable message.
    pub message: String,
}

impl ValidationError {
    /// Creates a new `ValidationError`.
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for minorm.
#[derive(Error, Debug)]
pub enum OrmError {
    /// A value was rejected by a field's validation rules.
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    /// A schema or field definition is invalid (duplicate primary key,
    /// unsupported DDL default type, unknown field name).
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// A query expected exactly one row but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A query expected exactly one row but found several.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    /// A generic database error reported by the driver.
    #[error("Database error: {0}")]
    Database(String),

    /// A database integrity constraint was violated.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// An operational failure (connection establishment, driver setup).
    #[error("Operational error: {0}")]
    Operational(String),

    /// The requested operation is not supported by the target dialect.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrmError {
    /// Builds a validation error for the given field.
    pub fn validation(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation(ValidationError::new(field, code, message))
    }
}

/// A convenience alias for `Result<T, OrmError>`.
pub type OrmResult<T> = Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("age", "out_of_range", "value 200 exceeds maximum 150");
        assert_eq!(err.to_string(), "age: value 200 exceeds maximum 150");
    }

    #[test]
    fn test_orm_error_display() {
        let err = OrmError::ImproperlyConfigured("duplicate primary key".into());
        assert_eq!(
            err.to_string(),
            "Improperly configured: duplicate primary key"
        );
    }

    #[test]
    fn test_validation_constructor() {
        let err = OrmError::validation("username", "max_length", "too long");
        match err {
            OrmError::Validation(v) => {
                assert_eq!(v.field, "username");
                assert_eq!(v.code, "max_length");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: OrmError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }
}
