//! Error types and handling for Chargelog
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Chargelog operations
pub type Result<T> = std::result::Result<T, ChargelogError>;

/// Main error type for Chargelog
#[derive(Debug, Error)]
pub enum ChargelogError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Database errors from the persistence gateway
    #[error("Database error: {message}")]
    Database { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Charging session lifecycle errors (invalid transitions, duplicate
    /// in-progress events)
    #[error("Session error: {message}")]
    Session { message: String },

    /// Notification surface errors
    #[error("Notification error: {message}")]
    Notification { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl ChargelogError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ChargelogError::Config {
            message: message.into(),
        }
    }

    /// Create a new database error
    pub fn database<S: Into<String>>(message: S) -> Self {
        ChargelogError::Database {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        ChargelogError::Io {
            message: message.into(),
        }
    }

    /// Create a new session lifecycle error
    pub fn session<S: Into<String>>(message: S) -> Self {
        ChargelogError::Session {
            message: message.into(),
        }
    }

    /// Create a new notification error
    pub fn notification<S: Into<String>>(message: S) -> Self {
        ChargelogError::Notification {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ChargelogError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        ChargelogError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ChargelogError {
    fn from(err: std::io::Error) -> Self {
        ChargelogError::io(err.to_string())
    }
}

impl From<rusqlite::Error> for ChargelogError {
    fn from(err: rusqlite::Error) -> Self {
        ChargelogError::database(err.to_string())
    }
}

impl From<serde_yaml::Error> for ChargelogError {
    fn from(err: serde_yaml::Error) -> Self {
        ChargelogError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChargelogError {
    fn from(err: serde_json::Error) -> Self {
        ChargelogError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for ChargelogError {
    fn from(err: chrono::ParseError) -> Self {
        ChargelogError::validation("datetime", &err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ChargelogError::config("test config error");
        assert!(matches!(err, ChargelogError::Config { .. }));

        let err = ChargelogError::database("test database error");
        assert!(matches!(err, ChargelogError::Database { .. }));

        let err = ChargelogError::validation("field", "test validation error");
        assert!(matches!(err, ChargelogError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = ChargelogError::config("test error");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Configuration error: test error");

        let err = ChargelogError::validation("test_field", "invalid value");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Validation error: test_field - invalid value");
    }

    #[test]
    fn test_rusqlite_conversion() {
        let err: ChargelogError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, ChargelogError::Database { .. }));
    }
}
