//! Error types for AlertQL.

use thiserror::Error;

use crate::alert::ValidationError;
use crate::condition::EditError;
use crate::config::ConfigError;
use crate::cron::CronError;

/// Result type alias for AlertQL operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in AlertQL operations.
///
/// Malformed condition trees are deliberately absent: the transforms and
/// SQL generators degrade to an empty result instead of failing.
#[derive(Error, Debug)]
pub enum Error {
    /// Alert form failed a submission check.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Condition tree edit referenced a missing group or went too deep.
    #[error("Edit failed: {0}")]
    Edit(#[from] EditError),

    /// Cron expression could not be parsed.
    #[error("Invalid cron expression: {0}")]
    Cron(#[from] CronError),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// History window is empty or inverted.
    #[error("Invalid time window: {0}")]
    TimeWindow(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the message suitable for a user-facing notification.
    ///
    /// Validation failures surface their own message without the
    /// category prefix; everything else uses the full display form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let err: Error = ValidationError::new("name", "Alert name is required").into();
        assert_eq!(err.to_string(), "Validation failed: name: Alert name is required");
        assert_eq!(err.user_message(), "Alert name is required");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
