//! Error types for Gator.

use std::time::Duration;

use thiserror::Error;

use crate::feed::fetcher::FetchError;
use crate::feed::store::StoreError;

/// Common error type for Gator.
#[derive(Error, Debug)]
pub enum GatorError {
    /// Database error.
    ///
    /// Errors from sqlx outside the feed store contract are converted here.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The polling interval argument could not be parsed or is not positive.
    #[error("configuration error: invalid interval {input:?}: {reason}")]
    InvalidInterval { input: String, reason: String },

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A command that needs a current user was run without one.
    #[error("not logged in: {0}")]
    NotLoggedIn(String),

    /// No handler is registered under the given command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Wrong arguments for a command.
    #[error("usage: {0}")]
    Usage(String),

    /// Feed retrieval or parsing failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Feed store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A whole fetch cycle exceeded its time budget.
    #[error("fetch cycle timed out after {}s", .0.as_secs_f64())]
    CycleTimeout(Duration),
}

impl GatorError {
    /// Whether this error belongs to the fatal startup class.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            GatorError::Config(_) | GatorError::InvalidInterval { .. }
        )
    }
}

impl From<sqlx::Error> for GatorError {
    fn from(e: sqlx::Error) -> Self {
        GatorError::Database(e.to_string())
    }
}

/// Result type alias for Gator operations.
pub type Result<T> = std::result::Result<T, GatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = GatorError::Validation("name is blank".to_string());
        assert_eq!(err.to_string(), "validation error: name is blank");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = GatorError::NotFound("user \"alice\"".to_string());
        assert_eq!(err.to_string(), "user \"alice\" not found");
    }

    #[test]
    fn test_invalid_interval_display() {
        let err = GatorError::InvalidInterval {
            input: "abc".to_string(),
            reason: "missing number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "configuration error: invalid interval \"abc\": missing number"
        );
    }

    #[test]
    fn test_is_config_error() {
        assert!(GatorError::Config("bad".into()).is_config_error());
        assert!(GatorError::InvalidInterval {
            input: "0s".into(),
            reason: "must be positive".into()
        }
        .is_config_error());
        assert!(!GatorError::Store(StoreError::NoFeedsRegistered).is_config_error());
        assert!(!GatorError::Fetch(FetchError::Http { status: 404 }).is_config_error());
    }

    #[test]
    fn test_fetch_error_is_transparent() {
        let err: GatorError = FetchError::Http { status: 404 }.into();
        assert_eq!(err.to_string(), "HTTP error: 404");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GatorError = io_err.into();
        assert!(matches!(err, GatorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_cycle_timeout_display() {
        let err = GatorError::CycleTimeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "fetch cycle timed out after 1.5s");
    }
}
