//! Error types for the Ronda engine.
//!
//! A single error enum is shared by every crate in the workspace so that
//! per-security failures, configuration problems and fatal upstream outages
//! can be told apart by the orchestrator.

use thiserror::Error;

/// The main error type for Ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Too few inputs to produce a score for one security.
    ///
    /// This is a per-security outcome, never fatal to a batch run.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The upstream metric source could not deliver any data for a run.
    ///
    /// This is the only condition that halts a batch.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Error reading from or writing to the score store.
    #[error("Store error: {0}")]
    Store(String),

    /// The batch run was cancelled.
    #[error("Run cancelled")]
    Cancelled,

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error (de)serializing JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl RondaError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Io(_))
    }
}

impl From<String> for RondaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for RondaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RondaError::InsufficientData("AAPL: 1 of 10 factors".to_string());
        assert_eq!(err.to_string(), "Insufficient data: AAPL: 1 of 10 factors");

        let err = RondaError::UpstreamUnavailable("no snapshots".to_string());
        assert_eq!(err.to_string(), "Upstream unavailable: no snapshots");
    }

    #[test]
    fn test_error_from_str() {
        let err: RondaError = "boom".into();
        assert!(matches!(err, RondaError::Other(_)));
    }

    #[test]
    fn test_transient() {
        assert!(RondaError::Store("locked".to_string()).is_transient());
        assert!(!RondaError::Cancelled.is_transient());
        assert!(!RondaError::InvalidConfig("alpha".to_string()).is_transient());
    }
}
