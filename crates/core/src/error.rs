//! Error types for the helpdesk.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application, including configuration, I/O, indexing, embeddings,
//! HTTP transport, and request validation.

use thiserror::Error;

/// Unified error type for the helpdesk.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index build and storage errors
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The retriever has not been loaded (no index yet, or a reload failed)
    #[error("Retriever not ready.")]
    NotReady,

    /// A requested resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Request parameters failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP transport errors (client side)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Index(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_message() {
        assert_eq!(AppError::NotReady.to_string(), "Retriever not ready.");
    }

    #[test]
    fn test_not_found_is_bare() {
        let err = AppError::NotFound("No feedback yet.".to_string());
        assert_eq!(err.to_string(), "No feedback yet.");
    }

    #[test]
    fn test_json_error_converts() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
