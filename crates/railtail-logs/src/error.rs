//! Error types for log processing.

use thiserror::Error;

/// Errors that can occur while processing log records.
#[derive(Debug, Error)]
pub enum LogError {
    /// An attribute value is not valid JSON; the record cannot be rebuilt.
    #[error("failed to reconstruct attribute '{key}': {source}")]
    Reconstruction {
        /// Attribute key.
        key: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
