//! Error types for inbox-sync wire handling.

use thiserror::Error;

/// Errors that can occur while encoding or decoding inbox-sync data.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Invalid credential scope
    #[error("invalid scope: {0}")]
    InvalidScope(String),
}
