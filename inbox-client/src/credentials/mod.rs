//! Credential store abstraction.
//!
//! A key-value store holding at most one cached [`AuthToken`] per
//! [`ScopeKey`]. The session manager reads it before asking the caller to
//! acquire a token and clears it whenever the token is rejected.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use async_trait::async_trait;
use inbox_types::{AuthToken, ScopeKey};
use std::path::PathBuf;
use thiserror::Error;

/// Credential store errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading or writing the backing storage failed.
    #[error("credential store I/O error at {path}: {source}")]
    Io {
        /// Path of the entry.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A stored entry could not be decoded.
    #[error("corrupt credential entry at {path}: {source}")]
    Corrupt {
        /// Path of the entry.
        path: PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },
}

/// Key-value persistence for cached authorization tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the token cached under `scope`.
    async fn get(&self, scope: &ScopeKey) -> Result<Option<AuthToken>, CredentialError>;

    /// Cache `token` under `scope`, replacing any previous value.
    async fn set(&self, scope: &ScopeKey, token: &AuthToken) -> Result<(), CredentialError>;

    /// Remove the token cached under `scope`. Removing a missing entry is not an error.
    async fn remove(&self, scope: &ScopeKey) -> Result<(), CredentialError>;
}
