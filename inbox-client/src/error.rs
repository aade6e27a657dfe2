//! Client error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::credentials::CredentialError;
use crate::transport::TransportError;

/// Boxed error returned by a credential acquisition callback.
pub type AcquireError = Box<dyn std::error::Error + Send + Sync>;

/// Client errors.
///
/// Callers decide what to do with [`is_auth_error`](Self::is_auth_error)
/// (re-prompt), [`is_transient`](Self::is_transient) (retry) and
/// [`is_not_found`](Self::is_not_found) (ignore).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The credential acquisition callback failed. Nothing was cached.
    #[error("credential acquisition failed: {0}")]
    AuthAcquisitionFailed(#[source] AcquireError),

    /// The server rejected the token. The cached token has been cleared.
    #[error("authorization rejected")]
    AuthRejected,

    /// No token is available; call `authorize()` first.
    #[error("not authorized")]
    NotAuthorized,

    /// Transport error (REST or push channel).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server does not know the referenced resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered with an unexpected status.
    #[error("unexpected status: {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },

    /// Credential store error.
    #[error("credential store error: {0}")]
    Credentials(#[from] CredentialError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// The caller needs to obtain a new token.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ClientError::AuthRejected
                | ClientError::NotAuthorized
                | ClientError::AuthAcquisitionFailed(_)
        )
    }

    /// The failure may go away on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::UnexpectedStatus { status } => *status >= 500,
            _ => false,
        }
    }

    /// The referenced notification does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_distinguishable() {
        assert!(ClientError::AuthRejected.is_auth_error());
        assert!(!ClientError::AuthRejected.is_transient());

        let transport = ClientError::Transport(TransportError::Timeout);
        assert!(transport.is_transient());
        assert!(!transport.is_auth_error());

        let missing = ClientError::NotFound("n1".into());
        assert!(missing.is_not_found());
        assert!(!missing.is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        assert!(ClientError::UnexpectedStatus { status: 503 }.is_transient());
        assert!(!ClientError::UnexpectedStatus { status: 400 }.is_transient());
    }

    #[test]
    fn acquisition_failure_keeps_source() {
        let err = ClientError::AuthAcquisitionFailed("user cancelled".into());
        assert!(err.is_auth_error());
        assert_eq!(err.to_string(), "credential acquisition failed: user cancelled");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientError>();
    }
}
