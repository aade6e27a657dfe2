//! Authorization token lifecycle.
//!
//! [`SessionManager`] owns the active token for one credential scope. It
//! resolves the token from memory, then from the [`CredentialStore`], and
//! only then asks the caller to acquire one.

use inbox_types::{AuthToken, ScopeKey};
use std::future::Future;
use tokio::sync::Mutex;

use crate::credentials::CredentialStore;
use crate::error::{AcquireError, ClientError};

/// Owns the authorization token for one scope.
pub struct SessionManager<S: CredentialStore> {
    scope: ScopeKey,
    store: S,
    token: Mutex<Option<AuthToken>>,
}

impl<S: CredentialStore> SessionManager<S> {
    /// Create a session manager for `scope` backed by `store`.
    pub fn new(scope: ScopeKey, store: S) -> Self {
        Self {
            scope,
            store,
            token: Mutex::new(None),
        }
    }

    /// Resolve the token, acquiring one only if nothing is cached.
    ///
    /// Concurrent calls are serialized: the token lock is held while
    /// `acquire` runs, so at most one acquisition is in flight and the
    /// others observe its result.
    pub async fn authorize<F, Fut, E>(&self, acquire: F) -> Result<AuthToken, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Into<AcquireError>,
    {
        let mut token = self.token.lock().await;
        if let Some(active) = token.as_ref() {
            return Ok(active.clone());
        }

        if let Some(cached) = self.store.get(&self.scope).await? {
            tracing::debug!(scope = %self.scope, "using cached authorization token");
            *token = Some(cached.clone());
            return Ok(cached);
        }

        tracing::debug!(scope = %self.scope, "no cached token, acquiring");
        let raw = acquire()
            .await
            .map_err(|e| ClientError::AuthAcquisitionFailed(e.into()))?;
        let fresh = AuthToken::new(raw);
        if fresh.is_empty() {
            return Err(ClientError::AuthAcquisitionFailed(
                "credential callback returned an empty token".into(),
            ));
        }

        self.store.set(&self.scope, &fresh).await?;
        *token = Some(fresh.clone());
        tracing::info!(scope = %self.scope, "authorization token acquired");
        Ok(fresh)
    }

    /// The active token, if any.
    pub async fn token(&self) -> Option<AuthToken> {
        self.token.lock().await.clone()
    }

    /// Drop the token from memory and from the store.
    ///
    /// The in-memory token is cleared before the store is touched, so no
    /// request issued after this call starts can pick it up.
    pub async fn invalidate(&self) -> Result<(), ClientError> {
        let mut token = self.token.lock().await;
        let had_token = token.take().is_some();
        self.store.remove(&self.scope).await?;
        if had_token {
            tracing::info!(scope = %self.scope, "authorization token invalidated");
        }
        Ok(())
    }

    /// Log out. Idempotent.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.invalidate().await
    }

    /// The credential scope.
    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    /// The underlying credential store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
