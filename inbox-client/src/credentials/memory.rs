//! In-memory credential store.

use super::{CredentialError, CredentialStore};
use async_trait::async_trait;
use dashmap::DashMap;
use inbox_types::{AuthToken, ScopeKey};
use std::sync::Arc;

/// Process-local credential store.
///
/// Clones share the same map, so several sessions (or a test and the
/// client under test) can observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    entries: Arc<DashMap<ScopeKey, AuthToken>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no token is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, scope: &ScopeKey) -> Result<Option<AuthToken>, CredentialError> {
        Ok(self.entries.get(scope).map(|entry| entry.value().clone()))
    }

    async fn set(&self, scope: &ScopeKey, token: &AuthToken) -> Result<(), CredentialError> {
        self.entries.insert(scope.clone(), token.clone());
        Ok(())
    }

    async fn remove(&self, scope: &ScopeKey) -> Result<(), CredentialError> {
        self.entries.remove(scope);
        Ok(())
    }
}
