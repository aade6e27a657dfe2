//! File-backed credential store.
//!
//! One JSON file per scope, named after the scope's SHA-256 digest so the
//! account identifier never appears in a path. Files are written with
//! mode 0600 on Unix.

use super::{CredentialError, CredentialStore};
use async_trait::async_trait;
use inbox_types::{AuthToken, ScopeKey};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// On-disk representation of one cached token.
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    scope: ScopeKey,
    token: AuthToken,
}

/// Credential store persisting tokens in a directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `scope`.
    pub fn entry_path(&self, scope: &ScopeKey) -> PathBuf {
        self.dir.join(format!("{}.json", scope.digest_hex()))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, scope: &ScopeKey) -> Result<Option<AuthToken>, CredentialError> {
        let path = self.entry_path(scope);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CredentialError::Io { path, source }),
        };

        let stored: StoredCredential = serde_json::from_str(&contents)
            .map_err(|source| CredentialError::Corrupt {
                path: path.clone(),
                source,
            })?;

        // A digest collision is not expected, but never hand out another scope's token
        if &stored.scope != scope {
            tracing::warn!(path = %path.display(), "credential entry scope mismatch; ignoring");
            return Ok(None);
        }

        Ok(Some(stored.token))
    }

    async fn set(&self, scope: &ScopeKey, token: &AuthToken) -> Result<(), CredentialError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CredentialError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.entry_path(scope);
        let stored = StoredCredential {
            scope: scope.clone(),
            token: token.clone(),
        };
        let contents = serde_json::to_string(&stored).map_err(|source| CredentialError::Corrupt {
            path: path.clone(),
            source,
        })?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let io_error = |source: std::io::Error| CredentialError::Io {
            path: path.clone(),
            source,
        };
        let mut file = options.open(&path).await.map_err(io_error)?;
        file.write_all(contents.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;

        // The open mode only applies to newly created entries
        set_file_permissions_0600(&path).await
    }

    async fn remove(&self, scope: &ScopeKey) -> Result<(), CredentialError> {
        let path = self.entry_path(scope);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CredentialError::Io { path, source }),
        }
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<(), CredentialError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|source| CredentialError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
