//! Configuration for the inbox client.
//!
//! Built in code with [`InboxConfig::new`] and the `with_*` methods, or
//! loaded from a TOML file:
//!
//! ```toml
//! base_url = "https://inbox.example.com/api"
//! channel_url = "wss://inbox.example.com/socket"
//! account = "user-1842"
//! request_timeout_secs = 15
//! suppress_remote_echo = true
//! echo_capacity = 256
//! ```

use inbox_core::DEFAULT_ECHO_CAPACITY;
use inbox_types::ScopeKey;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for [`InboxClient`](crate::InboxClient).
#[derive(Debug, Clone, Deserialize)]
pub struct InboxConfig {
    /// Base URL of the REST API.
    pub base_url: String,
    /// Push channel address (defaults to `base_url`).
    #[serde(default)]
    pub channel_url: Option<String>,
    /// Account or session identifier the cached token is scoped to.
    pub account: String,
    /// Per-request timeout for the REST adapter (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Drop remote echoes of local mutations (default: true).
    #[serde(default = "default_suppress_remote_echo")]
    pub suppress_remote_echo: bool,
    /// How many local mutations to remember for echo suppression (default: 256).
    #[serde(default = "default_echo_capacity")]
    pub echo_capacity: usize,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_suppress_remote_echo() -> bool {
    true
}

fn default_echo_capacity() -> usize {
    DEFAULT_ECHO_CAPACITY
}

impl InboxConfig {
    /// Create a configuration with defaults for everything but the endpoint and account.
    pub fn new(base_url: &str, account: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            channel_url: None,
            account: account.to_string(),
            request_timeout_secs: default_request_timeout_secs(),
            suppress_remote_echo: default_suppress_remote_echo(),
            echo_capacity: default_echo_capacity(),
        }
    }

    /// Use a separate push channel address.
    pub fn with_channel_url(mut self, url: &str) -> Self {
        self.channel_url = Some(url.to_string());
        self
    }

    /// Set the REST request timeout.
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Enable or disable remote echo suppression.
    pub fn with_echo_suppression(mut self, enabled: bool) -> Self {
        self.suppress_remote_echo = enabled;
        self
    }

    /// Set the echo suppression capacity.
    pub fn with_echo_capacity(mut self, capacity: usize) -> Self {
        self.echo_capacity = capacity;
        self
    }

    /// Address the push channel connects to.
    pub fn channel_address(&self) -> &str {
        self.channel_url.as_deref().unwrap_or(&self.base_url)
    }

    /// REST request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Credential scope for the configured account.
    pub fn scope_key(&self) -> Result<ScopeKey, ConfigError> {
        ScopeKey::for_account(&self.account).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check the configuration for obvious mistakes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        self.scope_key().map(|_| ())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Configuration values are invalid.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_has_defaults() {
        let config = InboxConfig::new("https://inbox.test", "alice");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.suppress_remote_echo);
        assert_eq!(config.echo_capacity, DEFAULT_ECHO_CAPACITY);
        assert_eq!(config.channel_address(), "https://inbox.test");
        config.validate().unwrap();
    }

    #[test]
    fn config_builder_pattern() {
        let config = InboxConfig::new("https://inbox.test", "alice")
            .with_channel_url("wss://push.inbox.test")
            .with_request_timeout_secs(5)
            .with_echo_suppression(false)
            .with_echo_capacity(8);

        assert_eq!(config.channel_address(), "wss://push.inbox.test");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(!config.suppress_remote_echo);
        assert_eq!(config.echo_capacity, 8);
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
base_url = "https://inbox.test/api"
channel_url = "wss://inbox.test/socket"
account = "user-7"
request_timeout_secs = 10
suppress_remote_echo = false
"#;

        let config: InboxConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.base_url, "https://inbox.test/api");
        assert_eq!(config.channel_address(), "wss://inbox.test/socket");
        assert_eq!(config.request_timeout_secs, 10);
        assert!(!config.suppress_remote_echo);
        assert_eq!(config.echo_capacity, DEFAULT_ECHO_CAPACITY);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let toml = r#"
base_url = "https://inbox.test"
account = "user-7"
"#;
        let config: InboxConfig = toml::from_str(toml).unwrap();
        assert!(config.channel_url.is_none());
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.suppress_remote_echo);
    }

    #[test]
    fn scope_key_follows_account() {
        let config = InboxConfig::new("https://inbox.test", "user-7");
        assert_eq!(
            config.scope_key().unwrap(),
            ScopeKey::for_account("user-7").unwrap()
        );
    }

    #[test]
    fn blank_account_is_invalid() {
        let config = InboxConfig::new("https://inbox.test", " ");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config = InboxConfig::new("https://inbox.test", "a").with_request_timeout_secs(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn from_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.toml");
        std::fs::write(&path, "base_url = \"https://inbox.test\"\naccount = \"a\"\n").unwrap();

        let config = InboxConfig::from_file(&path).unwrap();
        assert_eq!(config.account, "a");

        std::fs::write(&path, "base_url = \"https://inbox.test\"\naccount = \"\"\n").unwrap();
        assert!(matches!(
            InboxConfig::from_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn from_file_reports_missing_file() {
        let result = InboxConfig::from_file(std::path::Path::new("/nonexistent/inbox.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
