//! # inbox-sync-client
//!
//! Client library for a server-backed notification inbox.
//!
//! This is the main library that applications use to read the inbox and
//! receive live changes.
//!
//! ## Features
//!
//! - **Token lifecycle**: one cached authorization token per account,
//!   acquired on demand and dropped on rejection
//! - **Push channel handshake**: pure state machine from inbox-core, driven
//!   over a pluggable [`Transport`]
//! - **Exactly-once fan-out**: every change reaches each subscriber once,
//!   in order, with local echoes suppressed
//! - **Pluggable collaborators**: REST executor, push transport and
//!   credential store are traits with mock implementations
//!
//! ## Example
//!
//! ```ignore
//! use inbox_sync_client::{InboxClient, InboxConfig, MockApi, MockTransport, MemoryCredentialStore};
//!
//! let config = InboxConfig::new("https://inbox.example.com/api", "user-1842");
//! let client = InboxClient::new(config, MockApi::new(), MockTransport::new(), MemoryCredentialStore::new())?;
//!
//! client.authorize(|| async { Ok::<_, std::io::Error>("token".to_string()) }).await?;
//! client.connect().await?;
//! client.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod channel;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod session;
pub mod subscriber;
pub mod transport;

pub use api::{ApiExecutor, ApiRequest, ApiResponse, Method, MockApi};
#[cfg(feature = "http")]
pub use api::ReqwestExecutor;
pub use channel::{ChannelHandshake, ChannelUpdate};
pub use client::{InboxClient, PollOutcome};
pub use config::{ConfigError, InboxConfig};
pub use credentials::{CredentialError, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{AcquireError, ClientError};
pub use session::SessionManager;
pub use subscriber::{ChannelSubscriber, SharedInbox, Subscriber, SubscriberId, SubscriberRegistry};
pub use transport::{MockTransport, Transport, TransportError};

// Re-export the types applications handle directly
pub use inbox_core::{ChannelState, InboxView};
pub use inbox_types::{AuthToken, ChangeEvent, Notification, NotificationId, ScopeKey};
