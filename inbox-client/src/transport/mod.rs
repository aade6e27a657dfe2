//! Push channel transport abstraction for inbox-sync.
//!
//! This module provides a pluggable transport layer that abstracts the
//! bidirectional event stream the server pushes inbox changes over
//! (a WebSocket in production, a mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` opens the stream
//! - `send()` transmits one JSON frame
//! - `recv()` receives one JSON frame
//! - `close()` tears the stream down
//!
//! Frame encoding and the handshake live in [`crate::channel`]; a
//! transport only moves bytes.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.connect("wss://inbox.example.com/socket").await?;
//! transport.send(auth_frame).await?;
//! let verdict = transport.recv().await?;
//! ```

mod mock;

pub use mock::MockTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors, shared by the push channel and the REST executor.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// A REST request could not be completed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Connection timeout.
    #[error("connection timeout")]
    Timeout,
}

/// Transport trait for the push channel.
///
/// Implementations handle the underlying connection mechanism
/// (WebSocket, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the channel at the given address.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send one frame.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receive one frame.
    ///
    /// Blocks until a frame is available or the channel closes.
    async fn recv(&self) -> Result<Vec<u8>, TransportError>;

    /// Check if currently open.
    fn is_connected(&self) -> bool;

    /// Close the channel.
    async fn close(&self) -> Result<(), TransportError>;
}
