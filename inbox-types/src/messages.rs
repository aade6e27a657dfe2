//! Push channel frames and REST response envelopes.
//!
//! Push channel frames are JSON objects of the form
//! `{"event": "<name>", "data": <payload>}`. Frames without a payload
//! omit `data`.

use serde::{Deserialize, Serialize};

use crate::{AuthToken, Notification, NotificationId, WireError};

/// REST path returning the full inbox snapshot.
pub const NOTIFICATIONS_PATH: &str = "/notifications";

/// REST path addressing a single notification (`?id=<id>`).
pub const NOTIFICATION_PATH: &str = "/notification";

/// Query parameter carrying the notification id.
pub const ID_QUERY_PARAM: &str = "id";

/// Frames sent by the client over the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Authentication request carrying the token.
    Auth(AuthToken),
}

impl ClientMessage {
    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        serde_json::to_vec(self).map_err(WireError::Serialization)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        serde_json::from_slice(bytes).map_err(WireError::Deserialization)
    }
}

/// Frames sent by the server over the push channel.
///
/// The older event names (`deny`, `push`, `patch`, `delete`) are
/// accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerMessage {
    /// The token was rejected.
    #[serde(alias = "deny")]
    Denied,
    /// The token was accepted.
    Authorized,
    /// A notification was created; carries only its id.
    #[serde(alias = "push")]
    Created(NotificationId),
    /// A notification was marked read.
    #[serde(alias = "patch")]
    Read(NotificationId),
    /// A notification was deleted.
    #[serde(alias = "delete")]
    Deleted(NotificationId),
}

impl ServerMessage {
    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        serde_json::to_vec(self).map_err(WireError::Serialization)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        serde_json::from_slice(bytes).map_err(WireError::Deserialization)
    }

    /// The change notice carried by this frame, if any.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            ServerMessage::Created(id) => Some(Notice::Created(id.clone())),
            ServerMessage::Read(id) => Some(Notice::Read(id.clone())),
            ServerMessage::Deleted(id) => Some(Notice::Deleted(id.clone())),
            ServerMessage::Denied | ServerMessage::Authorized => None,
        }
    }
}

/// A raw change notice received over the push channel.
///
/// `Created` is a pointer: the notification itself has to be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Notice {
    /// A notification with this id was created.
    Created(NotificationId),
    /// A notification with this id was marked read.
    Read(NotificationId),
    /// A notification with this id was deleted.
    Deleted(NotificationId),
}

impl Notice {
    /// The id this notice refers to.
    pub fn id(&self) -> &NotificationId {
        match self {
            Notice::Created(id) | Notice::Read(id) | Notice::Deleted(id) => id,
        }
    }
}

/// Body of `GET /notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationList {
    /// Current inbox snapshot.
    pub notifications: Vec<Notification>,
}

/// Body of `GET /notification?id=<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    /// The requested notification.
    pub notification: Notification,
}
