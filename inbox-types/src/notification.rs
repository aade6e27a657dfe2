//! Notification data model and change events.

use serde::{Deserialize, Serialize};

use crate::NotificationId;

/// A single inbox notification as returned by the REST API.
///
/// Everything except `read` is immutable once created. `read` only
/// ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable identifier.
    pub id: NotificationId,
    /// Human-readable text.
    pub message: String,
    /// Category tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Creation time as sent by the server.
    pub time: String,
    /// Whether the notification has been read.
    #[serde(default)]
    pub read: bool,
    /// Optional structured payload, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl Notification {
    /// Mark the notification as read.
    ///
    /// Returns `true` if this call changed the flag.
    pub fn mark_read(&mut self) -> bool {
        let changed = !self.read;
        self.read = true;
        changed
    }
}

/// A change to the inbox, from a live push or a local mutation.
///
/// Owned by the synchronization core for the duration of fan-out and
/// then discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A notification was created (fully resolved).
    New(Notification),
    /// A notification was marked read.
    Read(NotificationId),
    /// A notification was deleted.
    Deleted(NotificationId),
}

impl ChangeEvent {
    /// The id of the notification this event concerns.
    pub fn id(&self) -> &NotificationId {
        match self {
            ChangeEvent::New(notification) => &notification.id,
            ChangeEvent::Read(id) | ChangeEvent::Deleted(id) => id,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::New(_) => "new",
            ChangeEvent::Read(_) => "read",
            ChangeEvent::Deleted(_) => "deleted",
        }
    }
}
