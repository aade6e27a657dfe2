//! # inbox-types
//!
//! Wire format and data model types for inbox-sync.
//!
//! This crate provides the foundational types used across all inbox-sync crates:
//! - [`Notification`], [`ChangeEvent`] - The inbox data model
//! - [`NotificationId`], [`AuthToken`], [`ScopeKey`] - Identity and credential types
//! - [`ClientMessage`], [`ServerMessage`], [`Notice`] - Push channel frames
//! - [`NotificationList`], [`NotificationEnvelope`] - REST response bodies
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod notification;

pub use error::WireError;
pub use ids::{AuthToken, NotificationId, ScopeKey, SCOPE_KEY_PREFIX};
pub use messages::{
    ClientMessage, Notice, NotificationEnvelope, NotificationList, ServerMessage, ID_QUERY_PARAM,
    NOTIFICATIONS_PATH, NOTIFICATION_PATH,
};
pub use notification::{ChangeEvent, Notification};
