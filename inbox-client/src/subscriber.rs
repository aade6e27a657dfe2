//! Change subscribers and the fan-out registry.

use inbox_core::InboxView;
use inbox_types::{ChangeEvent, Notification, NotificationId};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Receives inbox changes.
///
/// Callbacks run on the task that produced the change, while the
/// registry is locked. They must not block and must not call back into
/// the client's subscribe/unsubscribe.
pub trait Subscriber: Send + Sync {
    /// A notification was created.
    fn on_new(&self, notification: &Notification);

    /// A notification was marked read.
    fn on_read(&self, id: &NotificationId);

    /// A notification was deleted.
    fn on_deleted(&self, id: &NotificationId);
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Ordered set of subscribers.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: u64,
    entries: Vec<(SubscriberId, Arc<dyn Subscriber>)>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber`. Subscribers are invoked in registration order.
    pub fn subscribe(&mut self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, subscriber));
        id
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver `event` to every subscriber.
    pub fn dispatch(&self, event: &ChangeEvent) {
        for (_, subscriber) in &self.entries {
            match event {
                ChangeEvent::New(notification) => subscriber.on_new(notification),
                ChangeEvent::Read(id) => subscriber.on_read(id),
                ChangeEvent::Deleted(id) => subscriber.on_deleted(id),
            }
        }
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.entries.len())
            .finish()
    }
}

/// Subscriber forwarding every change into an unbounded channel.
///
/// Useful when changes should be consumed on another task.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

impl ChannelSubscriber {
    /// Create a subscriber plus the receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChangeEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: ChangeEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("change receiver dropped");
        }
    }
}

impl Subscriber for ChannelSubscriber {
    fn on_new(&self, notification: &Notification) {
        self.forward(ChangeEvent::New(notification.clone()));
    }

    fn on_read(&self, id: &NotificationId) {
        self.forward(ChangeEvent::Read(id.clone()));
    }

    fn on_deleted(&self, id: &NotificationId) {
        self.forward(ChangeEvent::Deleted(id.clone()));
    }
}

/// Subscriber keeping an [`InboxView`] current.
///
/// Clones share the same view.
#[derive(Debug, Clone, Default)]
pub struct SharedInbox {
    view: Arc<Mutex<InboxView>>,
}

impl SharedInbox {
    /// Create an empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a server snapshot.
    pub fn hydrate(&self, snapshot: Vec<Notification>) {
        self.lock().hydrate(snapshot);
    }

    /// Copy of the current view.
    pub fn snapshot(&self) -> InboxView {
        self.lock().clone()
    }

    /// Number of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.lock().unread_count()
    }

    fn apply(&self, event: ChangeEvent) {
        let changed = self.lock().apply(&event);
        if !changed {
            tracing::debug!(kind = event.kind(), id = %event.id(), "change already applied");
        }
    }

    fn lock(&self) -> MutexGuard<'_, InboxView> {
        // A panicking subscriber elsewhere must not wedge the view
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Subscriber for SharedInbox {
    fn on_new(&self, notification: &Notification) {
        self.apply(ChangeEvent::New(notification.clone()));
    }

    fn on_read(&self, id: &NotificationId) {
        self.apply(ChangeEvent::Read(id.clone()));
    }

    fn on_deleted(&self, id: &NotificationId) {
        self.apply(ChangeEvent::Deleted(id.clone()));
    }
}
