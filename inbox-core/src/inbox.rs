//! Local inbox view for inbox-sync.
//!
//! A subscriber-side projection of the inbox: hydrated once from the
//! list snapshot, then kept current by applying change events. It is a
//! convenience for consumers, not a store of record.

use inbox_types::{ChangeEvent, Notification, NotificationId};

/// Ordered projection of the inbox.
///
/// Snapshot entries keep server order; notifications arriving later are
/// placed in front. Applying the same event twice has no further effect.
#[derive(Debug, Clone, Default)]
pub struct InboxView {
    notifications: Vec<Notification>,
}

impl InboxView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a server snapshot.
    pub fn hydrate(&mut self, snapshot: Vec<Notification>) {
        self.notifications = snapshot;
    }

    /// Apply a change event.
    ///
    /// Returns `true` if the view changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        match event {
            ChangeEvent::New(notification) => {
                if self.position(&notification.id).is_some() {
                    return false;
                }
                self.notifications.insert(0, notification.clone());
                true
            }
            ChangeEvent::Read(id) => match self.position(id) {
                Some(index) => self.notifications[index].mark_read(),
                None => false,
            },
            ChangeEvent::Deleted(id) => match self.position(id) {
                Some(index) => {
                    self.notifications.remove(index);
                    true
                }
                None => false,
            },
        }
    }

    /// Look up a notification by id.
    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| &n.id == id)
    }

    /// All notifications in view order.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Number of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Number of notifications.
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    /// Check if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    fn position(&self, id: &NotificationId) -> Option<usize> {
        self.notifications.iter().position(|n| &n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: &str, read: bool) -> Notification {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "message": format!("message {id}"),
            "type": "info",
            "time": "2024-01-01T00:00:00Z",
            "read": read,
        }))
        .unwrap()
    }

    fn hydrated() -> InboxView {
        let mut view = InboxView::new();
        view.hydrate(vec![notification("a", false), notification("b", true)]);
        view
    }

    #[test]
    fn hydrate_keeps_server_order() {
        let view = hydrated();
        let ids: Vec<_> = view.notifications().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(view.unread_count(), 1);
    }

    #[test]
    fn new_notification_goes_in_front() {
        let mut view = hydrated();
        assert!(view.apply(&ChangeEvent::New(notification("c", false))));

        assert_eq!(view.notifications()[0].id.as_str(), "c");
        assert_eq!(view.len(), 3);
        assert_eq!(view.unread_count(), 2);
    }

    #[test]
    fn duplicate_new_is_ignored() {
        let mut view = hydrated();
        assert!(!view.apply(&ChangeEvent::New(notification("a", false))));
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn read_is_idempotent() {
        let mut view = hydrated();
        let id = NotificationId::from("a");

        assert!(view.apply(&ChangeEvent::Read(id.clone())));
        assert!(!view.apply(&ChangeEvent::Read(id.clone())));
        assert!(view.get(&id).unwrap().read);
        assert_eq!(view.unread_count(), 0);
    }

    #[test]
    fn delete_removes_and_is_idempotent() {
        let mut view = hydrated();
        let id = NotificationId::from("b");

        assert!(view.apply(&ChangeEvent::Deleted(id.clone())));
        assert!(!view.apply(&ChangeEvent::Deleted(id.clone())));
        assert!(view.get(&id).is_none());
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn events_for_unknown_ids_are_noops() {
        let mut view = InboxView::new();
        assert!(!view.apply(&ChangeEvent::Read("zz".into())));
        assert!(!view.apply(&ChangeEvent::Deleted("zz".into())));
        assert!(view.is_empty());
    }
}
