//! Remote echo suppression for inbox-sync.
//!
//! When the client marks a notification read or deletes it, the change is
//! dispatched to subscribers immediately. The server usually pushes the
//! same change back over the channel a moment later. [`EchoFilter`]
//! remembers locally applied changes so the echo can be recognised and
//! dropped instead of being dispatched a second time. A change is only
//! recorded once the server accepted it, so an echo that overtakes the
//! response is delivered like any other remote change.
//!
//! The filter is bounded. When full, the oldest record is evicted; an
//! evicted echo is then delivered again, which is harmless because read
//! and delete are idempotent for subscribers.

use std::collections::{HashMap, VecDeque};

use inbox_types::{Notice, NotificationId};

/// Default number of remembered local changes.
pub const DEFAULT_ECHO_CAPACITY: usize = 256;

/// The kind of locally applied change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalChange {
    /// A successful mark-read call.
    Read,
    /// A successful delete call.
    Deleted,
}

type EchoKey = (LocalChange, NotificationId);

/// Bounded record of local changes awaiting their remote echo.
#[derive(Debug, Clone)]
pub struct EchoFilter {
    capacity: usize,
    /// Insertion order, one entry per recorded change.
    order: VecDeque<EchoKey>,
    /// Outstanding echoes per key.
    pending: HashMap<EchoKey, usize>,
}

impl EchoFilter {
    /// Create a filter remembering at most `capacity` changes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            pending: HashMap::new(),
        }
    }

    /// Record a locally applied change.
    pub fn record(&mut self, change: LocalChange, id: NotificationId) {
        if self.capacity == 0 {
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.release(&oldest);
            }
        }
        let key = (change, id);
        *self.pending.entry(key.clone()).or_insert(0) += 1;
        self.order.push_back(key);
    }

    /// Check a remote notice against the recorded changes.
    ///
    /// Returns `true` if the notice is the echo of a local change; the
    /// matching record is consumed. `Created` notices are never echoes.
    pub fn is_echo(&mut self, notice: &Notice) -> bool {
        match notice {
            Notice::Read(id) => self.consume((LocalChange::Read, id.clone())),
            Notice::Deleted(id) => self.consume((LocalChange::Deleted, id.clone())),
            Notice::Created(_) => false,
        }
    }

    /// Number of outstanding records.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Forget every record.
    pub fn clear(&mut self) {
        self.order.clear();
        self.pending.clear();
    }

    fn consume(&mut self, key: EchoKey) -> bool {
        if !self.pending.contains_key(&key) {
            return false;
        }
        self.release(&key);
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        true
    }

    fn release(&mut self, key: &EchoKey) {
        if let Some(count) = self.pending.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(key);
            }
        }
    }
}

impl Default for EchoFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_CAPACITY)
    }
}
