//! Subscriber types for dirty notifications.
//!
//! Every modified value owns a list of listeners that is dispatched,
//! synchronously and in subscription order, whenever the value becomes
//! dirty. Dependency links and external observers (e.g. UI bindings) both
//! subscribe through this list.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Unique identifier for a dirty listener.
///
/// Returned when subscribing and used to unsubscribe again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) type Callback = Arc<dyn Fn() + Send + Sync>;

/// An ordered multicast list of callbacks.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: RwLock<Vec<(SubscriberId, Callback)>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under a fresh ID.
    pub fn subscribe<F>(&self, notify: F) -> SubscriberId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        self.subscribe_with(id, Arc::new(notify));
        id
    }

    /// Register a callback under a caller-chosen ID.
    pub fn subscribe_with(&self, id: SubscriberId, notify: Callback) {
        self.entries.write().push((id, notify));
    }

    /// Returns false if no listener had this ID.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Invoke every listener.
    ///
    /// The list is snapshotted first so listeners may subscribe, unsubscribe
    /// or trigger further notifications without deadlocking.
    pub fn notify(&self) {
        let snapshot: Vec<Callback> = self
            .entries
            .read()
            .iter()
            .map(|(_, notify)| Arc::clone(notify))
            .collect();

        for notify in snapshot {
            notify();
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}
