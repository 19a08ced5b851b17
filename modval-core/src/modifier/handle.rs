//! Modifier Implementation
//!
//! A modifier is an operation plus the metadata that decides where it runs
//! in the layered fold: `layer`, `priority` and `order`, and whether it is
//! `active` at all.
//!
//! # Sharing
//!
//! Modifiers are created independently of any value and the same modifier
//! may be attached to many values at once. Each value the modifier is
//! attached to registers itself as a host; the modifier only keeps weak
//! references to its hosts, which it uses as notification channels:
//!
//! - any metadata or operation change marks every host dirty
//! - [`Modifier::detach_from_all`] asks every host to drop the modifier

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::value::{ModifiedValue, NodeId, NodeInner};
use crate::Element;

use super::op::{self, Operation};

/// Unique identifier for a modifier. Modifiers compare by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifierId(u64);

impl ModifierId {
    /// Generate a new unique modifier ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ModifierId {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of a modifier's placement metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierMeta {
    /// Within a layer, only the modifiers at the highest priority apply.
    pub priority: i32,
    /// Lower layers fully resolve before higher layers see their output.
    pub layer: i32,
    /// Sequencing among modifiers of the same layer and priority.
    pub order: i32,
    pub active: bool,
}

impl Default for ModifierMeta {
    fn default() -> Self {
        Self {
            priority: 0,
            layer: 0,
            order: 0,
            active: true,
        }
    }
}

struct ModifierInner<T: Element> {
    id: ModifierId,
    operation: RwLock<Arc<dyn Operation<T>>>,
    meta: RwLock<ModifierMeta>,
    hosts: Mutex<IndexMap<NodeId, Weak<NodeInner<T>>>>,
}

/// A shareable operation on modified values of type `T`.
///
/// Cloning the handle shares the modifier. Use [`Modifier::copy`] for an
/// independent duplicate.
pub struct Modifier<T: Element> {
    inner: Arc<ModifierInner<T>>,
}

impl<T: Element> Modifier<T> {
    /// Create a modifier from a full three-input operation.
    pub fn new<F>(operation: F) -> Self
    where
        F: Fn(&T, &T, &T) -> T + Send + Sync + 'static,
    {
        Self::from_operation(operation)
    }

    pub fn from_operation<O>(operation: O) -> Self
    where
        O: Operation<T> + 'static,
    {
        Self::with_parts(Arc::new(operation), ModifierMeta::default())
    }

    fn with_parts(operation: Arc<dyn Operation<T>>, meta: ModifierMeta) -> Self {
        Self {
            inner: Arc::new(ModifierInner {
                id: ModifierId::new(),
                operation: RwLock::new(operation),
                meta: RwLock::new(meta),
                hosts: Mutex::new(IndexMap::new()),
            }),
        }
    }

    /// A modifier that leaves the base value through.
    pub fn passthrough() -> Self {
        Self::new(op::passthrough::<T>)
    }

    /// Computed from the base value only.
    pub fn from_base<F>(f: F) -> Self
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        Self::new(move |base, _, _| f(base))
    }

    /// Computed from the value at the start of the layer only.
    pub fn from_layer_start<F>(f: F) -> Self
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        Self::new(move |_, layer_start, _| f(layer_start))
    }

    /// Computed from the running value only.
    pub fn from_latest<F>(f: F) -> Self
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        Self::new(move |_, _, latest| f(latest))
    }

    pub fn from_base_and_layer_start<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> T + Send + Sync + 'static,
    {
        Self::new(move |base, layer_start, _| f(base, layer_start))
    }

    pub fn from_base_and_latest<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> T + Send + Sync + 'static,
    {
        Self::new(move |base, _, latest| f(base, latest))
    }

    pub fn from_layer_start_and_latest<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> T + Send + Sync + 'static,
    {
        Self::new(move |_, layer_start, latest| f(layer_start, latest))
    }

    /// Ignores all inputs.
    pub fn from_ignored<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(move |_, _, _| f())
    }

    pub fn with_priority(self, priority: i32) -> Self {
        self.set_priority(priority);
        self
    }

    pub fn with_layer(self, layer: i32) -> Self {
        self.set_layer(layer);
        self
    }

    pub fn with_order(self, order: i32) -> Self {
        self.set_order(order);
        self
    }

    pub fn with_active(self, active: bool) -> Self {
        self.set_active(active);
        self
    }

    /// Get the modifier's unique ID.
    pub fn id(&self) -> ModifierId {
        self.inner.id
    }

    pub fn meta(&self) -> ModifierMeta {
        *self.inner.meta.read()
    }

    pub fn priority(&self) -> i32 {
        self.inner.meta.read().priority
    }

    pub fn layer(&self) -> i32 {
        self.inner.meta.read().layer
    }

    pub fn order(&self) -> i32 {
        self.inner.meta.read().order
    }

    pub fn is_active(&self) -> bool {
        self.inner.meta.read().active
    }

    pub fn set_priority(&self, priority: i32) {
        self.update_meta(|meta| meta.priority = priority);
    }

    pub fn set_layer(&self, layer: i32) {
        self.update_meta(|meta| meta.layer = layer);
    }

    pub fn set_order(&self, order: i32) {
        self.update_meta(|meta| meta.order = order);
    }

    /// Switch the modifier on or off without detaching it.
    pub fn set_active(&self, active: bool) {
        self.update_meta(|meta| meta.active = active);
    }

    /// Replace the operation.
    pub fn set_operation<O>(&self, operation: O)
    where
        O: Operation<T> + 'static,
    {
        *self.inner.operation.write() = Arc::new(operation);
        self.notify_changed();
    }

    fn update_meta(&self, update: impl FnOnce(&mut ModifierMeta)) {
        update(&mut *self.inner.meta.write());
        self.notify_changed();
    }

    /// Run the operation.
    pub fn apply(&self, base: &T, layer_start: &T, latest: &T) -> T {
        let operation = self.inner.operation.read().clone();
        operation.apply(base, layer_start, latest)
    }

    /// An unattached modifier with the same operation and metadata.
    pub fn copy(&self) -> Self {
        let operation = self.inner.operation.read().clone();
        Self::with_parts(operation, self.meta())
    }

    /// Detach from one value. Returns false if not attached to it.
    pub fn detach_from(&self, value: &ModifiedValue<T>) -> bool {
        value.detach(self)
    }

    /// Detach from every value this modifier is attached to.
    ///
    /// Returns the number of values it was detached from.
    pub fn detach_from_all(&self) -> usize {
        let mut detached = 0;
        for host in self.live_hosts() {
            if host.release(self.inner.id) {
                detached += 1;
            }
        }
        detached
    }

    /// The values this modifier is attached to, in attachment order.
    pub fn attached_values(&self) -> Vec<ModifiedValue<T>> {
        self.live_hosts()
            .into_iter()
            .map(ModifiedValue::from_inner)
            .collect()
    }

    pub fn attached_count(&self) -> usize {
        self.inner
            .hosts
            .lock()
            .values()
            .filter(|host| host.strong_count() > 0)
            .count()
    }

    pub fn is_attached_to(&self, value: &ModifiedValue<T>) -> bool {
        value.contains(self)
    }

    pub(crate) fn register_host(&self, node: NodeId, host: Weak<NodeInner<T>>) {
        self.inner.hosts.lock().insert(node, host);
    }

    pub(crate) fn unregister_host(&self, node: NodeId) -> bool {
        self.inner.hosts.lock().shift_remove(&node).is_some()
    }

    /// Snapshot of the hosts that are still alive. The lock is released
    /// before the caller talks to them.
    fn live_hosts(&self) -> Vec<Arc<NodeInner<T>>> {
        self.inner
            .hosts
            .lock()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Mark every host dirty.
    fn notify_changed(&self) {
        let hosts = self.live_hosts();
        trace!(modifier = ?self.inner.id, hosts = hosts.len(), "modifier changed");
        for host in hosts {
            host.set_dirty();
        }
    }
}

impl<T: Element> Clone for Modifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Element> PartialEq for Modifier<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T: Element> Eq for Modifier<T> {}

impl<T: Element> Hash for Modifier<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<T: Element> fmt::Debug for Modifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("id", &self.inner.id)
            .field("meta", &self.meta())
            .field("attached_count", &self.attached_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
