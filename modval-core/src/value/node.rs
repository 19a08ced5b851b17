//! Modified Value Implementation
//!
//! A modified value is a base value plus a set of attached modifiers. Its
//! computed value is cached and recomputed only when it is read while dirty.
//!
//! # How Reads Work
//!
//! 1. The base value is evaluated and compared with the base seen on the
//!    previous read. A difference marks the value dirty (and notifies).
//!
//! 2. If the value is dirty, or configured to update every time, the active
//!    modifiers are folded over the base (see [`crate::fold`]) and the result
//!    is cached.
//!
//! 3. The cached value is returned.
//!
//! # Locking
//!
//! State lives behind `parking_lot` locks so handles are `Send + Sync`, but
//! no lock is held while user code runs: base getters, modifier operations
//! and dirty listeners may freely read or mutate other values (or this one).

use std::fmt::{self, Debug, Display};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::fold;
use crate::modifier::{Modifier, ModifierId};
use crate::Element;

use super::context::DirtyScope;
use super::dependency::{self, Dependency, Link};
use super::source::{BaseValue, BaseValueSource};
use super::subscriber::{Callback, Listeners, SubscriberId};

/// Unique identifier for a modified value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the cached value can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// The cached value is up-to-date.
    Clean,

    /// The value must be recomputed on the next read.
    Dirty,
}

/// Re-dispatches allowed when listeners dirty the value they observe.
const MAX_RENOTIFY: usize = 32;

/// Cached result and drift tracking.
struct Memo<T> {
    cached: T,
    previous_base: T,
    dirty: bool,
    /// Bumped on every invalidation, so a fold that raced with one does not
    /// mark the value clean.
    version: u64,
}

/// Shared state behind a [`ModifiedValue`] handle.
pub(crate) struct NodeInner<T: Element> {
    id: NodeId,
    weak_self: Weak<NodeInner<T>>,
    base: RwLock<BaseValue<T>>,
    memo: Mutex<Memo<T>>,
    update_every_time: AtomicBool,
    /// Set when the value was dirtied while already dispatching; the outer
    /// dispatch notifies again.
    renotify: AtomicBool,
    /// Insertion ordered: the attachment sequence breaks order ties.
    modifiers: RwLock<IndexMap<ModifierId, Modifier<T>>>,
    dependencies: RwLock<IndexMap<NodeId, Link>>,
    on_dirty: Listeners,
}

impl<T: Element> NodeInner<T> {
    fn new(base: BaseValue<T>, initial: T) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            id: NodeId::new(),
            weak_self: weak_self.clone(),
            base: RwLock::new(base),
            memo: Mutex::new(Memo {
                cached: initial.clone(),
                previous_base: initial,
                dirty: true,
                version: 0,
            }),
            update_every_time: AtomicBool::new(false),
            renotify: AtomicBool::new(false),
            modifiers: RwLock::new(IndexMap::new()),
            dependencies: RwLock::new(IndexMap::new()),
            on_dirty: Listeners::new(),
        })
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    fn base_value(&self) -> T {
        let source = match &*self.base.read() {
            BaseValue::Stored(value) => return value.clone(),
            BaseValue::Source(source) => Arc::clone(source),
        };
        source.evaluate()
    }

    fn active_modifiers(&self) -> Vec<Modifier<T>> {
        self.modifiers
            .read()
            .values()
            .filter(|m| m.is_active())
            .cloned()
            .collect()
    }

    /// Mark the value dirty and notify listeners.
    pub(crate) fn set_dirty(&self) {
        {
            let mut memo = self.memo.lock();
            memo.dirty = true;
            memo.version = memo.version.wrapping_add(1);
        }

        let Some(_scope) = DirtyScope::enter(self.id) else {
            trace!(node = ?self.id, "deferred re-entrant dirty notification");
            self.renotify.store(true, Ordering::Release);
            return;
        };

        trace!(node = ?self.id, depth = DirtyScope::depth(), "value became dirty");
        let mut rounds = 0;
        loop {
            self.on_dirty.notify();
            if !self.renotify.swap(false, Ordering::AcqRel) {
                break;
            }
            rounds += 1;
            if rounds > MAX_RENOTIFY {
                warn!(node = ?self.id, rounds, "dirty listeners keep re-dirtying their value");
                break;
            }
        }
    }

    /// Remove a modifier by ID. Returns false if it was not attached.
    pub(crate) fn release(&self, id: ModifierId) -> bool {
        let removed = self.modifiers.write().shift_remove(&id);
        match removed {
            Some(modifier) => {
                modifier.unregister_host(self.id);
                debug!(node = ?self.id, modifier = ?id, "detached modifier");
                self.set_dirty();
                true
            }
            None => false,
        }
    }

    /// Subscribe to `upstream` without checking for cycles.
    fn link(&self, upstream: Arc<dyn Dependency>) -> bool {
        let upstream_id = upstream.node_id();
        if self.dependencies.read().contains_key(&upstream_id) {
            return false;
        }

        let downstream = self.weak_self.clone();
        let notify: Callback = Arc::new(move || {
            if let Some(node) = downstream.upgrade() {
                node.set_dirty();
            }
        });

        let link = Link::connect(upstream, notify);
        self.dependencies.write().insert(upstream_id, link);
        debug!(node = ?self.id, dependency = ?upstream_id, "linked dependency");
        true
    }
}

impl<T: Element> Dependency for NodeInner<T> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn subscribe_dirty(&self, id: SubscriberId, notify: Callback) {
        self.on_dirty.subscribe_with(id, notify);
    }

    fn unsubscribe_dirty(&self, id: SubscriberId) -> bool {
        self.on_dirty.unsubscribe(id)
    }

    fn upstream(&self) -> Vec<Arc<dyn Dependency>> {
        self.dependencies
            .read()
            .values()
            .map(|link| Arc::clone(&link.node))
            .collect()
    }
}

impl<T: Element> Drop for NodeInner<T> {
    fn drop(&mut self) {
        for link in self.dependencies.get_mut().values() {
            link.disconnect();
        }
        for modifier in self.modifiers.get_mut().values() {
            modifier.unregister_host(self.id);
        }
    }
}

/// A value computed from a base value and a stack of modifiers.
///
/// # Type Parameters
///
/// - `T`: The element type. See [`Element`].
///
/// Cloning the handle shares the value; it does not copy it.
///
/// # Example
///
/// ```rust
/// use modval_core::modifier::templates;
/// use modval_core::value::ModifiedValue;
///
/// let strength = ModifiedValue::new(10);
/// let bonus = strength.modify(templates::add(5));
/// strength.attach(&templates::mul(2));
///
/// assert_eq!(strength.value(), 30);
///
/// strength.detach(&bonus);
/// assert_eq!(strength.value(), 20);
/// ```
pub struct ModifiedValue<T: Element> {
    inner: Arc<NodeInner<T>>,
}

impl<T: Element> ModifiedValue<T> {
    /// Create a value with a stored base value.
    pub fn new(base: T) -> Self {
        Self {
            inner: NodeInner::new(BaseValue::Stored(base.clone()), base),
        }
    }

    /// Create a value whose base is evaluated from `source` on every read.
    pub fn from_source<S>(source: S) -> Self
    where
        S: BaseValueSource<T> + 'static,
    {
        let initial = source.evaluate();
        Self {
            inner: NodeInner::new(BaseValue::Source(Arc::new(source)), initial),
        }
    }

    /// Create a getter-backed value that is also linked to `dependency`, so
    /// it becomes dirty as soon as `dependency` does.
    pub fn derived<S, U>(source: S, dependency: &ModifiedValue<U>) -> Self
    where
        S: BaseValueSource<T> + 'static,
        U: Element,
    {
        let value = Self::from_source(source);
        // A fresh value has no dependents, so this link cannot close a cycle.
        value.inner.link(dependency.inner.clone());
        value
    }

    /// Create a value whose base is the computed value of `other`.
    pub fn following(other: &ModifiedValue<T>) -> Self {
        Self::derived(other.clone(), other)
    }

    pub(crate) fn from_inner(inner: Arc<NodeInner<T>>) -> Self {
        Self { inner }
    }

    /// Recompute on every read, regardless of the dirty flag.
    pub fn with_update_every_time(self, update_every_time: bool) -> Self {
        self.set_update_every_time(update_every_time);
        self
    }

    pub fn set_update_every_time(&self, update_every_time: bool) {
        self.inner
            .update_every_time
            .store(update_every_time, Ordering::Relaxed);
    }

    pub fn updates_every_time(&self) -> bool {
        self.inner.update_every_time.load(Ordering::Relaxed)
    }

    /// Get the value's unique ID.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Get the computed value, recomputing if necessary.
    pub fn value(&self) -> T {
        let inner = &self.inner;
        let base = inner.base_value();

        let drifted = {
            let mut memo = inner.memo.lock();
            if memo.previous_base != base {
                memo.previous_base = base.clone();
                true
            } else {
                false
            }
        };
        if drifted {
            trace!(node = ?inner.id, "base value drifted");
            inner.set_dirty();
        }

        let (dirty, version) = {
            let memo = inner.memo.lock();
            (memo.dirty, memo.version)
        };
        if !dirty && !self.updates_every_time() {
            return inner.memo.lock().cached.clone();
        }

        let active = inner.active_modifiers();
        let computed = fold::fold_layers(&base, &active, None);
        trace!(node = ?inner.id, modifiers = active.len(), "recomputed value");

        let mut memo = inner.memo.lock();
        memo.cached = computed.clone();
        if memo.version == version {
            memo.dirty = false;
        }
        computed
    }

    /// The cached value, without checking whether it is stale.
    pub fn dirty_value(&self) -> T {
        self.inner.memo.lock().cached.clone()
    }

    /// The value computed with only the modifiers in layers up to and
    /// including `layer`. Does not touch the cache.
    pub fn value_up_to_layer(&self, layer: i32) -> T {
        let base = self.inner.base_value();
        fold::fold_layers(&base, &self.inner.active_modifiers(), Some(layer))
    }

    /// Get the current base value.
    pub fn base_value(&self) -> T {
        self.inner.base_value()
    }

    /// Replace the base with a stored value.
    pub fn set_base_value(&self, base: T) {
        *self.inner.base.write() = BaseValue::Stored(base);
        self.inner.set_dirty();
    }

    /// Replace the base with a getter.
    pub fn set_base_value_source<S>(&self, source: S)
    where
        S: BaseValueSource<T> + 'static,
    {
        *self.inner.base.write() = BaseValue::Source(Arc::new(source));
        self.inner.set_dirty();
    }

    /// Whether the base is a stored value rather than a getter.
    pub fn uses_stored_base(&self) -> bool {
        self.inner.base.read().is_stored()
    }

    /// Get the current dirty state.
    pub fn state(&self) -> DirtyState {
        if self.inner.memo.lock().dirty {
            DirtyState::Dirty
        } else {
            DirtyState::Clean
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state() == DirtyState::Dirty
    }

    /// Force a recompute on the next read and notify listeners.
    ///
    /// Useful when an impure operation's external inputs changed.
    pub fn set_dirty(&self) {
        self.inner.set_dirty();
    }

    /// Attach a modifier.
    ///
    /// Returns false if this exact modifier is already attached.
    pub fn attach(&self, modifier: &Modifier<T>) -> bool {
        {
            let mut modifiers = self.inner.modifiers.write();
            if modifiers.contains_key(&modifier.id()) {
                return false;
            }
            modifiers.insert(modifier.id(), modifier.clone());
        }

        modifier.register_host(self.inner.id, Arc::downgrade(&self.inner));
        debug!(node = ?self.inner.id, modifier = ?modifier.id(), "attached modifier");
        self.inner.set_dirty();
        true
    }

    /// Attach `modifier` and return its handle.
    pub fn modify(&self, modifier: Modifier<T>) -> Modifier<T> {
        self.attach(&modifier);
        modifier
    }

    /// Attach a modifier whose operation reads `source`, and link `source`
    /// as a dependency so changes to it invalidate this value immediately.
    ///
    /// Returns whether the modifier was newly attached. The modifier is not
    /// attached if the link would close a cycle.
    pub fn attach_with_dependency<U: Element>(
        &self,
        modifier: &Modifier<T>,
        source: &ModifiedValue<U>,
    ) -> Result<bool> {
        self.add_dependency(source)?;
        Ok(self.attach(modifier))
    }

    /// Detach a modifier.
    ///
    /// Returns false if it was not attached.
    pub fn detach(&self, modifier: &Modifier<T>) -> bool {
        self.inner.release(modifier.id())
    }

    /// Detach every modifier. Returns true if at least one was detached.
    pub fn detach_all(&self) -> bool {
        self.detach_where(|_| true)
    }

    /// Detach every modifier matching `condition`.
    ///
    /// Returns true if at least one was detached.
    pub fn detach_where<F>(&self, mut condition: F) -> bool
    where
        F: FnMut(&Modifier<T>) -> bool,
    {
        let matching: Vec<Modifier<T>> = self
            .modifiers()
            .into_iter()
            .filter(|m| condition(m))
            .collect();

        let mut detached_any = false;
        for modifier in matching {
            detached_any |= self.detach(&modifier);
        }
        detached_any
    }

    /// Whether this exact modifier is attached.
    pub fn contains(&self, modifier: &Modifier<T>) -> bool {
        self.inner.modifiers.read().contains_key(&modifier.id())
    }

    /// All attached modifiers, in attachment order.
    pub fn modifiers(&self) -> Vec<Modifier<T>> {
        self.inner.modifiers.read().values().cloned().collect()
    }

    /// Attached modifiers that take part in the computation.
    pub fn active_modifiers(&self) -> Vec<Modifier<T>> {
        self.inner.active_modifiers()
    }

    /// Attached modifiers that are switched off.
    pub fn inactive_modifiers(&self) -> Vec<Modifier<T>> {
        self.inner
            .modifiers
            .read()
            .values()
            .filter(|m| !m.is_active())
            .cloned()
            .collect()
    }

    pub fn modifier_count(&self) -> usize {
        self.inner.modifiers.read().len()
    }

    /// Subscribe to `dependency`'s dirty notification.
    ///
    /// Returns `Ok(false)` if already subscribed, and an error if the link
    /// would close a cycle (including a value depending on itself).
    pub fn add_dependency<U: Element>(&self, dependency: &ModifiedValue<U>) -> Result<bool> {
        let upstream: Arc<dyn Dependency> = dependency.inner.clone();

        if self.inner.dependencies.read().contains_key(&dependency.id()) {
            return Ok(false);
        }
        if dependency::reaches(&upstream, self.id()) {
            warn!(node = ?self.id(), dependency = ?dependency.id(), "rejected dependency cycle");
            return Err(Error::DependencyCycle {
                node: self.id(),
                dependency: dependency.id(),
            });
        }

        Ok(self.inner.link(upstream))
    }

    /// Unsubscribe from `dependency`. Returns false if it was not linked.
    pub fn remove_dependency<U: Element>(&self, dependency: &ModifiedValue<U>) -> bool {
        let removed = self
            .inner
            .dependencies
            .write()
            .shift_remove(&dependency.id());

        match removed {
            Some(link) => {
                link.disconnect();
                debug!(node = ?self.id(), dependency = ?dependency.id(), "unlinked dependency");
                true
            }
            None => false,
        }
    }

    /// IDs of the values this value is subscribed to.
    pub fn dependencies(&self) -> Vec<NodeId> {
        self.inner.dependencies.read().keys().copied().collect()
    }

    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.read().len()
    }

    /// Register a callback to run, synchronously, every time this value
    /// becomes dirty.
    ///
    /// The callback should not own a handle to this same value, or the value
    /// will never be dropped.
    pub fn on_dirty<F>(&self, notify: F) -> SubscriberId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.on_dirty.subscribe(notify)
    }

    /// Remove a callback registered with [`ModifiedValue::on_dirty`].
    pub fn remove_on_dirty(&self, id: SubscriberId) -> bool {
        self.inner.on_dirty.unsubscribe(id)
    }

    /// Number of dirty listeners, dependency links included.
    pub fn listener_count(&self) -> usize {
        self.inner.on_dirty.len()
    }

    /// The value this would have if `attach` were attached and `detach`
    /// detached. Nothing is mutated.
    ///
    /// As in a real attach, inactive modifiers in `attach` have no effect
    /// and modifiers already attached are not counted twice.
    pub fn preview_value(&self, attach: &[Modifier<T>], detach: &[Modifier<T>]) -> T {
        let mut modifiers = self.inner.active_modifiers();
        for modifier in attach {
            if modifier.is_active() && !modifiers.contains(modifier) {
                modifiers.push(modifier.clone());
            }
        }
        modifiers.retain(|m| !detach.contains(m));

        let base = self.inner.base_value();
        fold::fold_layers(&base, &modifiers, None)
    }

    /// The value this would have if `attach` were attached.
    pub fn preview_attach(&self, attach: &[Modifier<T>]) -> T {
        self.preview_value(attach, &[])
    }

    /// The value this would have if `detach` were detached.
    pub fn preview_detach(&self, detach: &[Modifier<T>]) -> T {
        self.preview_value(&[], detach)
    }
}

impl<T: Element> Clone for ModifiedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Element> From<T> for ModifiedValue<T> {
    fn from(base: T) -> Self {
        Self::new(base)
    }
}

impl<T: Element + Display> Display for ModifiedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.value(), f)
    }
}

impl<T: Element + Debug> Debug for ModifiedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifiedValue")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("cached", &self.dirty_value())
            .field("modifier_count", &self.modifier_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::templates;
    use std::sync::atomic::AtomicI32;

    fn counting_add(amount: i32, calls: &Arc<AtomicI32>) -> Modifier<i32> {
        let calls = Arc::clone(calls);
        Modifier::from_latest(move |latest: &i32| {
            calls.fetch_add(1, Ordering::SeqCst);
            latest + amount
        })
    }

    #[test]
    fn value_without_modifiers_is_base() {
        let value = ModifiedValue::new(7);
        assert_eq!(value.value(), 7);

        value.set_base_value(-3);
        assert_eq!(value.value(), -3);
        assert_eq!(value.base_value(), -3);
    }

    #[test]
    fn value_starts_dirty_and_cleans_on_read() {
        let value = ModifiedValue::new(1);
        assert_eq!(value.state(), DirtyState::Dirty);

        value.value();
        assert_eq!(value.state(), DirtyState::Clean);

        value.set_dirty();
        assert!(value.is_dirty());
    }

    #[test]
    fn clean_reads_use_cache() {
        let calls = Arc::new(AtomicI32::new(0));
        let value = ModifiedValue::new(1);
        value.attach(&counting_add(1, &calls));

        assert_eq!(value.value(), 2);
        assert_eq!(value.value(), 2);
        assert_eq!(value.value(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn update_every_time_skips_cache() {
        let calls = Arc::new(AtomicI32::new(0));
        let value = ModifiedValue::new(1).with_update_every_time(true);
        value.attach(&counting_add(1, &calls));

        value.value();
        value.value();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_attach_and_absent_detach_report_false() {
        let value = ModifiedValue::new(0);
        let modifier = templates::add(1);

        assert!(value.attach(&modifier));
        assert!(!value.attach(&modifier));
        assert_eq!(value.modifier_count(), 1);

        assert!(value.detach(&modifier));
        assert!(!value.detach(&modifier));
        assert_eq!(value.modifier_count(), 0);
    }

    #[test]
    fn getter_drift_is_detected_on_read() {
        let external = Arc::new(AtomicI32::new(4));
        let external_clone = external.clone();
        let value = ModifiedValue::from_source(move || external_clone.load(Ordering::SeqCst));
        value.attach(&templates::mul(10));

        assert_eq!(value.value(), 40);
        assert!(!value.uses_stored_base());

        external.store(5, Ordering::SeqCst);
        // Nothing has noticed yet.
        assert_eq!(value.dirty_value(), 40);
        assert_eq!(value.value(), 50);
    }

    #[test]
    fn inactive_modifiers_are_ignored() {
        let value = ModifiedValue::new(10);
        let bonus = value.modify(templates::add(5));

        assert_eq!(value.value(), 15);

        bonus.set_active(false);
        assert!(value.is_dirty());
        assert_eq!(value.value(), 10);
        assert_eq!(value.inactive_modifiers(), vec![bonus.clone()]);
        assert!(value.active_modifiers().is_empty());

        bonus.set_active(true);
        assert_eq!(value.value(), 15);
    }

    #[test]
    fn detach_where_matches_predicate() {
        let value = ModifiedValue::new(0);
        value.attach(&templates::add(1).with_layer(0));
        value.attach(&templates::add(2).with_layer(1));
        value.attach(&templates::add(4).with_layer(1));

        assert!(value.detach_where(|m| m.layer() == 1));
        assert_eq!(value.modifier_count(), 1);
        assert_eq!(value.value(), 1);

        assert!(!value.detach_where(|m| m.layer() == 1));
        assert!(value.detach_all());
        assert!(!value.detach_all());
    }

    #[test]
    fn on_dirty_fires_for_each_invalidation() {
        let fired = Arc::new(AtomicI32::new(0));
        let fired_clone = fired.clone();
        let value = ModifiedValue::new(0);

        let id = value.on_dirty(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        let modifier = value.modify(templates::add(1));
        modifier.set_order(5);
        value.set_base_value(2);
        assert_eq!(fired.load(Ordering::SeqCst), 3);

        assert!(value.remove_on_dirty(id));
        value.set_dirty();
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn self_dependency_is_rejected() {
        let value = ModifiedValue::new(0);
        assert_eq!(
            value.add_dependency(&value),
            Err(Error::DependencyCycle {
                node: value.id(),
                dependency: value.id(),
            })
        );
    }

    #[test]
    fn dependency_cycle_is_rejected() {
        let a = ModifiedValue::new(0);
        let b = ModifiedValue::new(0.5_f32);
        let c = ModifiedValue::new(false);

        assert_eq!(b.add_dependency(&a), Ok(true));
        assert_eq!(c.add_dependency(&b), Ok(true));
        assert_eq!(c.add_dependency(&b), Ok(false));

        assert!(a.add_dependency(&c).is_err());
        assert_eq!(a.dependency_count(), 0);
    }

    #[test]
    fn dropping_a_dependent_unsubscribes_it() {
        let upstream = ModifiedValue::new(1);
        {
            let downstream = ModifiedValue::following(&upstream);
            assert_eq!(downstream.value(), 1);
            assert_eq!(upstream.listener_count(), 1);
        }
        assert_eq!(upstream.listener_count(), 0);
    }

    #[test]
    fn dropping_a_value_releases_its_modifiers() {
        let modifier = templates::add(1);
        {
            let value = ModifiedValue::new(0);
            value.attach(&modifier);
            assert_eq!(modifier.attached_count(), 1);
        }
        assert_eq!(modifier.attached_count(), 0);
    }

    #[test]
    fn reentrant_dirtying_reaches_dependents() {
        let level = ModifiedValue::new(2);
        let damage = ModifiedValue::new(10);
        damage
            .attach_with_dependency(&templates::mul_dynamic(&level), &level)
            .unwrap();
        assert_eq!(damage.value(), 20);

        // Reads damage clean, then changes level while level is dispatching.
        let bump = templates::add(1);
        let level_handle = level.clone();
        let damage_handle = damage.clone();
        let id = level.on_dirty(move || {
            damage_handle.value();
            level_handle.attach(&bump);
        });

        level.set_base_value(3);
        assert_eq!(level.value(), 4);
        assert_eq!(damage.state(), DirtyState::Clean);
        assert_eq!(damage.dirty_value(), 40);
        assert_eq!(damage.value(), 40);

        level.remove_on_dirty(id);
    }

    #[test]
    fn dirtying_during_dispatch_renotifies_once() {
        let a = ModifiedValue::new(1);
        let b = ModifiedValue::following(&a);
        let fired = Arc::new(AtomicI32::new(0));

        // Pokes a once while a is still dispatching.
        let a_handle = a.clone();
        let fired_clone = fired.clone();
        b.on_dirty(move || {
            if fired_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                a_handle.set_dirty();
            }
        });

        a.set_base_value(2);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(b.value(), 2);
    }

    #[test]
    fn listener_loops_are_capped() {
        let a = ModifiedValue::new(1);
        let b = ModifiedValue::following(&a);
        let fired = Arc::new(AtomicI32::new(0));

        let a_handle = a.clone();
        let fired_clone = fired.clone();
        b.on_dirty(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
            a_handle.set_dirty();
        });

        a.set_base_value(2);
        assert_eq!(fired.load(Ordering::SeqCst), MAX_RENOTIFY as i32 + 1);
        assert_eq!(b.value(), 2);
    }

    #[test]
    fn display_shows_computed_value() {
        let value = ModifiedValue::from(3);
        value.attach(&templates::add(4));
        assert_eq!(value.to_string(), "7");
    }
}
