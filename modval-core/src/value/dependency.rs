//! Dependency Links
//!
//! A dependency link subscribes a downstream value to the dirty notification
//! of an upstream value. The two values may have different element types, so
//! links go through the type-erased [`Dependency`] view.

use std::collections::HashSet;
use std::sync::Arc;

use super::node::NodeId;
use super::subscriber::{Callback, SubscriberId};

/// A type-erased view of a modified value, as seen by its dependents.
pub(crate) trait Dependency: Send + Sync {
    /// The ID of the value.
    fn node_id(&self) -> NodeId;

    /// Register a callback to run whenever this value becomes dirty.
    fn subscribe_dirty(&self, id: SubscriberId, notify: Callback);

    /// Remove a callback registered with [`Dependency::subscribe_dirty`].
    fn unsubscribe_dirty(&self, id: SubscriberId) -> bool;

    /// The values this value is itself linked to.
    fn upstream(&self) -> Vec<Arc<dyn Dependency>>;
}

/// A live link held by the downstream value.
pub(crate) struct Link {
    pub node: Arc<dyn Dependency>,
    pub subscription: SubscriberId,
}

impl Link {
    /// Subscribe `notify` to `node` and keep the handle needed to undo it.
    pub fn connect(node: Arc<dyn Dependency>, notify: Callback) -> Self {
        let subscription = SubscriberId::new();
        node.subscribe_dirty(subscription, notify);
        Self { node, subscription }
    }

    pub fn disconnect(&self) -> bool {
        self.node.unsubscribe_dirty(self.subscription)
    }
}

/// Check whether `target` can be reached from `start` by following upstream
/// links. `start` itself counts.
///
/// Linking `downstream` to `upstream` closes a cycle exactly when
/// `reaches(upstream, downstream)` holds.
pub(crate) fn reaches(start: &Arc<dyn Dependency>, target: NodeId) -> bool {
    let mut visited = HashSet::new();
    let mut stack = vec![Arc::clone(start)];

    while let Some(node) = stack.pop() {
        let id = node.node_id();
        if id == target {
            return true;
        }
        if !visited.insert(id) {
            continue;
        }
        stack.extend(node.upstream());
    }

    false
}
