//! Dirty Cascade Context
//!
//! Tracks which values are currently dispatching their dirty notification on
//! this thread. A value that is asked to notify again while it is still on
//! the stack does not recurse; instead it records that another dispatch is
//! owed and the outer dispatch runs it once the current one returns.
//!
//! # Implementation
//!
//! A thread-local stack of node IDs. Entering pushes, dropping the returned
//! guard pops. Diamonds in the dependency graph are fine: a node reached
//! twice through different paths is never on the stack twice at once.

use std::cell::RefCell;

use super::node::NodeId;

thread_local! {
    static DISPATCHING: RefCell<Vec<NodeId>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the node when dropped.
pub(crate) struct DirtyScope {
    node: NodeId,
}

impl DirtyScope {
    /// Enter the dispatch of `node`.
    ///
    /// Returns `None` if `node` is already dispatching on this thread.
    pub fn enter(node: NodeId) -> Option<Self> {
        DISPATCHING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&node) {
                return None;
            }
            stack.push(node);
            Some(Self { node })
        })
    }

    /// Number of nested dispatches on this thread.
    pub fn depth() -> usize {
        DISPATCHING.with(|stack| stack.borrow().len())
    }
}

impl Drop for DirtyScope {
    fn drop(&mut self) {
        DISPATCHING.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(node) = popped {
                debug_assert_eq!(
                    node, self.node,
                    "DirtyScope mismatch: expected {:?}, got {:?}",
                    self.node, node
                );
            }
        });
    }
}
