//! Base value sources.

use std::sync::Arc;

use crate::Element;

use super::node::ModifiedValue;

/// Something that yields a base value on demand.
///
/// Closures are sources, and so is another [`ModifiedValue`] of the same
/// element type (its computed value becomes the base). Sources are allowed to
/// be impure, but values only notice a changed result when they are read.
/// Pair impure sources with a dependency link or with
/// `update_every_time` when listeners need to know immediately.
pub trait BaseValueSource<T>: Send + Sync {
    fn evaluate(&self) -> T;
}

impl<T, F> BaseValueSource<T> for F
where
    F: Fn() -> T + Send + Sync,
{
    fn evaluate(&self) -> T {
        self()
    }
}

impl<T: Element> BaseValueSource<T> for ModifiedValue<T> {
    fn evaluate(&self) -> T {
        self.value()
    }
}

/// Where a value's base comes from.
pub(crate) enum BaseValue<T> {
    /// A stored constant. The only kind that is persisted.
    Stored(T),
    /// A getter evaluated on every read.
    Source(Arc<dyn BaseValueSource<T>>),
}

impl<T> BaseValue<T> {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}
