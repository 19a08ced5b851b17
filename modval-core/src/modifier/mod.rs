//! Modifiers
//!
//! A modifier changes the value of every [`ModifiedValue`](crate::value::ModifiedValue)
//! it is attached to. It is built from an [`Operation`] over three inputs
//! (base value, layer start value, latest value) plus placement metadata:
//!
//! - `layer`: lower layers are folded first; a layer sees only the result of
//!   the layers below it
//! - `priority`: inside a layer, only the highest priority present applies
//! - `order`: sequencing among the survivors, ties broken by attachment order
//! - `active`: inactive modifiers stay attached but are skipped
//!
//! [`templates`] provides the common operations, positioned by the
//! [`order`] defaults, and [`ModifierGroup`] bundles modifiers that are
//! attached and detached together.

mod group;
mod handle;
mod op;
pub mod order;
pub mod templates;

pub use group::ModifierGroup;
pub use handle::{Modifier, ModifierId, ModifierMeta};
pub use op::Operation;
