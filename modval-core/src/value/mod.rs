//! Modified Values
//!
//! This module implements the value node: a base value plus the modifiers
//! attached to it, with a cached result that is recomputed only when needed.
//!
//! # Concepts
//!
//! ## Base value
//!
//! Either a stored constant or a getter (anything implementing
//! [`BaseValueSource`]). Getters may read other modified values, which is
//! how value-to-value chains ("move speed" derived from "general speed") are
//! expressed.
//!
//! ## Dirty tracking
//!
//! A value is either clean or dirty. It becomes dirty when its base value is
//! replaced, when a modifier is attached or detached, when an attached
//! modifier changes, or when one of its dependencies becomes dirty. It
//! becomes clean again only when a read recomputes it.
//!
//! On every read the current base value is also compared with the one seen
//! last time, so getter-backed values pick up drift even without an explicit
//! dependency link.
//!
//! ## Dependencies
//!
//! A dependency link subscribes one value to another's dirty notification.
//! Invalidation is pushed eagerly and synchronously through the whole graph
//! (so UI listeners see a change immediately), while the fold itself runs
//! lazily on the next read.
//!
//! # Implementation Notes
//!
//! Values are cheap handles around shared state, like the modifiers that are
//! attached to them. Modifiers keep only weak back-references to the values
//! they are attached to, and dependency callbacks only weakly reference the
//! downstream value, so no ownership cycles form.

mod context;
mod dependency;
mod node;
mod persist;
mod source;
mod subscriber;

pub use node::{DirtyState, ModifiedValue, NodeId};
pub use source::BaseValueSource;
pub use subscriber::SubscriberId;

pub(crate) use node::NodeInner;
