//! Modval Core
//!
//! This crate computes values (statistics, flags, numeric quantities) from a
//! base value plus an ordered, prioritized set of modifiers, recomputing
//! lazily and caching the result until one of its inputs changes.
//! It implements:
//!
//! - Modified values with cached, lazily recomputed results
//! - Modifiers that can be shared between many values and toggled on and off
//! - The layered fold that stacks modifiers by layer, priority and order
//! - Push-dirty, pull-compute dependency propagation between values
//! - Modifier groups for managing multi-modifier effects as one unit
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: Modified values, dirty notifications and dependency links
//! - `modifier`: Modifiers, default orders, templates and groups
//! - `fold`: The layered fold computation
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use modval_core::modifier::templates;
//! use modval_core::value::ModifiedValue;
//!
//! let general_speed = ModifiedValue::new(10.0_f64);
//! let move_speed = ModifiedValue::following(&general_speed);
//!
//! // Default orders apply additions before multiplications.
//! move_speed.attach(&templates::mul(2.0));
//! let haste = general_speed.modify(templates::add(5.0));
//!
//! assert_eq!(general_speed.value(), 15.0);
//! assert_eq!(move_speed.value(), 30.0);
//!
//! haste.detach_from_all();
//! assert_eq!(move_speed.value(), 20.0);
//! ```

pub mod error;
pub mod fold;
pub mod modifier;
pub mod value;

pub use error::{Error, Result};
pub use modifier::{Modifier, ModifierGroup, ModifierId, ModifierMeta};
pub use value::{DirtyState, ModifiedValue, NodeId, SubscriberId};

/// Types that can flow through a modified value.
///
/// `PartialEq` is what detects drift of the base value between reads.
pub trait Element: Clone + PartialEq + Send + Sync + 'static {}

impl<T> Element for T where T: Clone + PartialEq + Send + Sync + 'static {}
