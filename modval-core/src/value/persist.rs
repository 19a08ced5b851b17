//! Serialization
//!
//! A modified value serializes as its current base value. Modifiers,
//! dependencies and listeners are runtime wiring and are not persisted;
//! a deserialized value is a fresh, unmodified value with a stored base.
//! Getter-backed values are snapshotted, so their getter is evaluated.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Element;

use super::node::ModifiedValue;

impl<T> Serialize for ModifiedValue<T>
where
    T: Element + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.base_value().serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ModifiedValue<T>
where
    T: Element + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(ModifiedValue::new)
    }
}
