//! Modifier Groups
//!
//! A bag of modifiers that can be attached, detached and toggled together,
//! e.g. the several modifiers making up one buff. Being in a group says
//! nothing about whether a modifier is attached anywhere or active.

use indexmap::IndexMap;

use crate::value::ModifiedValue;
use crate::Element;

use super::handle::{Modifier, ModifierId};

/// An unordered, duplicate-free collection of modifiers.
pub struct ModifierGroup<T: Element> {
    modifiers: IndexMap<ModifierId, Modifier<T>>,
}

impl<T: Element> ModifierGroup<T> {
    pub fn new() -> Self {
        Self {
            modifiers: IndexMap::new(),
        }
    }

    /// Add a modifier. Returns false if it is already in the group.
    pub fn insert(&mut self, modifier: Modifier<T>) -> bool {
        if self.modifiers.contains_key(&modifier.id()) {
            return false;
        }
        self.modifiers.insert(modifier.id(), modifier);
        true
    }

    /// Remove a modifier without detaching it. Returns false if absent.
    pub fn remove(&mut self, modifier: &Modifier<T>) -> bool {
        self.modifiers.shift_remove(&modifier.id()).is_some()
    }

    pub fn contains(&self, modifier: &Modifier<T>) -> bool {
        self.modifiers.contains_key(&modifier.id())
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier<T>> {
        self.modifiers.values()
    }

    pub fn modifiers(&self) -> Vec<Modifier<T>> {
        self.modifiers.values().cloned().collect()
    }

    pub fn active_modifiers(&self) -> Vec<Modifier<T>> {
        self.iter().filter(|m| m.is_active()).cloned().collect()
    }

    pub fn inactive_modifiers(&self) -> Vec<Modifier<T>> {
        self.iter().filter(|m| !m.is_active()).cloned().collect()
    }

    /// Switch every modifier on or off.
    pub fn set_active(&self, active: bool) {
        for modifier in self.iter() {
            modifier.set_active(active);
        }
    }

    /// Attach every modifier to `value`. Returns how many were newly attached.
    pub fn attach_to(&self, value: &ModifiedValue<T>) -> usize {
        self.iter().filter(|m| value.attach(m)).count()
    }

    /// Detach every modifier from `value`. Returns how many were attached.
    pub fn detach_from(&self, value: &ModifiedValue<T>) -> usize {
        self.iter().filter(|m| value.detach(m)).count()
    }

    /// Detach every modifier from all values it is attached to.
    pub fn detach_from_all(&self) {
        for modifier in self.iter() {
            modifier.detach_from_all();
        }
    }

    /// Detach matching modifiers from all their values, keeping them in the
    /// group.
    pub fn detach_where<F>(&self, mut condition: F)
    where
        F: FnMut(&Modifier<T>) -> bool,
    {
        for modifier in self.iter().filter(|m| condition(m)) {
            modifier.detach_from_all();
        }
    }

    /// Empty the group without detaching anything.
    pub fn clear(&mut self) {
        self.modifiers.clear();
    }

    /// Detach every modifier from all its values, then empty the group.
    pub fn clear_and_detach(&mut self) {
        self.detach_from_all();
        self.clear();
    }

    /// Detach matching modifiers from all their values and remove them from
    /// the group. Returns how many were removed.
    pub fn remove_and_detach_where<F>(&mut self, mut condition: F) -> usize
    where
        F: FnMut(&Modifier<T>) -> bool,
    {
        let before = self.modifiers.len();
        self.modifiers.retain(|_, modifier| {
            if condition(modifier) {
                modifier.detach_from_all();
                false
            } else {
                true
            }
        });
        before - self.modifiers.len()
    }
}

impl<T: Element> Default for ModifierGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> FromIterator<Modifier<T>> for ModifierGroup<T> {
    fn from_iter<I: IntoIterator<Item = Modifier<T>>>(iter: I) -> Self {
        let mut group = Self::new();
        group.extend(iter);
        group
    }
}

impl<T: Element> Extend<Modifier<T>> for ModifierGroup<T> {
    fn extend<I: IntoIterator<Item = Modifier<T>>>(&mut self, iter: I) {
        for modifier in iter {
            self.insert(modifier);
        }
    }
}

impl<T: Element> std::fmt::Debug for ModifierGroup<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.modifiers.values()).finish()
    }
}
