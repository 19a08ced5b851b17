//! Layered Fold
//!
//! Computes a modified value from its base value and its active modifiers.
//!
//! # Algorithm
//!
//! 1. Drop inactive modifiers, and those above the requested layer
//! 2. Visit the remaining layers in ascending order
//! 3. Within a layer, keep only the modifiers at the layer's highest priority
//! 4. Apply the survivors by ascending order; equal orders keep the order in
//!    which the modifiers were attached
//! 5. Every modifier of a layer sees the same layer start value: the running
//!    value when the layer began
//!
//! The fold is a pure function of its inputs. Modifier metadata is read once
//! up front so a concurrent change cannot reorder a fold in progress.

use smallvec::SmallVec;

use crate::modifier::{Modifier, ModifierMeta};
use crate::Element;

/// Fold `modifiers` over `base`.
///
/// `modifiers` must be in attachment order. When `up_to_layer` is given,
/// modifiers in higher layers are ignored.
pub fn fold_layers<T: Element>(base: &T, modifiers: &[Modifier<T>], up_to_layer: Option<i32>) -> T {
    let mut plan: SmallVec<[(ModifierMeta, &Modifier<T>); 8]> = modifiers
        .iter()
        .map(|modifier| (modifier.meta(), modifier))
        .filter(|(meta, _)| meta.active && up_to_layer.map_or(true, |limit| meta.layer <= limit))
        .collect();

    // Stable: attachment order breaks ties.
    plan.sort_by_key(|(meta, _)| (meta.layer, meta.order));

    let mut current = base.clone();
    let mut rest = &plan[..];
    while let Some((first, _)) = rest.first() {
        let end = rest
            .iter()
            .position(|(meta, _)| meta.layer != first.layer)
            .unwrap_or(rest.len());
        let (layer, tail) = rest.split_at(end);
        current = fold_layer(base, current, layer);
        rest = tail;
    }
    current
}

/// Apply one layer's winning modifiers, already sorted by order.
fn fold_layer<T: Element>(base: &T, layer_start: T, layer: &[(ModifierMeta, &Modifier<T>)]) -> T {
    let Some(top) = layer.iter().map(|(meta, _)| meta.priority).max() else {
        return layer_start;
    };

    let mut current = layer_start.clone();
    for (_, modifier) in layer.iter().filter(|(meta, _)| meta.priority == top) {
        current = modifier.apply(base, &layer_start, &current);
    }
    current
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    fn add(amount: i32) -> Modifier<i32> {
        Modifier::from_latest(move |latest: &i32| latest + amount)
    }

    fn mul(factor: i32) -> Modifier<i32> {
        Modifier::from_latest(move |latest: &i32| latest * factor)
    }

    #[test]
    fn empty_fold_is_base() {
        assert_eq!(fold_layers(&7, &[], None), 7);
        assert_eq!(fold_layers(&7, &[], Some(-5)), 7);
    }

    #[test]
    fn highest_priority_wins_within_layer() {
        let low = add(100);
        let high = add(1).with_priority(2);
        let also_high = mul(3).with_priority(2).with_order(1);

        assert_eq!(fold_layers(&10, &[low.clone(), high.clone(), also_high.clone()], None), 33);
        assert_eq!(fold_layers(&10, &[also_high, high, low], None), 33);
    }

    #[test]
    fn priority_is_per_layer() {
        let first = add(1).with_priority(10);
        let second = add(100).with_layer(1);
        assert_eq!(fold_layers(&0, &[first, second], None), 101);
    }

    #[test]
    fn order_then_attachment_sequence() {
        let double = mul(2).with_order(10);
        let plus_five = add(5).with_order(5);
        assert_eq!(fold_layers(&10, &[double.clone(), plus_five.clone()], None), 30);
        assert_eq!(fold_layers(&10, &[plus_five, double], None), 30);

        let a = mul(2);
        let b = add(1);
        assert_eq!(fold_layers(&1, &[a.clone(), b.clone()], None), 3);
        assert_eq!(fold_layers(&1, &[b, a], None), 4);
    }

    #[test]
    fn layers_fold_in_ascending_order() {
        let late = mul(10).with_layer(5);
        let early = add(1).with_layer(-3);
        assert_eq!(fold_layers(&1, &[late, early], None), 20);
    }

    #[test]
    fn layer_start_is_constant_within_a_layer() {
        let seen = Arc::new(AtomicI32::new(0));
        let witness = {
            let seen = seen.clone();
            Modifier::from_layer_start_and_latest(move |layer_start: &i32, latest: &i32| {
                seen.store(*layer_start, Ordering::SeqCst);
                *latest
            })
            .with_order(1)
            .with_layer(1)
        };
        let bump = add(4).with_layer(1);
        let setup = add(6);

        assert_eq!(fold_layers(&0, &[witness, bump, setup], None), 10);
        assert_eq!(seen.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn base_is_passed_unchanged() {
        let from_base = Modifier::from_base_and_latest(|base: &i32, latest: &i32| base + latest).with_layer(2);
        let bump = add(5);
        assert_eq!(fold_layers(&3, &[from_base, bump], None), 11);
    }

    #[test]
    fn inactive_modifiers_are_skipped() {
        let off = add(100).with_priority(9).with_active(false);
        let on = add(1);
        // an inactive modifier does not suppress lower priorities
        assert_eq!(fold_layers(&0, &[off, on], None), 1);
    }

    #[test]
    fn up_to_layer_is_inclusive() {
        let mods = [add(1), add(10).with_layer(1), add(100).with_layer(2)];
        assert_eq!(fold_layers(&0, &mods, Some(0)), 1);
        assert_eq!(fold_layers(&0, &mods, Some(1)), 11);
        assert_eq!(fold_layers(&0, &mods, Some(-1)), 0);
        assert_eq!(fold_layers(&0, &mods, None), 111);
    }
}
