//! Template modifiers.
//!
//! Ready-made modifiers for the common operations, positioned with the
//! [default orders](super::order). Each returns an unattached [`Modifier`];
//! adjust placement with the `with_*` builders before attaching.
//!
//! The `*_dynamic` variants read another [`ModifiedValue`] every time they
//! run. Attach them with [`ModifiedValue::attach_with_dependency`] so the
//! target is invalidated as soon as the amount changes.

use std::ops::{Add, Mul};

use crate::value::ModifiedValue;
use crate::Element;

use super::handle::Modifier;
use super::order;

/// Replace the running value.
pub fn set<T: Element>(value: T) -> Modifier<T> {
    Modifier::from_ignored(move || value.clone()).with_order(order::SET)
}

pub fn add<T>(amount: T) -> Modifier<T>
where
    T: Element + Add<Output = T>,
{
    Modifier::from_latest(move |latest: &T| latest.clone() + amount.clone()).with_order(order::ADD)
}

pub fn add_dynamic<T>(amount: &ModifiedValue<T>) -> Modifier<T>
where
    T: Element + Add<Output = T>,
{
    let amount = amount.clone();
    Modifier::from_latest(move |latest: &T| latest.clone() + amount.value()).with_order(order::ADD)
}

/// Add `fraction` of the value as it was at the start of the layer.
/// Stacks additively.
pub fn add_fraction<T>(fraction: T) -> Modifier<T>
where
    T: Element + Add<Output = T> + Mul<Output = T>,
{
    Modifier::from_layer_start_and_latest(move |layer_start: &T, latest: &T| {
        latest.clone() + fraction.clone() * layer_start.clone()
    })
    .with_order(order::ADD_FRACTION)
}

/// Add `fraction` of the base value. Stacks additively.
pub fn add_fraction_of_base<T>(fraction: T) -> Modifier<T>
where
    T: Element + Add<Output = T> + Mul<Output = T>,
{
    Modifier::from_base_and_latest(move |base: &T, latest: &T| {
        latest.clone() + fraction.clone() * base.clone()
    })
    .with_order(order::ADD_FRACTION)
}

pub fn mul<T>(factor: T) -> Modifier<T>
where
    T: Element + Mul<Output = T>,
{
    Modifier::from_latest(move |latest: &T| latest.clone() * factor.clone()).with_order(order::MUL)
}

pub fn mul_dynamic<T>(factor: &ModifiedValue<T>) -> Modifier<T>
where
    T: Element + Mul<Output = T>,
{
    let factor = factor.clone();
    Modifier::from_latest(move |latest: &T| latest.clone() * factor.value()).with_order(order::MUL)
}

/// Raise the running value to at least `floor`.
pub fn min_cap<T>(floor: T) -> Modifier<T>
where
    T: Element + PartialOrd,
{
    Modifier::from_latest(move |latest: &T| at_least(latest, &floor)).with_order(order::CAP)
}

pub fn min_cap_dynamic<T>(floor: &ModifiedValue<T>) -> Modifier<T>
where
    T: Element + PartialOrd,
{
    let floor = floor.clone();
    Modifier::from_latest(move |latest: &T| at_least(latest, &floor.value())).with_order(order::CAP)
}

/// A [`min_cap`] in the last layer at the highest priority.
pub fn min_cap_final<T>(floor: T) -> Modifier<T>
where
    T: Element + PartialOrd,
{
    min_cap(floor).with_priority(order::FINAL).with_layer(order::FINAL)
}

/// Lower the running value to at most `ceiling`.
pub fn max_cap<T>(ceiling: T) -> Modifier<T>
where
    T: Element + PartialOrd,
{
    Modifier::from_latest(move |latest: &T| at_most(latest, &ceiling)).with_order(order::CAP)
}

pub fn max_cap_dynamic<T>(ceiling: &ModifiedValue<T>) -> Modifier<T>
where
    T: Element + PartialOrd,
{
    let ceiling = ceiling.clone();
    Modifier::from_latest(move |latest: &T| at_most(latest, &ceiling.value())).with_order(order::CAP)
}

/// A [`max_cap`] in the last layer at the highest priority.
pub fn max_cap_final<T>(ceiling: T) -> Modifier<T>
where
    T: Element + PartialOrd,
{
    max_cap(ceiling).with_priority(order::FINAL).with_layer(order::FINAL)
}

fn at_least<T: Clone + PartialOrd>(value: &T, floor: &T) -> T {
    if value < floor {
        floor.clone()
    } else {
        value.clone()
    }
}

fn at_most<T: Clone + PartialOrd>(value: &T, ceiling: &T) -> T {
    if value > ceiling {
        ceiling.clone()
    } else {
        value.clone()
    }
}

pub fn not() -> Modifier<bool> {
    Modifier::from_latest(|latest: &bool| !latest).with_order(order::NOT)
}

pub fn and(other: bool) -> Modifier<bool> {
    Modifier::from_latest(move |latest: &bool| *latest && other).with_order(order::AND)
}

pub fn and_dynamic(other: &ModifiedValue<bool>) -> Modifier<bool> {
    let other = other.clone();
    Modifier::from_latest(move |latest: &bool| *latest && other.value()).with_order(order::AND)
}

pub fn or(other: bool) -> Modifier<bool> {
    Modifier::from_latest(move |latest: &bool| *latest || other).with_order(order::OR)
}

pub fn or_dynamic(other: &ModifiedValue<bool>) -> Modifier<bool> {
    let other = other.clone();
    Modifier::from_latest(move |latest: &bool| *latest || other.value()).with_order(order::OR)
}

pub fn xor(other: bool) -> Modifier<bool> {
    Modifier::from_latest(move |latest: &bool| *latest ^ other).with_order(order::XOR)
}

/// Material implication: `!latest || other`.
pub fn imply(other: bool) -> Modifier<bool> {
    Modifier::from_latest(move |latest: &bool| !*latest || other).with_order(order::IMPLY)
}
