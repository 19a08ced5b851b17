//! Modifier operations.

/// The function a modifier applies.
///
/// Inputs are the value's base value, the running value at the start of the
/// modifier's layer, and the running value just before this modifier. The
/// result becomes the new running value. Operations are expected to be pure;
/// overflow and rounding are their own business.
///
/// Any `Fn(&T, &T, &T) -> T` is an operation.
pub trait Operation<T>: Send + Sync {
    fn apply(&self, base: &T, layer_start: &T, latest: &T) -> T;
}

impl<T, F> Operation<T> for F
where
    F: Fn(&T, &T, &T) -> T + Send + Sync,
{
    fn apply(&self, base: &T, layer_start: &T, latest: &T) -> T {
        self(base, layer_start, latest)
    }
}

/// The operation of a modifier built without one: yields the base value.
pub(crate) fn passthrough<T: Clone>(base: &T, _layer_start: &T, _latest: &T) -> T {
    base.clone()
}
