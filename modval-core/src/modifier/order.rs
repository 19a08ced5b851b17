//! Default orders.
//!
//! Positions canonical operations within a layer so that unrelated
//! operation kinds compose predictably without an explicit order:
//! assignments first, fractional additions, then flat additions, then
//! multiplications, caps last.

/// Replace the running value.
pub const SET: i32 = -1000;

pub const NOT: i32 = -100;
pub const AND: i32 = 100;
pub const OR: i32 = 200;
pub const XOR: i32 = 300;
pub const IMPLY: i32 = 400;

/// Add a fraction of the layer start (or base) value.
pub const ADD_FRACTION: i32 = 1000;
pub const ADD: i32 = 3000;
pub const MUL: i32 = 4000;

/// Clamp. Always applied last within its layer and priority.
pub const CAP: i32 = i32::MAX;

/// Priority and layer of the "final" caps, which outrank and outlast
/// everything else.
pub const FINAL: i32 = i32::MAX;
