//! Data Sanitization
//!
//! Numerical stability utilities. Every numeric input that reaches the
//! propagation pipeline passes through here, so NaN/Inf never leak into
//! object state.

use crate::types::{
    ObjectPropagationState, MAX_DIFFICULTY, MAX_PRIORITY, MAX_STABILITY, MIN_DIFFICULTY,
    MIN_PRIORITY, MIN_STABILITY,
};

/// Replace NaN/Inf with 0.0
#[inline]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Clamp into [lo, hi]; NaN/Inf become zero-effect before clamping
#[inline]
pub fn clamp_finite(x: f64, lo: f64, hi: f64) -> f64 {
    finite_or_zero(x).clamp(lo, hi)
}

#[inline]
pub fn clamp_unit(x: f64) -> f64 {
    clamp_finite(x, 0.0, 1.0)
}

pub fn clamp_difficulty(x: f64) -> f64 {
    clamp_finite(x, MIN_DIFFICULTY, MAX_DIFFICULTY)
}

pub fn clamp_stability(x: f64) -> f64 {
    clamp_finite(x, MIN_STABILITY, MAX_STABILITY)
}

pub fn clamp_priority(x: f64) -> f64 {
    clamp_finite(x, MIN_PRIORITY, MAX_PRIORITY)
}

/// Pull every bounded field of a state record back into range
pub fn sanitize_state(state: &mut ObjectPropagationState) {
    state.difficulty = clamp_difficulty(state.difficulty);
    state.stability = clamp_stability(state.stability);
    state.priority = clamp_priority(state.priority);
}

/// Check whether a state record violates its range invariants
pub fn state_in_bounds(state: &ObjectPropagationState) -> bool {
    (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&state.difficulty)
        && (MIN_STABILITY..=MAX_STABILITY).contains(&state.stability)
        && (MIN_PRIORITY..=MAX_PRIORITY).contains(&state.priority)
}
