//! Utility helpers for tests.
//!
//! Fixtures build agents and views in one line; the assertions compare
//! vectors with a tolerance and report both sides on failure.
pub mod fixtures;

use glam::Vec2;

/// Assert that `actual` is within `epsilon` of `expected` on both axes.
///
/// # Panics
/// Panics naming both vectors if they differ by more than `epsilon`.
pub fn assert_vec_near(actual: Vec2, expected: Vec2, epsilon: f32) {
    assert!(
        actual.abs_diff_eq(expected, epsilon),
        "expected {expected:?} ± {epsilon}, got {actual:?}"
    );
}

/// Assert that `force` is no longer than `limit`, allowing float slack.
///
/// # Panics
/// Panics with the measured length if it exceeds `limit`.
pub fn assert_within_length(force: Vec2, limit: f32) {
    let length = force.length();
    assert!(
        length <= limit + 1e-4,
        "length {length} exceeds limit {limit} for {force:?}"
    );
}
