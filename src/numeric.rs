//! Numeric conversion helpers used across the project.
//!
//! These utilities guard conversions between floating-point and integer
//! domains. They rely on debug assertions to flag unexpected values while
//! keeping the call-sites ergonomic.

/// Linearly re-maps `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// The result is not clamped, mirroring the classic sketching `map`. A
/// degenerate input range yields `out_min`.
///
/// # Examples
/// ```
/// use serpentine::numeric::map_range;
/// assert!((map_range(0.5, 0.0, 1.0, 10.0, 20.0) - 15.0).abs() < 1e-6);
/// assert!((map_range(1.0, 0.0, 1.0, 150.0, 80.0) - 80.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let span = in_max - in_min;
    if span.abs() <= f32::EPSILON {
        return out_min;
    }
    out_min + (value - in_min) / span * (out_max - out_min)
}

/// Floor a finite `f32` into a tick count, clamping negatives to zero.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The floored value is clamped to the u32 domain before casting."
)]
#[must_use]
pub fn ticks_from_f32(value: f32) -> u32 {
    debug_assert!(value.is_finite(), "expected finite f32 for tick conversion");
    if !value.is_finite() {
        return 0;
    }
    let clamped = value.floor().clamp(0.0, u32::MAX as f32);
    clamped as u32
}

/// Convert a collection length into `f32` for averaging.
#[expect(
    clippy::cast_precision_loss,
    reason = "Neighbour and segment counts stay far below 2^24."
)]
#[must_use]
pub const fn usize_to_f32(value: usize) -> f32 {
    value as f32
}

/// Convert a score or tick counter into `f32` for scaling.
#[expect(
    clippy::cast_precision_loss,
    reason = "Scores and wave numbers stay far below 2^24."
)]
#[must_use]
pub const fn u32_to_f32(value: u32) -> f32 {
    value as f32
}

/// Returns `true` when every value is finite.
#[must_use]
pub fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|value| value.is_finite())
}
