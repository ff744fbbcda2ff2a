//! Two-dimensional vector helpers layered over [`glam::Vec2`].
//!
//! `glam` supplies the arithmetic (`+`, `-`, scalar `*`, `length`,
//! `length_squared`). The [`VecExt`] trait adds the steering vocabulary used by
//! every behaviour: clamping, re-scaling, heading and rotation. All operations
//! take `self` by value and return a fresh vector, so inputs are never aliased.
//!
//! Degenerate input is a policy, not an error: normalising the zero vector
//! (or a non-finite one) yields the zero vector, which makes any force built
//! from it inert for that tick.
use glam::Vec2;

/// Steering-oriented operations on [`Vec2`].
pub trait VecExt {
    /// Unit vector in the same direction, or zero when the length is ~0.
    #[must_use]
    fn normalized_or_zero(self) -> Vec2;
    /// Rescales to `magnitude` (normalise then scale); zero stays zero.
    #[must_use]
    fn with_magnitude(self, magnitude: f32) -> Vec2;
    /// Scales down to `max` when longer; never scales up.
    #[must_use]
    fn limit(self, max: f32) -> Vec2;
    /// Angle of the vector in radians (`atan2(y, x)`).
    #[must_use]
    fn heading(self) -> f32;
    /// Rotates counter-clockwise by `angle` radians.
    #[must_use]
    fn rotated(self, angle: f32) -> Vec2;
}

impl VecExt for Vec2 {
    fn normalized_or_zero(self) -> Vec2 {
        self.normalize_or_zero()
    }

    fn with_magnitude(self, magnitude: f32) -> Vec2 {
        self.normalize_or_zero() * magnitude
    }

    fn limit(self, max: f32) -> Vec2 {
        let length_sq = self.length_squared();
        if length_sq > max * max && length_sq > 0.0 {
            self * (max / length_sq.sqrt())
        } else {
            self
        }
    }

    fn heading(self) -> f32 {
        self.y.atan2(self.x)
    }

    fn rotated(self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

/// Returns the magnitude of a vector expressed by its components.
///
/// # Examples
/// ```
/// use serpentine::vector_math::vec_mag;
/// let magnitude = vec_mag(3.0, 4.0);
/// assert!((magnitude - 5.0).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn vec_mag(component_x: f32, component_y: f32) -> f32 {
    Vec2::new(component_x, component_y).length()
}

/// Point on a circle of `radius` around `centre` at `angle` radians.
#[must_use]
pub fn point_on_circle(centre: Vec2, radius: f32, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    centre + Vec2::new(radius * cos, radius * sin)
}

/// Smallest absolute difference between two angles, in `[0, π]`.
#[must_use]
pub fn angle_between(a: f32, b: f32) -> f32 {
    let tau = std::f32::consts::TAU;
    let diff = (a - b).rem_euclid(tau);
    if diff > std::f32::consts::PI {
        tau - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[rstest]
    #[case::shrinks(Vec2::new(3.0, 4.0), 1.0, 1.0)]
    #[case::keeps_short(Vec2::new(0.3, 0.4), 1.0, 0.5)]
    #[case::zero(Vec2::ZERO, 1.0, 0.0)]
    fn limit_never_scales_up(#[case] input: Vec2, #[case] max: f32, #[case] expected: f32) {
        assert_relative_eq!(input.limit(max).length(), expected, epsilon = 1e-6);
    }

    #[test]
    fn limit_preserves_direction() {
        let limited = Vec2::new(10.0, 0.0).limit(2.0);
        assert_relative_eq!(limited.x, 2.0);
        assert_relative_eq!(limited.y, 0.0);
    }

    #[rstest]
    #[case::regular(Vec2::new(0.0, 2.0), 5.0, Vec2::new(0.0, 5.0))]
    #[case::zero_stays_zero(Vec2::ZERO, 5.0, Vec2::ZERO)]
    #[case::non_finite(Vec2::new(f32::NAN, 1.0), 5.0, Vec2::ZERO)]
    fn with_magnitude_rescales(#[case] input: Vec2, #[case] magnitude: f32, #[case] expected: Vec2) {
        let out = input.with_magnitude(magnitude);
        assert_relative_eq!(out.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(out.y, expected.y, epsilon = 1e-6);
    }

    #[test]
    fn heading_and_rotation_agree() {
        let v = Vec2::new(1.0, 0.0).rotated(FRAC_PI_2);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(v.heading(), FRAC_PI_2, epsilon = 1e-6);
        assert_relative_eq!(Vec2::new(-1.0, 0.0).heading(), PI, epsilon = 1e-6);
    }

    #[test]
    fn angle_between_wraps() {
        assert_relative_eq!(angle_between(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-5);
        assert_relative_eq!(angle_between(0.0, FRAC_PI_2), FRAC_PI_2, epsilon = 1e-6);
    }
}
