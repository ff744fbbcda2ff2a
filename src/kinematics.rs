//! Force accumulation and per-tick integration.
//!
//! One tick is one implicit unit of time. Forces are summed into the
//! acceleration scratch vector with no normalisation, then [`KinematicState::integrate`]
//! advances velocity (clamped to `max_speed`) and position, and clears the
//! accumulator. Behaviour constants elsewhere in the crate are tuned against
//! this exact order.
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::vector_math::VecExt;

/// Position, velocity and the per-tick force accumulator of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    /// Current position.
    pub position: Vec2,
    /// Current velocity, `|velocity| <= max_speed` after every integration.
    pub velocity: Vec2,
    /// Sum of forces applied since the last integration.
    pub acceleration: Vec2,
    /// Top speed.
    pub max_speed: f32,
    /// Ceiling applied by behaviours to each individual steering force.
    pub max_force: f32,
}

impl KinematicState {
    /// Creates a stationary state at `position`.
    #[must_use]
    pub const fn at(position: Vec2, max_speed: f32, max_force: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            max_speed,
            max_force,
        }
    }

    /// Adds `force` to the accumulator.
    ///
    /// Forces combine additively; callers choose weights that keep the sum
    /// sensible.
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    /// Advances one tick: `v += a`, clamp `v`, `p += v`, `a = 0`.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec2;
    /// use serpentine::kinematics::KinematicState;
    ///
    /// let mut state = KinematicState::at(Vec2::ZERO, 4.0, 0.2);
    /// state.apply_force(Vec2::new(0.2, 0.0));
    /// state.integrate();
    /// assert!((state.velocity.x - 0.2).abs() < 1e-6);
    /// assert!((state.position.x - 0.2).abs() < 1e-6);
    /// assert_eq!(state.acceleration, Vec2::ZERO);
    /// ```
    pub fn integrate(&mut self) {
        self.velocity = (self.velocity + self.acceleration).limit(self.max_speed);
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
    }

    /// Current speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::huge_force(Vec2::new(100.0, -50.0))]
    #[case::tiny_force(Vec2::new(0.01, 0.0))]
    #[case::opposing(Vec2::new(-9.0, 0.0))]
    fn velocity_never_exceeds_max_speed(#[case] force: Vec2) {
        let mut state = KinematicState::at(Vec2::ZERO, 4.0, 0.2);
        state.velocity = Vec2::new(3.9, 0.0);
        for _ in 0..20 {
            state.apply_force(force);
            state.integrate();
            assert!(state.speed() <= state.max_speed + 1e-4);
        }
    }

    #[test]
    fn forces_accumulate_then_reset() {
        let mut state = KinematicState::at(Vec2::new(1.0, 1.0), 10.0, 1.0);
        state.apply_force(Vec2::new(0.5, 0.0));
        state.apply_force(Vec2::new(0.0, 0.25));
        assert_relative_eq!(state.acceleration.x, 0.5);
        assert_relative_eq!(state.acceleration.y, 0.25);
        state.integrate();
        assert_relative_eq!(state.position.x, 1.5);
        assert_relative_eq!(state.position.y, 1.25);
        assert_eq!(state.acceleration, Vec2::ZERO);
    }
}
