//! The steering agent: kinematic state plus behaviour tuning.
//!
//! A [`SteeringAgent`] is plain data. The behaviours in [`crate::steering`]
//! read it and return forces; the only state they mutate is the persistent
//! wander angle, which is legitimate per-agent memory.
use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::Vec2;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_FORCE, DEFAULT_MAX_SPEED, DEFAULT_WANDER_DISPLACE, DEFAULT_WANDER_DISTANCE,
    DEFAULT_WANDER_RADIUS,
};
use crate::kinematics::KinematicState;

/// Stable identifier of an agent inside an externally owned registry.
///
/// Stored targets hold an id, never a reference, and are re-validated against
/// the current snapshot every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Wander circle geometry and its persistent angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WanderParams {
    /// Distance of the circle centre ahead of the agent.
    pub distance: f32,
    /// Circle radius.
    pub radius: f32,
    /// Persistent angular offset, perturbed after every wander call.
    pub theta: f32,
    /// Largest per-tick change of `theta` in either direction.
    pub displace_range: f32,
}

impl WanderParams {
    /// Builds wander parameters with an explicit starting angle.
    #[must_use]
    pub const fn new(distance: f32, radius: f32, theta: f32, displace_range: f32) -> Self {
        Self {
            distance,
            radius,
            theta,
            displace_range,
        }
    }
}

impl Default for WanderParams {
    fn default() -> Self {
        Self::new(
            DEFAULT_WANDER_DISTANCE,
            DEFAULT_WANDER_RADIUS,
            -FRAC_PI_2,
            DEFAULT_WANDER_DISPLACE,
        )
    }
}

/// Kinematic state, collision radius and behaviour tuning of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringAgent {
    /// Position, velocity, accumulator and limits.
    pub kinematics: KinematicState,
    /// Collision radius; also the default separation distance.
    pub radius: f32,
    /// Cosmetic radius, carried for presentation only.
    pub draw_radius: f32,
    /// Half-width of the corridor probed ahead for obstacles.
    pub avoidance_width: f32,
    /// Also treat the raw agent-to-obstacle distance as a danger probe.
    pub avoid_checks_body: bool,
    /// Wander geometry and memory.
    pub wander: WanderParams,
}

impl SteeringAgent {
    /// Creates a stationary agent with the default vehicle tuning.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        let draw_radius = 16.0;
        let radius = draw_radius * 3.0;
        Self {
            kinematics: KinematicState::at(position, DEFAULT_MAX_SPEED, DEFAULT_MAX_FORCE),
            radius,
            draw_radius,
            avoidance_width: radius / 2.0,
            avoid_checks_body: false,
            wander: WanderParams::default(),
        }
    }

    /// Sets top speed and force ceiling.
    #[must_use]
    pub const fn with_limits(mut self, max_speed: f32, max_force: f32) -> Self {
        self.kinematics.max_speed = max_speed;
        self.kinematics.max_force = max_force;
        self
    }

    /// Sets the collision and cosmetic radius together and derives the
    /// avoidance width from it.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self.draw_radius = radius;
        self.avoidance_width = radius;
        self
    }

    /// Overrides the obstacle avoidance corridor width.
    #[must_use]
    pub const fn with_avoidance_width(mut self, width: f32) -> Self {
        self.avoidance_width = width;
        self
    }

    /// Replaces the wander parameters.
    #[must_use]
    pub const fn with_wander(mut self, wander: WanderParams) -> Self {
        self.wander = wander;
        self
    }

    /// Sets the initial velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.kinematics.velocity = velocity;
        self
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.kinematics.position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.kinematics.velocity
    }

    /// Top speed.
    #[must_use]
    pub const fn max_speed(&self) -> f32 {
        self.kinematics.max_speed
    }

    /// Steering force ceiling.
    #[must_use]
    pub const fn max_force(&self) -> f32 {
        self.kinematics.max_force
    }

    /// Changes the top speed (dash, boosts, fleeing).
    pub fn set_max_speed(&mut self, max_speed: f32) {
        if (self.kinematics.max_speed - max_speed).abs() > f32::EPSILON {
            trace!("max speed {} -> {}", self.kinematics.max_speed, max_speed);
        }
        self.kinematics.max_speed = max_speed;
    }

    /// Adds a force to this tick's accumulator.
    pub fn apply_force(&mut self, force: Vec2) {
        self.kinematics.apply_force(force);
    }

    /// Integrates one tick.
    pub fn integrate(&mut self) {
        self.kinematics.integrate();
    }

    /// Clamps the position into `[min, max]` per axis.
    pub fn clamp_position(&mut self, min: Vec2, max: Vec2) {
        self.kinematics.position = self.kinematics.position.clamp(min, max.max(min));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_follow_vehicle_tuning() {
        let agent = SteeringAgent::new(Vec2::new(5.0, 6.0));
        assert_relative_eq!(agent.max_speed(), 4.0);
        assert_relative_eq!(agent.max_force(), 0.2);
        assert_relative_eq!(agent.radius, 48.0);
        assert_relative_eq!(agent.avoidance_width, 24.0);
        assert_relative_eq!(agent.wander.theta, -FRAC_PI_2);
    }

    #[test]
    fn clamp_keeps_agent_inside() {
        let mut agent = SteeringAgent::new(Vec2::new(-10.0, 500.0));
        agent.clamp_position(Vec2::splat(5.0), Vec2::new(95.0, 95.0));
        assert_relative_eq!(agent.position().x, 5.0);
        assert_relative_eq!(agent.position().y, 95.0);
    }

    #[test]
    fn ids_display_with_hash() {
        assert_eq!(AgentId(7).to_string(), "#7");
    }
}
