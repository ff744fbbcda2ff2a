//! Static and slowly wandering circular obstacles.
//!
//! Moving obstacles are ordinary steering agents with no external targets:
//! they wander, keep away from each other and stay inside the world. Every tick
//! the field flattens both kinds into plain [`Obstacle`] views for queries.
use glam::Vec2;
use log::debug;
use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{SteeringAgent, WanderParams};
use crate::collider::CircleCollider;
use crate::kind::AgentKind;
use crate::numeric::usize_to_f32;
use crate::steering;
use crate::vector_math::VecExt;
use crate::world::Bounds;

/// Immutable circle the agents steer around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre.
    pub position: Vec2,
    /// Radius.
    pub radius: f32,
}

impl Obstacle {
    /// Builds an obstacle.
    #[must_use]
    pub const fn new(position: Vec2, radius: f32) -> Self {
        Self { position, radius }
    }
}

impl CircleCollider for Obstacle {
    fn centre(&self) -> Vec2 {
        self.position
    }

    fn collision_radius(&self) -> f32 {
        self.radius
    }
}

/// Weight of the wander force on a moving obstacle.
const DRIFT_WANDER_WEIGHT: f32 = 1.0;
/// Weight of the boundary force on a moving obstacle.
const DRIFT_BOUNDARY_WEIGHT: f32 = 3.5;
/// Boundary margin of a moving obstacle.
const DRIFT_BOUNDARY_MARGIN: f32 = 100.0;
/// Weight of the obstacle separation force.
const DRIFT_SEPARATION_WEIGHT: f32 = 2.5;
/// Extra clearance kept between two moving obstacles.
const DRIFT_CLEARANCE: f32 = 25.0;
/// Inset used when clamping a moving obstacle to the world.
const DRIFT_CLAMP_INSET: f32 = 15.0;

/// A wandering obstacle.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingObstacle {
    /// Underlying agent; its radius is the obstacle radius.
    pub agent: SteeringAgent,
}

impl MovingObstacle {
    /// Creates a slow drifting obstacle with a random heading.
    pub fn new<R: Rng + ?Sized>(position: Vec2, radius: f32, rng: &mut R) -> Self {
        let heading = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = rng.random_range(0.2..0.6);
        let agent = SteeringAgent::new(position)
            .with_limits(rng.random_range(0.6..1.5), 0.04)
            .with_radius(radius)
            .with_velocity(Vec2::from_angle(heading) * speed)
            .with_wander(WanderParams::new(
                80.0,
                40.0,
                rng.random_range(0.0..std::f32::consts::TAU),
                0.12,
            ));
        Self { agent }
    }

    /// Plain obstacle view of the current position.
    #[must_use]
    pub const fn as_obstacle(&self) -> Obstacle {
        Obstacle::new(self.agent.kinematics.position, self.agent.radius)
    }

    /// Repulsion from other obstacles, skipping this one (same centre).
    ///
    /// Each neighbour closer than `max(3r, r + r_other + 25)` contributes its
    /// normalised offset divided by the distance.
    #[must_use]
    pub fn separate_from_obstacles(&self, others: &[Obstacle]) -> Vec2 {
        let me = self.agent.position();
        let radius = self.agent.radius;
        let desired = radius * 3.0;
        let mut sum = Vec2::ZERO;
        let mut count = 0_usize;
        for other in others {
            let d = me.distance(other.position);
            let minimum = radius + other.radius + DRIFT_CLEARANCE;
            if d > 0.0 && d < desired.max(minimum) {
                sum += (me - other.position).normalized_or_zero() / d;
                count += 1;
            }
        }
        if count == 0 {
            return Vec2::ZERO;
        }
        let average = sum / usize_to_f32(count);
        (average.with_magnitude(self.agent.max_speed()) - self.agent.velocity())
            .limit(self.agent.max_force())
    }

    /// Computes this tick's force without moving.
    pub fn plan<R: Rng + ?Sized>(&mut self, others: &[Obstacle], bounds: &Bounds, rng: &mut R) -> Vec2 {
        let wander = steering::wander(&mut self.agent, rng) * DRIFT_WANDER_WEIGHT;
        let boundary =
            steering::boundaries(&self.agent, bounds, DRIFT_BOUNDARY_MARGIN) * DRIFT_BOUNDARY_WEIGHT;
        let separation = self.separate_from_obstacles(others) * DRIFT_SEPARATION_WEIGHT;
        wander + boundary + separation
    }

    /// Applies a planned force, integrates and clamps to the world.
    pub fn commit(&mut self, force: Vec2, bounds: &Bounds) {
        self.agent.apply_force(force);
        self.agent.integrate();
        let inset = self.agent.radius + DRIFT_CLAMP_INSET;
        let clamped = bounds.clamp_inset(self.agent.position(), inset);
        self.agent.kinematics.position = clamped;
    }
}

/// Static plus moving obstacles with nearest/containment queries.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    /// Immovable obstacles.
    pub statics: Vec<Obstacle>,
    /// Wandering obstacles.
    pub moving: Vec<MovingObstacle>,
}

impl ObstacleField {
    /// Empty field.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statics: Vec::new(),
            moving: Vec::new(),
        }
    }

    /// Flattened view of every obstacle at this instant.
    #[must_use]
    pub fn all(&self) -> Vec<Obstacle> {
        self.statics
            .iter()
            .copied()
            .chain(self.moving.iter().map(MovingObstacle::as_obstacle))
            .collect()
    }

    /// Number of obstacles of both kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statics.len() + self.moving.len()
    }

    /// Whether the field holds no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Obstacle with the nearest centre to `point`.
    #[must_use]
    pub fn nearest(&self, point: Vec2) -> Option<Obstacle> {
        steering::nearest_obstacle(point, &self.all()).copied()
    }

    /// First obstacle containing `point`.
    #[must_use]
    pub fn containing(&self, point: Vec2) -> Option<Obstacle> {
        self.all().into_iter().find(|o| o.contains_point(point))
    }

    /// Removes the static obstacle farthest from `point`.
    pub fn remove_farthest_from(&mut self, point: Vec2) -> Option<Obstacle> {
        let slot = self
            .statics
            .iter()
            .enumerate()
            .max_by_key(|(_, o)| OrderedFloat(o.position.distance_squared(point)))
            .map(|(slot, _)| slot)?;
        let removed = self.statics.remove(slot);
        debug!("despawned obstacle at {:?}", removed.position);
        Some(removed)
    }

    /// Borrows every wandering obstacle for a planning pass.
    ///
    /// `everything` is the pre-tick view from [`ObstacleField::all`]; each
    /// mover keeps clear of every entry but its own.
    pub fn planning_kinds<'a>(
        &'a mut self,
        everything: &'a [Obstacle],
    ) -> impl Iterator<Item = AgentKind<'a>> + 'a {
        self.moving.iter_mut().map(move |mover| {
            let own = mover.as_obstacle();
            let others = everything.iter().copied().filter(|o| *o != own).collect();
            AgentKind::Obstacle { mover, others }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::kind::select_steering;
    use crate::world::{WorldContext, WorldSnapshot};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn nearest_uses_centre_distance() {
        let mut field = ObstacleField::new();
        field.statics.push(Obstacle::new(Vec2::new(100.0, 0.0), 80.0));
        field.statics.push(Obstacle::new(Vec2::new(50.0, 0.0), 5.0));
        let nearest = field.nearest(Vec2::ZERO);
        assert_eq!(nearest, Some(Obstacle::new(Vec2::new(50.0, 0.0), 5.0)));
    }

    #[test]
    fn empty_field_has_no_nearest() {
        assert!(ObstacleField::new().nearest(Vec2::ZERO).is_none());
    }

    #[test]
    fn containment_is_strict() {
        let mut field = ObstacleField::new();
        field.statics.push(Obstacle::new(Vec2::ZERO, 10.0));
        assert!(field.containing(Vec2::new(9.9, 0.0)).is_some());
        assert!(field.containing(Vec2::new(10.0, 0.0)).is_none());
    }

    #[test]
    fn remove_farthest_picks_the_far_one() {
        let mut field = ObstacleField::new();
        field.statics.push(Obstacle::new(Vec2::new(10.0, 0.0), 5.0));
        field.statics.push(Obstacle::new(Vec2::new(500.0, 0.0), 5.0));
        let removed = field.remove_farthest_from(Vec2::ZERO);
        assert_eq!(removed.map(|o| o.position.x), Some(500.0));
        assert_eq!(field.statics.len(), 1);
    }

    #[test]
    fn moving_obstacles_push_apart_and_stay_inside() {
        let mut rng = SmallRng::seed_from_u64(7);
        let bounds = Bounds::new(800.0, 600.0);
        let mut field = ObstacleField::new();
        field
            .moving
            .push(MovingObstacle::new(Vec2::new(400.0, 300.0), 30.0, &mut rng));
        field
            .moving
            .push(MovingObstacle::new(Vec2::new(420.0, 300.0), 30.0, &mut rng));
        let before = field.moving[0].agent.position().distance(field.moving[1].agent.position());
        let ctx = WorldContext::new(bounds, 40.0);
        for _ in 0..120 {
            let snapshot = WorldSnapshot::new(Vec::new(), field.all(), Vec::new());
            let forces: Vec<Vec2> = field
                .planning_kinds(&snapshot.obstacles)
                .map(|mut kind| select_steering(&mut kind, &snapshot, &ctx, &mut rng).force)
                .collect();
            for (mover, force) in field.moving.iter_mut().zip(forces) {
                mover.commit(force, &bounds);
            }
        }
        let after = field.moving[0].agent.position().distance(field.moving[1].agent.position());
        assert!(after > before, "obstacles should drift apart: {before} -> {after}");
        for mover in &field.moving {
            let p = mover.agent.position();
            assert!(p.x >= 45.0 - 1e-3 && p.x <= 755.0 + 1e-3);
            assert!(p.y >= 45.0 - 1e-3 && p.y <= 555.0 + 1e-3);
        }
    }

    #[test]
    fn separation_ignores_distant_obstacles() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mover = MovingObstacle::new(Vec2::ZERO, 10.0, &mut rng);
        let far = [Obstacle::new(Vec2::new(1000.0, 0.0), 10.0)];
        let force = mover.separate_from_obstacles(&far);
        assert_relative_eq!(force.length(), 0.0);
    }
}
