//! Circle colliders shared by every agent, obstacle and pickup.
use glam::Vec2;

use crate::agent::SteeringAgent;

/// Anything with a circular collision footprint.
pub trait CircleCollider {
    /// Centre of the circle.
    fn centre(&self) -> Vec2;
    /// Radius of the circle.
    fn collision_radius(&self) -> f32;

    /// Strict containment test for a point.
    fn contains_point(&self, point: Vec2) -> bool {
        point.distance(self.centre()) < self.collision_radius()
    }
}

/// A bare circle, used for pickups and ad-hoc probes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Centre.
    pub centre: Vec2,
    /// Radius.
    pub radius: f32,
}

impl Circle {
    /// Builds a circle.
    #[must_use]
    pub const fn new(centre: Vec2, radius: f32) -> Self {
        Self { centre, radius }
    }
}

impl CircleCollider for Circle {
    fn centre(&self) -> Vec2 {
        self.centre
    }

    fn collision_radius(&self) -> f32 {
        self.radius
    }
}

impl CircleCollider for SteeringAgent {
    fn centre(&self) -> Vec2 {
        self.position()
    }

    fn collision_radius(&self) -> f32 {
        self.radius
    }
}

/// Returns `true` when the two circles strictly overlap.
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use serpentine::collider::{overlaps, Circle};
/// let a = Circle::new(Vec2::ZERO, 5.0);
/// let b = Circle::new(Vec2::new(9.0, 0.0), 5.0);
/// let c = Circle::new(Vec2::new(10.0, 0.0), 5.0);
/// assert!(overlaps(&a, &b));
/// assert!(!overlaps(&a, &c));
/// ```
pub fn overlaps<A, B>(a: &A, b: &B) -> bool
where
    A: CircleCollider + ?Sized,
    B: CircleCollider + ?Sized,
{
    within_reach(a.centre(), b.centre(), a.collision_radius() + b.collision_radius())
}

/// Returns `true` when two points are strictly closer than `reach`.
#[must_use]
pub fn within_reach(a: Vec2, b: Vec2, reach: f32) -> bool {
    a.distance_squared(b) < reach * reach
}
