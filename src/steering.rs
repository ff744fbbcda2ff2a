//! Reynolds-style steering primitives.
//!
//! Every function reads an agent (plus external data) and returns a force that
//! has not been applied yet; callers weight and accumulate the results. Forces
//! built on "desired velocity minus current velocity" are clamped to the
//! agent's `max_force`.
//!
//! Empty neighbour or obstacle lists are not errors: they produce the zero
//! vector. So does any degenerate geometry, through the zero-normalisation
//! policy of [`crate::vector_math`].
use glam::Vec2;
use ordered_float::OrderedFloat;
use rand::Rng;

use crate::agent::SteeringAgent;
use crate::constants::{AVOID_LOOKAHEAD_FLOOR, AVOID_LOOKAHEAD_TICKS, PURSUIT_LOOKAHEAD, SLOW_RADIUS};
use crate::numeric::{map_range, usize_to_f32};
use crate::obstacle::Obstacle;
use crate::vector_math::{point_on_circle, VecExt};
use crate::world::Bounds;

/// Turns a desired velocity into a clamped steering force.
#[must_use]
pub fn steer_towards_velocity(agent: &SteeringAgent, desired: Vec2) -> Vec2 {
    (desired - agent.velocity()).limit(agent.max_force())
}

/// Speed an agent wants when `distance` away from its target.
///
/// Outside [`SLOW_RADIUS`] (or without `arrival`) this is `max_speed`; inside
/// it falls linearly to zero.
#[must_use]
pub fn desired_speed(max_speed: f32, distance: f32, arrival: bool) -> f32 {
    if arrival && distance < SLOW_RADIUS {
        map_range(distance, 0.0, SLOW_RADIUS, 0.0, max_speed)
    } else {
        max_speed
    }
}

/// Seek `target`, optionally decelerating inside the slow radius.
#[must_use]
pub fn seek_with(agent: &SteeringAgent, target: Vec2, arrival: bool) -> Vec2 {
    let offset = target - agent.position();
    let speed = desired_speed(agent.max_speed(), offset.length(), arrival);
    steer_towards_velocity(agent, offset.with_magnitude(speed))
}

/// Head straight for `target` at full speed.
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use serpentine::agent::SteeringAgent;
/// use serpentine::steering::seek;
///
/// let agent = SteeringAgent::new(Vec2::ZERO).with_limits(4.0, 0.2);
/// let force = seek(&agent, Vec2::new(100.0, 0.0));
/// assert!((force.x - 0.2).abs() < 1e-6);
/// assert!(force.y.abs() < 1e-6);
/// ```
#[must_use]
pub fn seek(agent: &SteeringAgent, target: Vec2) -> Vec2 {
    seek_with(agent, target, false)
}

/// Seek that slows down inside [`SLOW_RADIUS`].
#[must_use]
pub fn arrive(agent: &SteeringAgent, target: Vec2) -> Vec2 {
    seek_with(agent, target, true)
}

/// The exact negation of [`seek`].
#[must_use]
pub fn flee(agent: &SteeringAgent, target: Vec2) -> Vec2 {
    -seek(agent, target)
}

/// Linear prediction of where a mover will be after [`PURSUIT_LOOKAHEAD`] ticks.
#[must_use]
pub fn predicted_position(position: Vec2, velocity: Vec2) -> Vec2 {
    position + velocity * PURSUIT_LOOKAHEAD
}

/// Seek the predicted position of a moving target.
#[must_use]
pub fn pursue(agent: &SteeringAgent, target_position: Vec2, target_velocity: Vec2) -> Vec2 {
    seek(agent, predicted_position(target_position, target_velocity))
}

/// The exact negation of [`pursue`].
#[must_use]
pub fn evade(agent: &SteeringAgent, target_position: Vec2, target_velocity: Vec2) -> Vec2 {
    -pursue(agent, target_position, target_velocity)
}

/// Smooth pseudo-random heading changes.
///
/// Projects a circle `wander.distance` ahead along the current heading and
/// steers toward the point at `wander.theta + heading` on it, with the force
/// magnitude fixed at `max_force`. Afterwards `wander.theta` drifts by a
/// uniform delta in `±displace_range`, so successive ticks stay correlated.
pub fn wander<R: Rng + ?Sized>(agent: &mut SteeringAgent, rng: &mut R) -> Vec2 {
    let position = agent.position();
    let velocity = agent.velocity();
    let centre = position + velocity.with_magnitude(agent.wander.distance);
    let theta = agent.wander.theta + velocity.heading();
    let target = point_on_circle(centre, agent.wander.radius, theta);

    let range = agent.wander.displace_range;
    if range > 0.0 {
        agent.wander.theta += rng.random_range(-range..=range);
    }

    (target - position).with_magnitude(agent.max_force())
}

/// Obstacle with the nearest centre to `point`.
#[must_use]
pub fn nearest_obstacle(point: Vec2, obstacles: &[Obstacle]) -> Option<&Obstacle> {
    obstacles
        .iter()
        .min_by_key(|o| OrderedFloat(o.position.distance_squared(point)))
}

/// The two forward probes used by [`avoid_obstacles`]: far and half-way.
#[must_use]
pub fn lookahead_points(agent: &SteeringAgent) -> (Vec2, Vec2) {
    let velocity = agent.velocity();
    let speed = velocity.length();
    let reach = if speed > f32::EPSILON {
        (speed * AVOID_LOOKAHEAD_TICKS).max(AVOID_LOOKAHEAD_FLOOR)
    } else {
        0.0
    };
    let ahead = velocity.with_magnitude(reach);
    let position = agent.position();
    (position + ahead, position + ahead * 0.5)
}

/// Repulsion from the single nearest obstacle when a probe enters its
/// danger zone.
///
/// Only the obstacle with the nearest centre is considered each tick, even
/// when several are close. The danger distance is the minimum of the two
/// probe distances (and the raw body distance when
/// [`SteeringAgent::avoid_checks_body`] is set). When it is below
/// `obstacle.radius + avoidance_width` the force points from the obstacle to
/// the closest probe, at full speed, minus the current velocity.
#[must_use]
pub fn avoid_obstacles(agent: &SteeringAgent, obstacles: &[Obstacle]) -> Vec2 {
    let position = agent.position();
    let Some(nearest) = nearest_obstacle(position, obstacles) else {
        return Vec2::ZERO;
    };
    let (far, near) = lookahead_points(agent);
    let far_distance = far.distance(nearest.position);
    let near_distance = near.distance(nearest.position);

    let (mut probe, mut danger) = if far_distance < near_distance {
        (far, far_distance)
    } else {
        (near, near_distance)
    };
    if agent.avoid_checks_body {
        let body_distance = position.distance(nearest.position);
        if body_distance < danger {
            probe = position;
            danger = body_distance;
        }
    }

    if danger >= nearest.radius + agent.avoidance_width {
        return Vec2::ZERO;
    }
    let away = (probe - nearest.position).with_magnitude(agent.max_speed());
    steer_towards_velocity(agent, away)
}

/// Averaged raw repulsion used by [`separate`].
///
/// Each neighbour strictly between 0 and `desired_separation` away adds its
/// normalised offset divided by the distance. Returns `None` when nobody is
/// close enough.
#[must_use]
pub fn separation_push<I>(position: Vec2, neighbours: I, desired_separation: f32) -> Option<Vec2>
where
    I: IntoIterator<Item = Vec2>,
{
    let mut sum = Vec2::ZERO;
    let mut count = 0_usize;
    for other in neighbours {
        let d = position.distance(other);
        if d > 0.0 && d < desired_separation {
            sum += (position - other).normalized_or_zero() / d;
            count += 1;
        }
    }
    (count > 0).then(|| sum / usize_to_f32(count))
}

/// Keep clear of neighbours closer than `desired_separation`.
#[must_use]
pub fn separate<I>(agent: &SteeringAgent, neighbours: I, desired_separation: f32) -> Vec2
where
    I: IntoIterator<Item = Vec2>,
{
    match separation_push(agent.position(), neighbours, desired_separation) {
        Some(push) if push.length_squared() > 0.0 => {
            steer_towards_velocity(agent, push.with_magnitude(agent.max_speed()))
        }
        _ => Vec2::ZERO,
    }
}

/// Hard-margin containment.
///
/// Within `margin` of an edge the matching velocity component is replaced by
/// `max_speed` pointing inward (the other component is kept), the result is
/// rescaled to `max_speed` and turned into a clamped steering force. Away from
/// every edge the force is zero.
#[must_use]
pub fn boundaries(agent: &SteeringAgent, bounds: &Bounds, margin: f32) -> Vec2 {
    let position = agent.position();
    let max_speed = agent.max_speed();
    let min = bounds.origin;
    let max = bounds.max();
    let mut desired = agent.velocity();
    let mut triggered = false;

    if position.x < min.x + margin {
        desired.x = max_speed;
        triggered = true;
    } else if position.x > max.x - margin {
        desired.x = -max_speed;
        triggered = true;
    }
    if position.y < min.y + margin {
        desired.y = max_speed;
        triggered = true;
    } else if position.y > max.y - margin {
        desired.y = -max_speed;
        triggered = true;
    }

    if !triggered {
        return Vec2::ZERO;
    }
    steer_towards_velocity(agent, desired.with_magnitude(max_speed))
}

/// Direct push away from every obstacle closer than `radius + clearance`.
///
/// Unlike [`avoid_obstacles`] this considers all obstacles and is not
/// clamped: the push per obstacle falls linearly from `push_speed` at contact
/// to zero at the envelope edge.
#[must_use]
pub fn obstacle_proximity_push(position: Vec2, obstacles: &[Obstacle], clearance: f32, push_speed: f32) -> Vec2 {
    obstacles
        .iter()
        .filter_map(|obstacle| {
            let d = position.distance(obstacle.position);
            let safe = obstacle.radius + clearance;
            (d > 0.0 && d < safe).then(|| {
                (position - obstacle.position).normalized_or_zero()
                    * map_range(d, 0.0, safe, push_speed, 0.0)
            })
        })
        .sum()
}

/// Repulsion from trailing body segments within `danger_distance`.
///
/// Each segment contributes its unit offset scaled by
/// `danger_distance / distance`, growing sharply at close range. Heads are
/// never passed in; head contact is a collision event, not something to
/// avoid.
#[must_use]
pub fn body_avoidance<I>(position: Vec2, segments: I, danger_distance: f32) -> Vec2
where
    I: IntoIterator<Item = Vec2>,
{
    segments
        .into_iter()
        .filter_map(|segment| {
            let d = position.distance(segment);
            (d > 0.0 && d < danger_distance)
                .then(|| (position - segment).normalized_or_zero() * (danger_distance / d))
        })
        .sum()
}

/// Nearest point among `candidates` within `radius` of `origin`.
#[must_use]
pub fn nearest_within<I>(origin: Vec2, candidates: I, radius: f32) -> Option<(Vec2, f32)>
where
    I: IntoIterator<Item = Vec2>,
{
    candidates
        .into_iter()
        .map(|point| (point, origin.distance(point)))
        .filter(|(_, d)| *d < radius)
        .min_by_key(|(_, d)| OrderedFloat(*d))
}
