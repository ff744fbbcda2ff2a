//! Boid swarms: alignment, cohesion and inverse-square separation.
//!
//! A flock is a plain slice of [`Boid`]s owned by the caller. [`step_flock`]
//! plans every member against the same pre-tick view of its mates and only
//! then integrates, so iteration order never leaks into the result.
use glam::Vec2;
use log::trace;
use rand::Rng;

use crate::agent::{SteeringAgent, WanderParams};
use crate::numeric::usize_to_f32;
use crate::steering;
use crate::vector_math::VecExt;
use crate::world::{AgentClass, WorldContext, WorldSnapshot};

/// What a boid can see of a flock mate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockMate {
    /// Mate position.
    pub position: Vec2,
    /// Mate velocity.
    pub velocity: Vec2,
}

impl From<&SteeringAgent> for FlockMate {
    fn from(agent: &SteeringAgent) -> Self {
        Self {
            position: agent.position(),
            velocity: agent.velocity(),
        }
    }
}

/// Steer towards the average heading of mates within `perception`.
#[must_use]
pub fn align(agent: &SteeringAgent, mates: &[FlockMate], perception: f32) -> Vec2 {
    let position = agent.position();
    let (sum, count) = mates
        .iter()
        .filter(|mate| position.distance(mate.position) < perception)
        .fold((Vec2::ZERO, 0_usize), |(sum, count), mate| {
            (sum + mate.velocity, count + 1)
        });
    if count == 0 {
        return Vec2::ZERO;
    }
    let average = sum / usize_to_f32(count);
    steering::steer_towards_velocity(agent, average.with_magnitude(agent.max_speed()))
}

/// Steer towards the centre of mates within twice `perception`.
#[must_use]
pub fn cohesion(agent: &SteeringAgent, mates: &[FlockMate], perception: f32) -> Vec2 {
    let position = agent.position();
    let reach = perception * 2.0;
    let (sum, count) = mates
        .iter()
        .filter(|mate| position.distance(mate.position) < reach)
        .fold((Vec2::ZERO, 0_usize), |(sum, count), mate| {
            (sum + mate.position, count + 1)
        });
    if count == 0 {
        return Vec2::ZERO;
    }
    let centre = sum / usize_to_f32(count);
    steering::steer_towards_velocity(agent, (centre - position).with_magnitude(agent.max_speed()))
}

/// Raw averaged flock repulsion: each mate within `perception` adds
/// `offset / d²`. Coincident mates are skipped.
#[must_use]
pub fn flock_separation_push(position: Vec2, mates: &[FlockMate], perception: f32) -> Option<Vec2> {
    let mut sum = Vec2::ZERO;
    let mut count = 0_usize;
    for mate in mates {
        let offset = position - mate.position;
        let d_sq = offset.length_squared();
        if d_sq > 0.0 && d_sq < perception * perception {
            sum += offset / d_sq;
            count += 1;
        }
    }
    (count > 0).then(|| sum / usize_to_f32(count))
}

/// Keep clear of crowding mates using the inverse-square falloff.
///
/// This intentionally differs from [`steering::separate`]; the flock weights
/// are tuned against it.
#[must_use]
pub fn flock_separation(agent: &SteeringAgent, mates: &[FlockMate], perception: f32) -> Vec2 {
    match flock_separation_push(agent.position(), mates, perception) {
        Some(push) if push.length_squared() > 0.0 => {
            steering::steer_towards_velocity(agent, push.with_magnitude(agent.max_speed()))
        }
        _ => Vec2::ZERO,
    }
}

/// Behaviour weights of a flocking enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockWeights {
    /// Alignment weight.
    pub align: f32,
    /// Cohesion weight.
    pub cohesion: f32,
    /// Separation weight.
    pub separation: f32,
    /// Boundary weight.
    pub boundaries: f32,
    /// Weight of fleeing from the player head.
    pub flee: f32,
    /// Obstacle avoidance weight.
    pub avoid: f32,
    /// Wander weight.
    pub wander: f32,
}

impl Default for FlockWeights {
    fn default() -> Self {
        Self {
            align: 1.5,
            cohesion: 1.0,
            separation: 2.0,
            boundaries: 10.0,
            flee: 4.0,
            avoid: 3.0,
            wander: 0.3,
        }
    }
}

/// Rival heads are noticed over a shorter range than the player.
const RIVAL_THREAT_RANGE: f32 = 0.8;
/// And fled from with less urgency.
const RIVAL_THREAT_WEIGHT: f32 = 0.7;

/// A flocking enemy that scatters from snake heads.
#[derive(Debug, Clone, PartialEq)]
pub struct Boid {
    /// Kinematics and wander memory.
    pub agent: SteeringAgent,
    /// Radius used by align and separation; cohesion uses twice this.
    pub perception: f32,
    /// Range at which the player head is fled from.
    pub threat_perception: f32,
    /// Boundary margin.
    pub margin: f32,
    /// Behaviour weights.
    pub weights: FlockWeights,
}

impl Boid {
    /// Spawns a boid heading in a random direction.
    pub fn new<R: Rng + ?Sized>(position: Vec2, rng: &mut R) -> Self {
        let heading = Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU));
        let agent = SteeringAgent::new(position)
            .with_limits(4.0, 0.25)
            .with_radius(8.0)
            .with_velocity(heading * rng.random_range(2.0..4.0))
            .with_wander(WanderParams::new(
                100.0,
                40.0,
                rng.random_range(0.0..std::f32::consts::TAU),
                0.2,
            ));
        Self {
            agent,
            perception: 50.0,
            threat_perception: 180.0,
            margin: 30.0,
            weights: FlockWeights::default(),
        }
    }

    /// Flee forces from every live snake head in range.
    #[must_use]
    pub fn flee_threats(&self, snapshot: &WorldSnapshot) -> Vec2 {
        let position = self.agent.position();
        let mut total = Vec2::ZERO;
        for view in snapshot.agents().iter().filter(|v| v.alive) {
            let (range, weight) = match view.class {
                AgentClass::Player => (self.threat_perception, self.weights.flee),
                AgentClass::Rival => (
                    self.threat_perception * RIVAL_THREAT_RANGE,
                    self.weights.flee * RIVAL_THREAT_WEIGHT,
                ),
                _ => continue,
            };
            if position.distance(view.position) < range {
                total += steering::flee(&self.agent, view.position) * weight;
            }
        }
        total
    }

    /// Weighted sum of every force acting on this boid this tick.
    pub fn plan<R: Rng + ?Sized>(
        &mut self,
        mates: &[FlockMate],
        snapshot: &WorldSnapshot,
        ctx: &WorldContext,
        rng: &mut R,
    ) -> Vec2 {
        let w = self.weights;
        let flocking = align(&self.agent, mates, self.perception) * w.align
            + cohesion(&self.agent, mates, self.perception) * w.cohesion
            + flock_separation(&self.agent, mates, self.perception) * w.separation;
        let wander = steering::wander(&mut self.agent, rng) * w.wander;
        let flee = self.flee_threats(snapshot);
        let avoid = steering::avoid_obstacles(&self.agent, &snapshot.obstacles) * w.avoid;
        let bounds = steering::boundaries(&self.agent, &ctx.bounds, self.margin) * w.boundaries;
        flocking + wander + flee + avoid + bounds
    }

    /// Applies a planned force and integrates.
    pub fn commit(&mut self, force: Vec2) {
        self.agent.apply_force(force);
        self.agent.integrate();
    }
}

/// Advances a whole flock by one tick.
///
/// Every member sees its mates as they were before anyone moved.
pub fn step_flock<R: Rng + ?Sized>(
    boids: &mut [Boid],
    snapshot: &WorldSnapshot,
    ctx: &WorldContext,
    rng: &mut R,
) {
    let view: Vec<FlockMate> = boids.iter().map(|boid| FlockMate::from(&boid.agent)).collect();
    let forces: Vec<Vec2> = boids
        .iter_mut()
        .enumerate()
        .map(|(slot, boid)| {
            let mates: Vec<FlockMate> = view
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != slot)
                .map(|(_, mate)| *mate)
                .collect();
            boid.plan(&mates, snapshot, ctx, rng)
        })
        .collect();
    for (boid, force) in boids.iter_mut().zip(forces) {
        boid.commit(force);
    }
    trace!("flock of {} stepped", boids.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::world::{AgentView, Bounds};
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn mate(x: f32, y: f32, vx: f32, vy: f32) -> FlockMate {
        FlockMate {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
        }
    }

    fn still(position: Vec2) -> SteeringAgent {
        SteeringAgent::new(position).with_limits(4.0, 0.25)
    }

    #[test]
    fn align_matches_mate_heading() {
        let force = align(&still(Vec2::ZERO), &[mate(10.0, 0.0, 0.0, 3.0)], 50.0);
        assert_relative_eq!(force.x, 0.0);
        assert!(force.y > 0.0);
    }

    #[test]
    fn cohesion_reaches_twice_as_far() {
        let mates = [mate(80.0, 0.0, 0.0, 0.0)];
        assert_eq!(align(&still(Vec2::ZERO), &mates, 50.0), Vec2::ZERO);
        assert!(cohesion(&still(Vec2::ZERO), &mates, 50.0).x > 0.0);
    }

    #[rstest]
    #[case(2.0, 4.0)]
    #[case(4.0, 10.0)]
    #[case(10.0, 30.0)]
    fn separation_weakens_with_distance(#[case] near: f32, #[case] far: f32) {
        let close = flock_separation_push(Vec2::ZERO, &[mate(near, 0.0, 0.0, 0.0)], 50.0);
        let distant = flock_separation_push(Vec2::ZERO, &[mate(far, 0.0, 0.0, 0.0)], 50.0);
        let (Some(close), Some(distant)) = (close, distant) else {
            panic!("both mates are within perception");
        };
        assert!(close.length() > distant.length());
    }

    #[test]
    fn separation_skips_coincident_mates() {
        assert!(flock_separation_push(Vec2::ZERO, &[mate(0.0, 0.0, 1.0, 0.0)], 50.0).is_none());
        assert_eq!(flock_separation(&still(Vec2::ZERO), &[], 50.0), Vec2::ZERO);
    }

    #[test]
    fn boids_flee_the_player_more_than_rivals() {
        let mut rng = SmallRng::seed_from_u64(11);
        let boid = Boid::new(Vec2::new(100.0, 100.0), &mut rng);
        let player = AgentView::single(
            AgentId(1),
            AgentClass::Player,
            Vec2::new(100.0, 60.0),
            Vec2::ZERO,
            14.0,
        );
        let rival = AgentView::single(
            AgentId(2),
            AgentClass::Rival,
            Vec2::new(100.0, 60.0),
            Vec2::ZERO,
            11.0,
        );
        let from_player = boid.flee_threats(&WorldSnapshot::new(vec![player], vec![], vec![]));
        let from_rival = boid.flee_threats(&WorldSnapshot::new(vec![rival], vec![], vec![]));
        assert!(from_player.length() > from_rival.length());
        assert!(from_player.y > 0.0);
    }

    #[test]
    fn flock_step_keeps_speed_limits() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut boids: Vec<Boid> = (0..8)
            .map(|i| Boid::new(Vec2::new(200.0 + 10.0 * i as f32, 200.0), &mut rng))
            .collect();
        let ctx = WorldContext::new(Bounds::new(800.0, 600.0), 30.0);
        let snapshot = WorldSnapshot::default();
        for _ in 0..100 {
            step_flock(&mut boids, &snapshot, &ctx, &mut rng);
        }
        for boid in &boids {
            assert!(boid.agent.velocity().length() <= boid.agent.max_speed() + 1e-4);
            assert!(boid.agent.position().is_finite());
        }
    }
}
