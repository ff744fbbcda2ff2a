//! Convenience constructors for agents, snakes and worlds used in tests.
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serpentine::agent::{AgentId, SteeringAgent};
use serpentine::numeric::usize_to_f32;
use serpentine::obstacle::Obstacle;
use serpentine::rival::{Rival, RivalPalette, SkillProfile, RIVAL_SEG_SIZE};
use serpentine::world::{AgentClass, AgentView, Bounds, WorldContext};

/// Width of the standard test world.
pub const WORLD_WIDTH: f32 = 1200.0;
/// Height of the standard test world.
pub const WORLD_HEIGHT: f32 = 800.0;

/// Deterministic generator for wander and spawn rolls.
///
/// # Examples
/// ```
/// use rand::Rng;
/// use test_utils::fixtures::seeded_rng;
/// let a: f32 = seeded_rng(3).random();
/// let b: f32 = seeded_rng(3).random();
/// assert_eq!(a, b);
/// ```
#[must_use]
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// A resting agent at `(x, y)` with default limits.
#[must_use]
pub fn agent_at(x: f32, y: f32) -> SteeringAgent {
    SteeringAgent::new(Vec2::new(x, y))
}

/// An agent at `position` already moving with `velocity`.
#[must_use]
pub fn moving_agent(position: Vec2, velocity: Vec2) -> SteeringAgent {
    SteeringAgent::new(position).with_velocity(velocity)
}

/// A static obstacle.
#[must_use]
pub const fn obstacle(x: f32, y: f32, radius: f32) -> Obstacle {
    Obstacle::new(Vec2::new(x, y), radius)
}

/// The standard test world with a 40 unit margin.
#[must_use]
pub const fn world() -> WorldContext {
    WorldContext::new(Bounds::new(WORLD_WIDTH, WORLD_HEIGHT), 40.0)
}

/// A mid-skill rival with `length` chain links (head included) at
/// `position`.
#[must_use]
pub fn rival_with_length(id: u32, position: Vec2, length: usize) -> Rival {
    Rival::new(
        AgentId(id),
        position,
        length.saturating_sub(1),
        RIVAL_SEG_SIZE,
        SkillProfile::centred(0.5, RIVAL_SEG_SIZE),
        RivalPalette::default(),
    )
}

/// A snake view with a straight body trailing to the left of `head`.
#[must_use]
pub fn snake_view(id: u32, class: AgentClass, head: Vec2, length: usize, seg_size: f32) -> AgentView {
    let segments = (1..length)
        .map(|i| head - Vec2::new(seg_size * usize_to_f32(i), 0.0))
        .collect();
    AgentView {
        id: AgentId(id),
        class,
        position: head,
        velocity: Vec2::ZERO,
        radius: seg_size,
        length,
        alive: true,
        shielded: false,
        segments,
    }
}
