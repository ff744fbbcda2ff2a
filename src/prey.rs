//! Edible prey and collectible power-ups.
//!
//! Both are ordinary steering agents with no memory beyond their wander angle.
//! Prey wanders until a snake head comes within its perception radius, then
//! evades it and pushes away from any snake part it brushes against.
use std::ops::Range;

use glam::Vec2;
use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, SteeringAgent, WanderParams};
use crate::chain::StepPlan;
use crate::constants::POWER_UP_LIFETIME;
use crate::steering;
use crate::world::{AgentClass, AgentView, WorldContext, WorldSnapshot};

/// Boundary margin of prey.
const PREY_MARGIN: f32 = 40.0;
/// Boundary margin of power-ups.
const POWER_UP_MARGIN: f32 = 60.0;
/// Extra gap kept between prey and snake parts.
const BODY_GAP: f32 = 5.0;
/// Weight of the push away from touching snake parts.
const BODY_PUSH_WEIGHT: f32 = 8.0;

/// Flavours of prey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreyKind {
    /// Plain prey.
    Normal,
    /// Large, slow and worth more.
    Bonus,
    /// Shrinks whoever eats it.
    Poison,
    /// Small, fast and jumpy.
    Fleeing,
}

/// Per-kind tuning of prey.
#[derive(Debug, Clone, PartialEq)]
pub struct PreyStats {
    /// Range of the drawn radius.
    pub draw_radius: Range<f32>,
    /// Range of the initial top speed.
    pub speed: Range<f32>,
    /// Range of the top speed rerolled while calm.
    pub calm_speed: Range<f32>,
    /// Top speed while a threat is in sight.
    pub scared_speed: f32,
    /// Force ceiling.
    pub max_force: f32,
    /// Range at which snake heads are noticed.
    pub perception: f32,
    /// Weight of evading the closest head.
    pub flee_weight: f32,
    /// Points awarded to the eater.
    pub points: u32,
}

impl PreyKind {
    /// Tuning of this kind.
    #[must_use]
    pub const fn stats(self) -> PreyStats {
        match self {
            Self::Normal => PreyStats {
                draw_radius: 6.0..10.0,
                speed: 2.0..3.0,
                calm_speed: 2.0..3.0,
                scared_speed: 3.5,
                max_force: 0.12,
                perception: 100.0,
                flee_weight: 2.0,
                points: 10,
            },
            Self::Bonus => PreyStats {
                draw_radius: 10.0..14.0,
                speed: 1.5..2.5,
                calm_speed: 2.0..3.0,
                scared_speed: 3.5,
                max_force: 0.12,
                perception: 100.0,
                flee_weight: 2.0,
                points: 30,
            },
            Self::Poison => PreyStats {
                draw_radius: 7.0..11.0,
                speed: 1.5..2.5,
                calm_speed: 2.0..3.0,
                scared_speed: 3.5,
                max_force: 0.12,
                perception: 100.0,
                flee_weight: 2.0,
                points: 0,
            },
            Self::Fleeing => PreyStats {
                draw_radius: 5.0..8.0,
                speed: 4.0..5.5,
                calm_speed: 4.0..5.0,
                scared_speed: 6.0,
                max_force: 0.2,
                perception: 180.0,
                flee_weight: 4.0,
                points: 50,
            },
        }
    }

    /// Picks a kind for a new spawn; rarer kinds get likelier as
    /// `difficulty` rises.
    pub fn roll<R: Rng + ?Sized>(difficulty: f32, rng: &mut R) -> Self {
        let roll: f32 = rng.random();
        if roll < 0.05 + 0.05 * difficulty {
            Self::Poison
        } else if roll < 0.15 + 0.05 * difficulty {
            Self::Bonus
        } else if roll < 0.22 + 0.08 * difficulty {
            Self::Fleeing
        } else {
            Self::Normal
        }
    }
}

/// A prey agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Prey {
    /// Registry id.
    pub id: AgentId,
    /// Kinematics.
    pub agent: SteeringAgent,
    /// Flavour.
    pub kind: PreyKind,
    /// Drawn radius; the collision radius is twice this.
    pub draw_radius: f32,
    /// Whether a threat was in sight last tick.
    pub scared: bool,
    /// Liveness flag.
    pub alive: bool,
}

impl Prey {
    /// Spawns prey of `kind` at `position` with a random heading.
    pub fn spawn<R: Rng + ?Sized>(id: AgentId, position: Vec2, kind: PreyKind, rng: &mut R) -> Self {
        let stats = kind.stats();
        let draw_radius = rng.random_range(stats.draw_radius);
        let heading = Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU));
        let agent = SteeringAgent::new(position)
            .with_limits(rng.random_range(stats.speed), stats.max_force)
            .with_radius(draw_radius * 2.0)
            .with_avoidance_width(draw_radius)
            .with_velocity(heading * rng.random_range(0.5..1.5))
            .with_wander(WanderParams::new(
                60.0,
                30.0,
                rng.random_range(0.0..std::f32::consts::TAU),
                0.3,
            ));
        Self {
            id,
            agent,
            kind,
            draw_radius,
            scared: false,
            alive: true,
        }
    }

    /// Points earned by eating this prey.
    #[must_use]
    pub fn points(&self) -> u32 {
        self.kind.stats().points
    }

    /// What other agents see of this prey.
    #[must_use]
    pub fn view(&self) -> AgentView {
        let class = if self.kind == PreyKind::Poison {
            AgentClass::PoisonPrey
        } else {
            AgentClass::Prey
        };
        let mut view = AgentView::single(
            self.id,
            class,
            self.agent.position(),
            self.agent.velocity(),
            self.agent.radius,
        );
        view.alive = self.alive;
        view
    }

    /// Composes this tick's force and picks the top speed.
    pub fn plan<R: Rng + ?Sized>(
        &mut self,
        snapshot: &WorldSnapshot,
        ctx: &WorldContext,
        rng: &mut R,
    ) -> StepPlan {
        if !self.alive {
            return StepPlan::default();
        }
        let stats = self.kind.stats();
        let position = self.agent.position();
        let heads: Vec<&AgentView> = snapshot
            .agents()
            .iter()
            .filter(|view| view.alive && view.class.is_snake())
            .collect();

        let mut force = steering::wander(&mut self.agent, rng)
            + steering::avoid_obstacles(&self.agent, &snapshot.obstacles) * 2.0
            + steering::boundaries(&self.agent, &ctx.bounds, PREY_MARGIN) * 5.0;

        let threat = heads
            .iter()
            .map(|head| (*head, position.distance(head.position)))
            .filter(|(_, d)| *d < stats.perception)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        self.scared = threat.is_some();
        if let Some((head, _)) = threat {
            force += steering::evade(&self.agent, head.position, head.velocity) * stats.flee_weight;
            self.agent.set_max_speed(stats.scared_speed);
        } else {
            self.agent.set_max_speed(rng.random_range(stats.calm_speed));
        }

        let mut push = Vec2::ZERO;
        for head in &heads {
            let reach = self.draw_radius + head.radius + BODY_GAP;
            let parts = std::iter::once(head.position).chain(head.segments.iter().copied());
            for part in parts {
                let d = position.distance(part);
                if d < reach {
                    push += (position - part).normalize_or_zero() / d.max(1.0);
                }
            }
        }
        force += push * BODY_PUSH_WEIGHT;
        StepPlan::force(force)
    }

    /// Integrates the planned force.
    pub fn commit(&mut self, force: Vec2) {
        if self.alive {
            self.agent.apply_force(force);
            self.agent.integrate();
        }
    }
}

/// Effects carried by power-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    /// Temporary invulnerability.
    Shield,
    /// Temporary top-speed boost.
    Speed,
    /// Temporary score multiplier.
    Multiplier,
}

impl PowerUpKind {
    /// Uniformly random kind.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random_range(0..3_u8) {
            0 => Self::Shield,
            1 => Self::Speed,
            _ => Self::Multiplier,
        }
    }
}

/// A drifting power-up pickup.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerUp {
    /// Registry id.
    pub id: AgentId,
    /// Kinematics.
    pub agent: SteeringAgent,
    /// Effect granted on pickup.
    pub kind: PowerUpKind,
    /// Ticks left on the field.
    pub lifetime: u32,
}

impl PowerUp {
    /// Spawns a slow-drifting pickup.
    pub fn spawn<R: Rng + ?Sized>(id: AgentId, position: Vec2, kind: PowerUpKind, rng: &mut R) -> Self {
        let heading = Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU));
        let agent = SteeringAgent::new(position)
            .with_limits(1.0, 0.05)
            .with_radius(14.0)
            .with_velocity(heading * 0.5)
            .with_wander(WanderParams::new(
                50.0,
                25.0,
                rng.random_range(0.0..std::f32::consts::TAU),
                0.15,
            ));
        Self {
            id,
            agent,
            kind,
            lifetime: POWER_UP_LIFETIME,
        }
    }

    /// Whether the pickup has run out of time.
    #[must_use]
    pub const fn expired(&self) -> bool {
        self.lifetime == 0
    }

    /// What other agents see of this pickup.
    #[must_use]
    pub fn view(&self) -> AgentView {
        let mut view = AgentView::single(
            self.id,
            AgentClass::PowerUp,
            self.agent.position(),
            self.agent.velocity(),
            self.agent.radius,
        );
        view.alive = !self.expired();
        view
    }

    /// Gentle wander that stays well inside the world.
    pub fn plan<R: Rng + ?Sized>(&mut self, ctx: &WorldContext, rng: &mut R) -> StepPlan {
        StepPlan::force(
            steering::wander(&mut self.agent, rng) * 0.5
                + steering::boundaries(&self.agent, &ctx.bounds, POWER_UP_MARGIN) * 3.0,
        )
    }

    /// Integrates and counts the lifetime down.
    pub fn commit(&mut self, force: Vec2) {
        self.agent.apply_force(force);
        self.agent.integrate();
        self.lifetime = self.lifetime.saturating_sub(1);
        if self.expired() {
            trace!("power-up {} expired", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Bounds;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn ctx() -> WorldContext {
        WorldContext::new(Bounds::new(800.0, 600.0), 40.0)
    }

    fn snake_at(position: Vec2, velocity: Vec2) -> AgentView {
        let mut view = AgentView::single(AgentId(1), AgentClass::Rival, position, velocity, 11.0);
        view.length = 4;
        view
    }

    #[rstest]
    #[case::normal(PreyKind::Normal, 10)]
    #[case::bonus(PreyKind::Bonus, 30)]
    #[case::poison(PreyKind::Poison, 0)]
    #[case::fleeing(PreyKind::Fleeing, 50)]
    fn kinds_award_points(#[case] kind: PreyKind, #[case] points: u32) {
        let mut rng = SmallRng::seed_from_u64(2);
        let prey = Prey::spawn(AgentId(3), Vec2::new(400.0, 300.0), kind, &mut rng);
        assert_eq!(prey.points(), points);
        let stats = kind.stats();
        assert!(stats.draw_radius.contains(&prey.draw_radius));
    }

    #[test]
    fn poison_prey_is_flagged_in_views() {
        let mut rng = SmallRng::seed_from_u64(2);
        let prey = Prey::spawn(AgentId(3), Vec2::ZERO, PreyKind::Poison, &mut rng);
        assert_eq!(prey.view().class, AgentClass::PoisonPrey);
    }

    #[test]
    fn rolls_cover_every_kind() {
        let mut rng = SmallRng::seed_from_u64(11);
        let kinds: Vec<PreyKind> = (0..500).map(|_| PreyKind::roll(1.0, &mut rng)).collect();
        for kind in [PreyKind::Normal, PreyKind::Bonus, PreyKind::Poison, PreyKind::Fleeing] {
            assert!(kinds.contains(&kind), "{kind:?} never rolled");
        }
    }

    #[test]
    fn prey_runs_from_a_close_head() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut prey = Prey::spawn(AgentId(3), Vec2::new(400.0, 300.0), PreyKind::Normal, &mut rng);
        prey.agent.kinematics.velocity = Vec2::ZERO;
        prey.agent.wander.distance = 0.0;
        prey.agent.wander.radius = 0.0;
        let snapshot = WorldSnapshot::new(
            vec![snake_at(Vec2::new(350.0, 300.0), Vec2::ZERO)],
            vec![],
            vec![],
        );
        let plan = prey.plan(&snapshot, &ctx(), &mut rng);
        assert!(prey.scared);
        assert!(plan.force.x > 0.0);
        assert!((prey.agent.max_speed() - 3.5).abs() < f32::EPSILON);
    }

    #[test]
    fn calm_prey_rerolls_its_speed() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut prey = Prey::spawn(AgentId(3), Vec2::new(400.0, 300.0), PreyKind::Fleeing, &mut rng);
        let _ = prey.plan(&WorldSnapshot::default(), &ctx(), &mut rng);
        assert!(!prey.scared);
        assert!((4.0..5.0).contains(&prey.agent.max_speed()));
    }

    #[test]
    fn power_ups_expire() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut pickup = PowerUp::spawn(AgentId(9), Vec2::new(400.0, 300.0), PowerUpKind::Shield, &mut rng);
        for _ in 0..POWER_UP_LIFETIME {
            assert!(!pickup.expired());
            let plan = pickup.plan(&ctx(), &mut rng);
            pickup.commit(plan.force);
        }
        assert!(pickup.expired());
        assert!(!pickup.view().alive);
    }
}
