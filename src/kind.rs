//! Agent roles as one tagged variant, and the function that picks the
//! steering each role runs.
//!
//! Drivers borrow their typed collections into [`AgentKind`] values for the
//! planning pass, call [`select_steering`] on each and commit the resulting
//! plans once every agent has planned.
use glam::Vec2;
use rand::Rng;

use crate::agent::SteeringAgent;
use crate::chain::{segment_force, StepPlan};
use crate::flocking::{Boid, FlockMate};
use crate::horde::{HordeEnemy, HordeWeights, Projectile, Ship};
use crate::obstacle::{MovingObstacle, Obstacle};
use crate::player::PlayerSnake;
use crate::prey::{PowerUp, Prey};
use crate::rival::Rival;
use crate::world::{WorldContext, WorldSnapshot};

/// Something a head can pick up.
#[derive(Debug)]
pub enum Pickup<'a> {
    /// Edible prey.
    Prey(&'a mut Prey),
    /// Power-up.
    PowerUp(&'a mut PowerUp),
}

/// One agent, borrowed for a planning pass, with the role-specific inputs
/// its steering needs.
#[derive(Debug)]
pub enum AgentKind<'a> {
    /// The player snake.
    Player(&'a mut PlayerSnake),
    /// An AI rival snake.
    RivalHead(&'a mut Rival),
    /// A chain segment following its leader.
    BodySegment {
        /// The segment.
        agent: &'a SteeringAgent,
        /// Leader position.
        leader: Vec2,
        /// Desired gap to the leader.
        spacing: f32,
    },
    /// A flocking enemy with its visible mates.
    FlockMember {
        /// The boid.
        boid: &'a mut Boid,
        /// Other flock members as they were before the tick.
        mates: Vec<FlockMate>,
    },
    /// The horde ship with this tick's keyboard direction.
    Ship {
        /// The ship.
        ship: &'a mut Ship,
        /// Input direction; zero when idle.
        direction: Vec2,
    },
    /// A horde enemy with the pre-tick ship and pack.
    Enemy {
        /// The enemy.
        enemy: &'a mut HordeEnemy,
        /// The ship as it was before the tick.
        ship: FlockMate,
        /// Pre-tick positions of every live enemy.
        mates: &'a [Vec2],
        /// Behaviour weights.
        weights: HordeWeights,
    },
    /// A homing projectile with its candidate targets.
    Projectile {
        /// The projectile.
        shot: &'a Projectile,
        /// Targets it may home on.
        targets: &'a [FlockMate],
    },
    /// Prey or a power-up.
    Pickup(Pickup<'a>),
    /// A wandering obstacle with the obstacles it keeps clear of.
    Obstacle {
        /// The obstacle.
        mover: &'a mut MovingObstacle,
        /// Every other obstacle.
        others: Vec<Obstacle>,
    },
}

impl AgentKind<'_> {
    /// Short role name for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Player(_) => "player",
            Self::RivalHead(_) => "rival",
            Self::BodySegment { .. } => "segment",
            Self::FlockMember { .. } => "boid",
            Self::Ship { .. } => "ship",
            Self::Enemy { .. } => "enemy",
            Self::Projectile { .. } => "projectile",
            Self::Pickup(Pickup::Prey(_)) => "prey",
            Self::Pickup(Pickup::PowerUp(_)) => "power-up",
            Self::Obstacle { .. } => "obstacle",
        }
    }

    /// Current position of the agent.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        match self {
            Self::Player(player) => player.head.position(),
            Self::RivalHead(rival) => rival.head.position(),
            Self::BodySegment { agent, .. } => agent.position(),
            Self::FlockMember { boid, .. } => boid.agent.position(),
            Self::Ship { ship, .. } => ship.agent.position(),
            Self::Enemy { enemy, .. } => enemy.agent.position(),
            Self::Projectile { shot, .. } => shot.agent.position(),
            Self::Pickup(Pickup::Prey(prey)) => prey.agent.position(),
            Self::Pickup(Pickup::PowerUp(pickup)) => pickup.agent.position(),
            Self::Obstacle { mover, .. } => mover.agent.position(),
        }
    }

    /// Force of a role whose steering reads only its own inputs and the
    /// obstacles; `None` for roles that need the whole snapshot.
    #[must_use]
    pub fn direct_force(&self, obstacles: &[Obstacle]) -> Option<Vec2> {
        match self {
            Self::BodySegment {
                agent,
                leader,
                spacing,
            } => Some(segment_force(agent, *leader, *spacing)),
            Self::Projectile { shot, targets } => Some(shot.plan(targets, obstacles)),
            Self::Player(_)
            | Self::RivalHead(_)
            | Self::FlockMember { .. }
            | Self::Ship { .. }
            | Self::Enemy { .. }
            | Self::Pickup(_)
            | Self::Obstacle { .. } => None,
        }
    }
}

/// Runs the steering of `kind` against the pre-tick snapshot.
///
/// Only the agent's own memory (wander angle, timers, AI state, shed
/// segments) changes; positions move at commit time.
pub fn select_steering<R: Rng + ?Sized>(
    kind: &mut AgentKind<'_>,
    snapshot: &WorldSnapshot,
    ctx: &WorldContext,
    rng: &mut R,
) -> StepPlan {
    match kind {
        AgentKind::Player(player) => player.plan(snapshot, ctx, rng),
        AgentKind::RivalHead(rival) => rival.plan(snapshot, ctx, rng),
        AgentKind::BodySegment { .. } | AgentKind::Projectile { .. } => {
            StepPlan::force(kind.direct_force(&snapshot.obstacles).unwrap_or(Vec2::ZERO))
        }
        AgentKind::FlockMember { boid, mates } => {
            StepPlan::force(boid.plan(mates, snapshot, ctx, rng))
        }
        AgentKind::Ship { ship, direction } => {
            StepPlan::force(ship.plan(*direction, &snapshot.obstacles, &ctx.bounds))
        }
        AgentKind::Enemy {
            enemy,
            ship,
            mates,
            weights,
        } => StepPlan::force(enemy.plan(ship, mates, &snapshot.obstacles, &ctx.bounds, weights, rng)),
        AgentKind::Pickup(Pickup::Prey(prey)) => prey.plan(snapshot, ctx, rng),
        AgentKind::Pickup(Pickup::PowerUp(pickup)) => pickup.plan(ctx, rng),
        AgentKind::Obstacle { mover, others } => {
            StepPlan::force(mover.plan(others, &ctx.bounds, rng))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::horde::{EnemyKind, ShotOwner};
    use crate::player::PlayerTuning;
    use crate::prey::PreyKind;
    use crate::world::Bounds;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn ctx() -> WorldContext {
        WorldContext::new(Bounds::new(800.0, 600.0), 40.0)
    }

    #[test]
    fn segments_catch_up_with_their_leader() {
        let agent = SteeringAgent::new(Vec2::ZERO).with_limits(5.0, 0.4);
        let mut kind = AgentKind::BodySegment {
            agent: &agent,
            leader: Vec2::new(50.0, 0.0),
            spacing: 13.2,
        };
        let plan = select_steering(&mut kind, &WorldSnapshot::default(), &ctx(), &mut SmallRng::seed_from_u64(1));
        assert!(plan.force.x > 0.0);
        assert_eq!(kind.label(), "segment");
    }

    #[test]
    fn projectiles_home_through_the_dispatch() {
        let shot = Projectile::launch(Vec2::ZERO, Vec2::Y, ShotOwner::Enemy);
        let targets = [FlockMate {
            position: Vec2::new(100.0, 0.0),
            velocity: Vec2::ZERO,
        }];
        let mut kind = AgentKind::Projectile {
            shot: &shot,
            targets: &targets,
        };
        let plan = select_steering(&mut kind, &WorldSnapshot::default(), &ctx(), &mut SmallRng::seed_from_u64(1));
        assert!(plan.force.x > 0.0);
    }

    #[test]
    fn ship_drives_along_its_input_through_the_dispatch() {
        let mut ship = Ship::new(Vec2::new(400.0, 300.0));
        let before = ship.agent.position();
        let mut kind = AgentKind::Ship {
            ship: &mut ship,
            direction: Vec2::X,
        };
        let plan = select_steering(&mut kind, &WorldSnapshot::default(), &ctx(), &mut SmallRng::seed_from_u64(1));
        assert!(plan.force.x > 0.0);
        assert_eq!(kind.position(), before);
    }

    #[test]
    fn enemies_close_on_the_ship_through_the_dispatch() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut enemy = HordeEnemy::spawn(Vec2::new(100.0, 300.0), EnemyKind::Normal, 1, &mut rng);
        enemy.agent.kinematics.velocity = Vec2::ZERO;
        let mates = [enemy.agent.position()];
        let mut kind = AgentKind::Enemy {
            enemy: &mut enemy,
            ship: FlockMate {
                position: Vec2::new(400.0, 300.0),
                velocity: Vec2::ZERO,
            },
            mates: &mates,
            weights: HordeWeights::default(),
        };
        let plan = select_steering(&mut kind, &WorldSnapshot::default(), &ctx(), &mut rng);
        assert!(plan.force.x > 0.0);
        assert_eq!(kind.label(), "enemy");
    }

    #[test]
    fn only_self_contained_roles_have_a_direct_force() {
        let mut rng = SmallRng::seed_from_u64(4);
        let agent = SteeringAgent::new(Vec2::ZERO);
        let segment = AgentKind::BodySegment {
            agent: &agent,
            leader: Vec2::new(30.0, 0.0),
            spacing: 13.2,
        };
        assert!(segment.direct_force(&[]).is_some());
        let mut boid = Boid::new(Vec2::ZERO, &mut rng);
        let flock = AgentKind::FlockMember {
            boid: &mut boid,
            mates: Vec::new(),
        };
        assert!(flock.direct_force(&[]).is_none());
    }

    #[test]
    fn planning_moves_nobody() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut player = PlayerSnake::new(AgentId(0), Vec2::new(400.0, 300.0), PlayerTuning::default(), &mut rng);
        let mut prey = Prey::spawn(AgentId(1), Vec2::new(200.0, 200.0), PreyKind::Normal, &mut rng);
        let mut boid = Boid::new(Vec2::new(600.0, 100.0), &mut rng);
        let before = [player.head.position(), prey.agent.position(), boid.agent.position()];
        let mut kinds = vec![
            AgentKind::Player(&mut player),
            AgentKind::Pickup(Pickup::Prey(&mut prey)),
            AgentKind::FlockMember {
                boid: &mut boid,
                mates: Vec::new(),
            },
        ];
        let snapshot = WorldSnapshot::default();
        let plans: Vec<StepPlan> = kinds
            .iter_mut()
            .map(|kind| select_steering(kind, &snapshot, &ctx(), &mut rng))
            .collect();
        let after: Vec<Vec2> = kinds.iter().map(AgentKind::position).collect();
        assert_eq!(plans.len(), 3);
        assert_eq!(after, before.to_vec());
    }
}
