#![cfg_attr(docsrs, feature(doc_cfg))]
//! Steering-behaviour engine and per-tick agent AI for arena games.
//!
//! The crate covers two games that share one toolkit of Reynolds-style
//! forces: a snake arena (player, rival snakes, prey, boids, power-ups) and a
//! twin-stick survival horde. Rendering and input stay outside; drivers build
//! a [`WorldSnapshot`] each tick, let every agent plan against it and then
//! commit the planned forces.
pub mod agent;
pub mod arena;
pub mod chain;
pub mod collider;
pub mod collision;
pub mod config;
pub mod constants;
pub mod dash;
pub mod flocking;
pub mod horde;
pub mod kind;
pub mod kinematics;
pub mod logging;
pub mod numeric;
pub mod obstacle;
pub mod player;
pub mod prey;
pub mod rival;
pub mod steering;
pub mod vector_math;
pub mod world;

// Re-export commonly used items
pub use agent::{AgentId, SteeringAgent, WanderParams};
pub use arena::{Arena, ArenaEvent, ArenaSummary};
pub use chain::{Chain, StepPlan};
pub use collision::{resolve_all, resolve_pair, CollisionOutcome};
pub use config::{ArenaConfig, ConfigError};
pub use flocking::{Boid, FlockMate};
pub use horde::{Horde, HordeEvent, ShipInput};
pub use kind::{select_steering, AgentKind};
pub use logging::init as init_logging;
pub use obstacle::{MovingObstacle, Obstacle, ObstacleField};
pub use player::PlayerSnake;
pub use prey::{PowerUp, Prey};
pub use rival::Rival;
pub use vector_math::VecExt;
pub use world::{AgentClass, AgentView, Bounds, WorldContext, WorldSnapshot};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust
    //! use serpentine::prelude::*;
    //!
    //! let mut agent = SteeringAgent::new(Vec2::ZERO).with_limits(4.0, 0.2);
    //! let force = steering::seek(&agent, Vec2::new(100.0, 0.0));
    //! agent.apply_force(force);
    //! agent.integrate();
    //! assert!(agent.position().x > 0.0);
    //! ```

    pub use crate::agent::{AgentId, SteeringAgent, WanderParams};
    pub use crate::chain::StepPlan;
    pub use crate::obstacle::Obstacle;
    pub use crate::steering;
    pub use crate::vector_math::VecExt;
    pub use crate::world::{Bounds, WorldContext, WorldSnapshot};
    pub use glam::Vec2;
}
