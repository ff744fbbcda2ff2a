//! Behavioural tests for the headless snake arena.
//!
//! A seeded arena runs for a few hundred ticks under autoplay; population
//! caps, containment and the summary must hold throughout.
use serpentine::arena::{Arena, ArenaEvent};
use serpentine::config::ArenaConfig;

#[derive(Clone, Debug)]
struct Env {
    arena: Arena,
    events: Vec<ArenaEvent>,
}

impl Default for Env {
    fn default() -> Self {
        let config = ArenaConfig {
            seed: 5,
            ..ArenaConfig::default()
        };
        Self {
            arena: Arena::new(config),
            events: Vec::new(),
        }
    }
}

#[test]
fn autoplay_arena_respects_its_limits() {
    rspec::run(&rspec::given("a default arena seeded with 5", Env::default(), |ctx| {
        ctx.when("it runs for three hundred ticks", |ctx| {
            ctx.before_each(|env| {
                env.events.clear();
                for _ in 0..300 {
                    env.events.extend(env.arena.tick());
                }
            });
            ctx.then("food and moving obstacles stay under their caps", |env| {
                let config = &env.arena.config;
                assert!(env.arena.food.len() <= config.max_food);
                assert!(env.arena.obstacles.moving.len() <= config.max_moving_obstacles);
                assert!(env.arena.boids.len() <= config.max_boids);
            });
            ctx.then("prey is topped up to its population", |env| {
                assert_eq!(env.arena.prey.len(), env.arena.config.max_prey);
            });
            ctx.then("snake heads stay inside the world", |env| {
                let bounds = env.arena.ctx.bounds;
                assert!(bounds.contains_with_slack(env.arena.player.head.position(), 0.0));
                for rival in &env.arena.rivals {
                    assert!(bounds.contains_with_slack(rival.head.position(), 0.0));
                }
            });
            ctx.then("every boid and prey position is finite", |env| {
                assert!(env.arena.boids.iter().all(|(_, b)| b.agent.position().is_finite()));
                assert!(env.arena.prey.iter().all(|p| p.agent.position().is_finite()));
            });
            ctx.then("the player dies at most once", |env| {
                let deaths = env
                    .events
                    .iter()
                    .filter(|e| matches!(e, ArenaEvent::AgentDied { id, .. } if *id == env.arena.player.id))
                    .count();
                assert!(deaths <= 1);
            });
            ctx.then("the summary reports the tick count", |env| {
                let summary = env.arena.summary();
                assert!(summary.tick >= 300);
                assert_eq!(summary.rivals.len(), env.arena.config.rivals);
            });
        });
    }));
}
