//! Behavioural tests for the rival decision loop.
//!
//! A short rival is placed next to a much longer player and the state
//! machine is stepped against a fixed snapshot.
use glam::Vec2;
use serpentine::agent::AgentId;
use serpentine::rival::{AiState, Rival};
use serpentine::world::{AgentClass, WorldContext, WorldSnapshot};
use test_utils::fixtures::{rival_with_length, seeded_rng, snake_view, world};

#[derive(Clone, Debug)]
struct Env {
    rival: Rival,
    snapshot: WorldSnapshot,
    ctx: WorldContext,
    threat: Vec2,
}

impl Env {
    fn new(threat_alive: bool) -> Self {
        let threat = Vec2::new(520.0, 400.0);
        let mut player = snake_view(0, AgentClass::Player, threat, 20, 14.0);
        player.alive = threat_alive;
        Self {
            rival: rival_with_length(1, Vec2::new(600.0, 400.0), 4),
            snapshot: WorldSnapshot::new(vec![player], Vec::new(), Vec::new()),
            ctx: world(),
            threat,
        }
    }
}

#[test]
fn short_rival_runs_from_a_long_player() {
    rspec::run(&rspec::given(
        "a four link rival eighty units from a twenty link player",
        Env::new(true),
        |ctx| {
            ctx.when("the rival decides", |ctx| {
                ctx.before_each(|env| {
                    env.rival.decide(&env.snapshot, &mut seeded_rng(4));
                });
                ctx.then("it flees the player", |env| {
                    assert_eq!(env.rival.state, AiState::Fleeing);
                    assert_eq!(env.rival.target, Some(AgentId(0)));
                });
            });

            ctx.when("it plans and moves for forty ticks", |ctx| {
                ctx.before_each(|env| {
                    let mut rng = seeded_rng(8);
                    for _ in 0..40 {
                        let plan = env.rival.plan(&env.snapshot, &env.ctx, &mut rng);
                        env.rival.commit(plan.force, &env.ctx.bounds, &[]);
                    }
                });
                ctx.then("it ends up farther from the threat", |env| {
                    let distance = env.rival.head.position().distance(env.threat);
                    assert!(distance > 80.0, "rival only {distance} away");
                    assert!(env.rival.alive);
                });
            });
        },
    ));
}

#[test]
fn rival_stops_fleeing_a_dead_threat() {
    rspec::run(&rspec::given(
        "a rival fleeing a player that has just died",
        Env::new(false),
        |ctx| {
            ctx.before_each(|env| {
                env.rival.state = AiState::Fleeing;
                env.rival.target = Some(AgentId(0));
                env.rival.decide(&env.snapshot, &mut seeded_rng(2));
            });
            ctx.then("it goes back to foraging", |env| {
                assert_eq!(env.rival.state, AiState::Foraging);
                assert_eq!(env.rival.target, None);
            });
        },
    ));
}
