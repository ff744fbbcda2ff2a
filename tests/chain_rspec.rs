//! Behavioural tests for snake bodies trailing their head.
//!
//! A ten segment chain is laid out behind a head and either left alone or
//! dragged across the world; the segments must keep formation behind it.
use glam::Vec2;
use serpentine::chain::{Chain, ChainStyle};
use serpentine::world::{Bounds, Rgb};
use test_utils::assert_vec_near;

const SEG_SIZE: f32 = 14.0;
const SEGMENT_SPEED: f32 = 9.0;

#[derive(Clone, Debug)]
struct Env {
    chain: Chain,
    head: Vec2,
    tail_start: Vec2,
}

impl Default for Env {
    fn default() -> Self {
        let head = Vec2::new(300.0, 400.0);
        let style = ChainStyle {
            seg_size: SEG_SIZE,
            max_speed: SEGMENT_SPEED,
            max_force: 0.5,
            body_colour: Rgb::new(0x00, 0xCC, 0x66),
            fade_colour: Rgb::new(0x11, 0x11, 0x11),
            fade_length: 50,
        };
        let chain = Chain::new(head, 10, style);
        let tail_start = chain.positions().last().unwrap_or(head);
        Self {
            chain,
            head,
            tail_start,
        }
    }
}

fn world() -> Bounds {
    Bounds::new(1200.0, 800.0)
}

#[test]
fn chain_follows_its_head() {
    rspec::run(&rspec::given(
        "a ten segment chain laid out behind its head",
        Env::default(),
        |ctx| {
            ctx.when("the head holds still", |ctx| {
                ctx.before_each(|env| {
                    for _ in 0..50 {
                        env.chain.follow(env.head, SEGMENT_SPEED, &world());
                    }
                });
                ctx.then("every segment stays where it was laid", |env| {
                    for (i, position) in env.chain.positions().enumerate() {
                        let offset = SEG_SIZE * (i + 1) as f32;
                        assert_vec_near(position, env.head - Vec2::new(offset, 0.0), 1e-3);
                    }
                });
            });

            ctx.when("the head drives to the right", |ctx| {
                ctx.before_each(|env| {
                    for _ in 0..200 {
                        env.head.x += 2.0;
                        env.chain.follow(env.head, SEGMENT_SPEED, &world());
                    }
                });
                ctx.then("the tail has been dragged along", |env| {
                    let tail = env.chain.positions().last().unwrap_or(env.tail_start);
                    assert!(tail.x > env.tail_start.x + 100.0, "tail stuck at {tail:?}");
                });
                ctx.then("no segment overtakes the head", |env| {
                    assert!(env.chain.positions().all(|p| p.x < env.head.x));
                });
                ctx.then("the chain keeps its length", |env| {
                    assert_eq!(env.chain.len(), 10);
                });
            });
        },
    ));
}
