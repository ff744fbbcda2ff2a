//! Snake-versus-snake outcomes resolved over whole arenas.
use glam::Vec2;
use serpentine::agent::AgentId;
use serpentine::collision::resolve_all;
use serpentine::world::AgentClass;
use test_utils::fixtures::snake_view;

#[test]
fn longer_snake_wins_head_on() {
    let long = snake_view(1, AgentClass::Player, Vec2::new(100.0, 100.0), 8, 10.0);
    let short = snake_view(2, AgentClass::Rival, Vec2::new(115.0, 100.0), 5, 10.0);
    assert_eq!(resolve_all(&[long, short]), vec![AgentId(2)]);
}

#[test]
fn head_into_body_kills_the_head_owner() {
    let body = snake_view(1, AgentClass::Rival, Vec2::new(300.0, 100.0), 12, 10.0);
    let biter = snake_view(2, AgentClass::Rival, Vec2::new(240.0, 105.0), 3, 10.0);
    assert_eq!(resolve_all(&[body, biter]), vec![AgentId(2)]);
}

#[test]
fn shield_survives_a_body_hit() {
    let body = snake_view(1, AgentClass::Rival, Vec2::new(300.0, 100.0), 12, 10.0);
    let mut biter = snake_view(2, AgentClass::Player, Vec2::new(240.0, 105.0), 3, 10.0);
    biter.shielded = true;
    assert!(resolve_all(&[body, biter]).is_empty());
}

#[test]
fn dead_snakes_and_non_snakes_are_ignored() {
    let mut corpse = snake_view(1, AgentClass::Rival, Vec2::new(100.0, 100.0), 8, 10.0);
    corpse.alive = false;
    let boid = snake_view(3, AgentClass::Boid, Vec2::new(100.0, 100.0), 1, 10.0);
    let live = snake_view(2, AgentClass::Rival, Vec2::new(110.0, 100.0), 5, 10.0);
    assert!(resolve_all(&[corpse, boid, live]).is_empty());
}
