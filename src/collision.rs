//! Snake-versus-snake collision rules.
//!
//! Each unordered pair of snakes is resolved exactly once per tick, after all
//! movement. Outcomes are values; callers flip `alive` flags and drop food.
use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::collider::within_reach;
use crate::constants::{BODY_CONTACT_FACTOR, SELF_COLLISION_SKIP};
use crate::world::AgentView;

/// Result of resolving one pair, from the point of view of `(a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionOutcome {
    /// No contact.
    None,
    /// The first snake dies.
    ADies,
    /// The second snake dies.
    BDies,
    /// Both snakes die.
    BothDie,
}

impl CollisionOutcome {
    /// Whether the first snake dies.
    #[must_use]
    pub const fn a_dies(self) -> bool {
        matches!(self, Self::ADies | Self::BothDie)
    }

    /// Whether the second snake dies.
    #[must_use]
    pub const fn b_dies(self) -> bool {
        matches!(self, Self::BDies | Self::BothDie)
    }

    /// The same outcome with the roles swapped.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::ADies => Self::BDies,
            Self::BDies => Self::ADies,
            other => other,
        }
    }
}

/// The parts of a snake the rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnakeBody<'a> {
    /// Head centre.
    pub head: Vec2,
    /// Segment radius.
    pub seg_size: f32,
    /// Chain length including the head.
    pub length: usize,
    /// Shielded snakes never die in a collision.
    pub shielded: bool,
    /// Trailing segment centres, head side first.
    pub segments: &'a [Vec2],
}

impl<'a> From<&'a AgentView> for SnakeBody<'a> {
    fn from(view: &'a AgentView) -> Self {
        Self {
            head: view.position,
            seg_size: view.radius,
            length: view.length,
            shielded: view.shielded,
            segments: &view.segments,
        }
    }
}

impl SnakeBody<'_> {
    /// Whether this head touches any of `other`'s trailing segments.
    #[must_use]
    pub fn head_hits_body_of(&self, other: &SnakeBody<'_>) -> bool {
        let reach = self.seg_size + other.seg_size * BODY_CONTACT_FACTOR;
        other
            .segments
            .iter()
            .any(|segment| within_reach(self.head, *segment, reach))
    }
}

/// Resolves head-to-head and head-to-body contact between two snakes.
///
/// Head to head: the longer snake wins, equal lengths kill both, and a
/// shielded side never dies. Head to body: the snake whose head touched the
/// other's body dies unless shielded; the body owner survives.
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use serpentine::collision::{resolve_pair, CollisionOutcome, SnakeBody};
///
/// let a = SnakeBody { head: Vec2::ZERO, seg_size: 10.0, length: 5, shielded: false, segments: &[] };
/// let b = SnakeBody { head: Vec2::new(15.0, 0.0), seg_size: 10.0, length: 5, shielded: false, segments: &[] };
/// assert_eq!(resolve_pair(&a, &b), CollisionOutcome::BothDie);
/// ```
#[must_use]
pub fn resolve_pair(a: &SnakeBody<'_>, b: &SnakeBody<'_>) -> CollisionOutcome {
    if within_reach(a.head, b.head, a.seg_size + b.seg_size) {
        return head_to_head(a, b);
    }
    let a_dies = a.head_hits_body_of(b) && !a.shielded;
    let b_dies = b.head_hits_body_of(a) && !b.shielded;
    match (a_dies, b_dies) {
        (true, true) => CollisionOutcome::BothDie,
        (true, false) => CollisionOutcome::ADies,
        (false, true) => CollisionOutcome::BDies,
        (false, false) => CollisionOutcome::None,
    }
}

fn head_to_head(a: &SnakeBody<'_>, b: &SnakeBody<'_>) -> CollisionOutcome {
    match (a.shielded, b.shielded) {
        (true, true) => return CollisionOutcome::None,
        (true, false) => return CollisionOutcome::BDies,
        (false, true) => return CollisionOutcome::ADies,
        (false, false) => {}
    }
    match a.length.cmp(&b.length) {
        std::cmp::Ordering::Greater => CollisionOutcome::BDies,
        std::cmp::Ordering::Less => CollisionOutcome::ADies,
        std::cmp::Ordering::Equal => CollisionOutcome::BothDie,
    }
}

/// Whether a snake's head touches its own body far enough down the chain.
#[must_use]
pub fn self_collision(snake: &SnakeBody<'_>) -> bool {
    if snake.shielded {
        return false;
    }
    let reach = snake.seg_size * BODY_CONTACT_FACTOR;
    snake
        .segments
        .iter()
        .skip(SELF_COLLISION_SKIP)
        .any(|segment| within_reach(snake.head, *segment, reach))
}

/// Resolves every unordered pair of live snakes once and returns the ids
/// that die, in first-death order without duplicates.
///
/// Every pair is judged against the same end-of-movement positions; a snake
/// killed by an earlier pair still takes part in later pairs this tick.
#[must_use]
pub fn resolve_all(snakes: &[AgentView]) -> Vec<AgentId> {
    let mut dead: Vec<AgentId> = Vec::new();
    let mut mark = |id: AgentId| {
        if !dead.contains(&id) {
            dead.push(id);
        }
    };
    let live: Vec<&AgentView> = snakes
        .iter()
        .filter(|view| view.alive && view.class.is_snake())
        .collect();
    for (i, a) in live.iter().enumerate() {
        for b in live.iter().skip(i + 1) {
            let outcome = resolve_pair(&SnakeBody::from(*a), &SnakeBody::from(*b));
            if outcome != CollisionOutcome::None {
                debug!("collision {} vs {}: {:?}", a.id, b.id, outcome);
            }
            if outcome.a_dies() {
                mark(a.id);
            }
            if outcome.b_dies() {
                mark(b.id);
            }
        }
    }
    dead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::AgentClass;
    use rstest::rstest;

    fn body(head: Vec2, length: usize, shielded: bool, segments: &[Vec2]) -> SnakeBody<'_> {
        SnakeBody {
            head,
            seg_size: 10.0,
            length,
            shielded,
            segments,
        }
    }

    #[rstest]
    #[case::longer_wins(8, 5, false, false, CollisionOutcome::BDies)]
    #[case::shorter_loses(3, 5, false, false, CollisionOutcome::ADies)]
    #[case::equal_both_die(5, 5, false, false, CollisionOutcome::BothDie)]
    #[case::shield_beats_length(3, 9, true, false, CollisionOutcome::BDies)]
    #[case::shield_on_b(9, 3, false, true, CollisionOutcome::ADies)]
    #[case::both_shielded(5, 5, true, true, CollisionOutcome::None)]
    fn head_to_head_rules(
        #[case] len_a: usize,
        #[case] len_b: usize,
        #[case] shield_a: bool,
        #[case] shield_b: bool,
        #[case] expected: CollisionOutcome,
    ) {
        let a = body(Vec2::ZERO, len_a, shield_a, &[]);
        let b = body(Vec2::new(12.0, 0.0), len_b, shield_b, &[]);
        assert_eq!(resolve_pair(&a, &b), expected);
        assert_eq!(resolve_pair(&b, &a), expected.swapped());
    }

    #[test]
    fn head_into_body_kills_the_head_owner() {
        let segments = [Vec2::new(100.0, 0.0), Vec2::new(100.0, 12.0)];
        let owner = body(Vec2::new(100.0, -12.0), 2, false, &segments);
        let rammer = body(Vec2::new(85.0, 12.0), 20, false, &[]);
        assert_eq!(resolve_pair(&rammer, &owner), CollisionOutcome::ADies);
        let shielded = body(Vec2::new(85.0, 12.0), 20, true, &[]);
        assert_eq!(resolve_pair(&shielded, &owner), CollisionOutcome::None);
    }

    #[test]
    fn far_apart_is_nothing() {
        let a = body(Vec2::ZERO, 5, false, &[]);
        let b = body(Vec2::new(300.0, 0.0), 5, false, &[]);
        assert_eq!(resolve_pair(&a, &b), CollisionOutcome::None);
    }

    #[test]
    fn self_collision_skips_the_neck() {
        let mut segments: Vec<Vec2> = (1..=8).map(|i| Vec2::new(-12.0 * i as f32, 0.0)).collect();
        let neck_only = body(Vec2::ZERO, 9, false, &segments);
        assert!(!self_collision(&neck_only));
        segments[7] = Vec2::new(2.0, 0.0);
        let looped = body(Vec2::ZERO, 9, false, &segments);
        assert!(self_collision(&looped));
        let shielded = body(Vec2::ZERO, 9, true, &segments);
        assert!(!self_collision(&shielded));
    }

    #[test]
    fn all_pairs_are_resolved_once() {
        let mut views: Vec<AgentView> = [(1, 0.0, 5), (2, 12.0, 5), (3, 500.0, 2)]
            .into_iter()
            .map(|(id, x, len)| {
                let mut v = AgentView::single(AgentId(id), AgentClass::Rival, Vec2::new(x, 0.0), Vec2::ZERO, 10.0);
                v.length = len;
                v
            })
            .collect();
        views.push(AgentView::single(AgentId(4), AgentClass::Boid, Vec2::ZERO, Vec2::ZERO, 8.0));
        assert_eq!(resolve_all(&views), vec![AgentId(1), AgentId(2)]);
    }
}
