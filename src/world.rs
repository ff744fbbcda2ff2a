//! Per-tick inputs handed to every steering call.
//!
//! The external game loop owns the live collections. Each tick it builds a
//! [`WorldSnapshot`] (read-only copies of every agent's observable state plus
//! obstacles and food) and a [`WorldContext`] (bounds, margin, pointer, tick
//! number). Agents plan against that snapshot and never see a neighbour that
//! has already moved this tick.
use std::fmt;

use glam::Vec2;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::AgentId;
use crate::obstacle::Obstacle;

/// Axis-aligned world rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Top-left corner.
    pub origin: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl Bounds {
    /// Bounds anchored at the origin.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::ZERO,
            size: Vec2::new(width, height),
        }
    }

    /// Bounds anchored at an arbitrary corner.
    #[must_use]
    pub const fn with_origin(min_x: f32, min_y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(min_x, min_y),
            size: Vec2::new(width, height),
        }
    }

    /// Bottom-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    /// Width of the world.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.size.x
    }

    /// Height of the world.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.size.y
    }

    /// Clamps `point` into the rectangle shrunk by `inset` on every side.
    #[must_use]
    pub fn clamp_inset(&self, point: Vec2, inset: f32) -> Vec2 {
        let (min, max) = self.inset_corners(inset);
        point.clamp(min, max)
    }

    /// Corners of the rectangle shrunk by `inset`; collapses to the centre
    /// when the inset exceeds half the size.
    #[must_use]
    pub fn inset_corners(&self, inset: f32) -> (Vec2, Vec2) {
        let min = self.origin + Vec2::splat(inset);
        let max = self.max() - Vec2::splat(inset);
        let centre = self.origin + self.size * 0.5;
        (min.min(centre), max.max(centre))
    }

    /// Returns `true` when `point` lies within the rectangle grown by `slack`.
    #[must_use]
    pub fn contains_with_slack(&self, point: Vec2, slack: f32) -> bool {
        let min = self.origin - Vec2::splat(slack);
        let max = self.max() + Vec2::splat(slack);
        point.x >= min.x && point.y >= min.y && point.x <= max.x && point.y <= max.y
    }
}

/// Global per-tick parameters passed explicitly instead of read from globals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldContext {
    /// World rectangle; may change between ticks on resize.
    pub bounds: Bounds,
    /// Default boundary margin for agents without their own.
    pub margin: f32,
    /// Tick counter maintained by the caller.
    pub tick: u64,
    /// Pointer (mouse or touch) target for player-driven heads.
    pub pointer: Option<Vec2>,
}

impl WorldContext {
    /// Context for tick zero with no pointer.
    #[must_use]
    pub const fn new(bounds: Bounds, margin: f32) -> Self {
        Self {
            bounds,
            margin,
            tick: 0,
            pointer: None,
        }
    }
}

/// Text that is not a `#RRGGBB` colour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid colour {0:?}, expected #RRGGBB")]
pub struct InvalidColour(pub String);

/// An sRGB colour carried through for presentation (segment and food tints).
///
/// Serialised as a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Builds a colour from channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` (the leading `#` is optional).
    ///
    /// # Examples
    /// ```
    /// use serpentine::world::Rgb;
    /// assert_eq!(Rgb::parse_hex("#FF4444"), Some(Rgb::new(255, 68, 68)));
    /// assert_eq!(Rgb::parse_hex("nope"), None);
    /// ```
    #[must_use]
    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        let [_, r, g, b] = value.to_be_bytes();
        Some(Self { r, g, b })
    }

    /// Linear blend towards `other`; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let blended = f32::from(a) + (f32::from(b) - f32::from(a)) * t;
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "A blend of two u8 channels stays within 0..=255."
            )]
            let channel = blended.round().clamp(0.0, 255.0) as u8;
            channel
        };
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = InvalidColour;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&text).ok_or_else(|| InvalidColour(text))
    }
}

impl From<Rgb> for String {
    fn from(colour: Rgb) -> Self {
        colour.to_string()
    }
}

/// Coarse classification of a snapshot entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentClass {
    /// The player-controlled snake head.
    Player,
    /// An AI rival snake head.
    Rival,
    /// A flocking enemy.
    Boid,
    /// Edible prey.
    Prey,
    /// Poisonous prey, shunned by foragers.
    PoisonPrey,
    /// Collectible power-up.
    PowerUp,
}

impl AgentClass {
    /// Snake heads are the agents that carry chains.
    #[must_use]
    pub const fn is_snake(self) -> bool {
        matches!(self, Self::Player | Self::Rival)
    }

    /// Anything a forager may eat.
    #[must_use]
    pub const fn is_edible_prey(self) -> bool {
        matches!(self, Self::Prey)
    }
}

/// Read-only view of one agent at the start of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    /// Registry id.
    pub id: AgentId,
    /// What kind of agent this is.
    pub class: AgentClass,
    /// Head (or body) position.
    pub position: Vec2,
    /// Head (or body) velocity.
    pub velocity: Vec2,
    /// Collision radius of the head.
    pub radius: f32,
    /// Chain length including the head; 1 for single-body agents.
    pub length: usize,
    /// Liveness flag.
    pub alive: bool,
    /// Whether a shield currently protects the agent.
    pub shielded: bool,
    /// Trailing body segment positions (never the head).
    pub segments: Vec<Vec2>,
}

impl AgentView {
    /// View of a single-body agent.
    #[must_use]
    pub const fn single(id: AgentId, class: AgentClass, position: Vec2, velocity: Vec2, radius: f32) -> Self {
        Self {
            id,
            class,
            position,
            velocity,
            radius,
            length: 1,
            alive: true,
            shielded: false,
            segments: Vec::new(),
        }
    }
}

/// A food pellet, usually dropped by a shrinking or dying snake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    /// Pellet centre.
    pub position: Vec2,
    /// Pellet radius.
    pub radius: f32,
    /// Tint inherited from the segment that dropped it.
    pub colour: Rgb,
}

/// Consistent read-only picture of the world at the start of a tick.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    agents: Vec<AgentView>,
    index: HashMap<AgentId, usize>,
    /// Static and moving obstacles.
    pub obstacles: Vec<Obstacle>,
    /// Food pellets on the field.
    pub food: Vec<FoodItem>,
}

impl WorldSnapshot {
    /// Builds a snapshot and its id index.
    #[must_use]
    pub fn new(agents: Vec<AgentView>, obstacles: Vec<Obstacle>, food: Vec<FoodItem>) -> Self {
        let index = agents
            .iter()
            .enumerate()
            .map(|(slot, view)| (view.id, slot))
            .collect();
        Self {
            agents,
            index,
            obstacles,
            food,
        }
    }

    /// All agent views.
    #[must_use]
    pub fn agents(&self) -> &[AgentView] {
        &self.agents
    }

    /// Looks up an agent by id regardless of liveness.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&AgentView> {
        self.index.get(&id).and_then(|slot| self.agents.get(*slot))
    }

    /// Looks up an agent by id and returns it only while it is alive.
    #[must_use]
    pub fn live(&self, id: AgentId) -> Option<&AgentView> {
        self.get(id).filter(|view| view.alive)
    }

    /// Live snake heads other than `exclude`.
    pub fn live_snakes(&self, exclude: AgentId) -> impl Iterator<Item = &AgentView> + '_ {
        self.agents
            .iter()
            .filter(move |view| view.alive && view.id != exclude && view.class.is_snake())
    }

    /// Live agents of one class.
    pub fn live_of(&self, class: AgentClass) -> impl Iterator<Item = &AgentView> + '_ {
        self.agents
            .iter()
            .filter(move |view| view.alive && view.class == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn view(id: u32, class: AgentClass, alive: bool) -> AgentView {
        let mut v = AgentView::single(AgentId(id), class, Vec2::ZERO, Vec2::ZERO, 10.0);
        v.alive = alive;
        v
    }

    #[test]
    fn live_lookup_filters_dead_agents() {
        let snapshot = WorldSnapshot::new(
            vec![view(1, AgentClass::Rival, true), view(2, AgentClass::Rival, false)],
            Vec::new(),
            Vec::new(),
        );
        assert!(snapshot.live(AgentId(1)).is_some());
        assert!(snapshot.live(AgentId(2)).is_none());
        assert!(snapshot.get(AgentId(2)).is_some());
        assert!(snapshot.live(AgentId(9)).is_none());
    }

    #[test]
    fn live_snakes_skip_self_and_non_snakes() {
        let snapshot = WorldSnapshot::new(
            vec![
                view(1, AgentClass::Rival, true),
                view(2, AgentClass::Player, true),
                view(3, AgentClass::Boid, true),
            ],
            Vec::new(),
            Vec::new(),
        );
        let ids: Vec<_> = snapshot.live_snakes(AgentId(1)).map(|v| v.id).collect();
        assert_eq!(ids, vec![AgentId(2)]);
    }

    #[test]
    fn clamp_inset_collapses_on_tiny_worlds() {
        let bounds = Bounds::new(4.0, 100.0);
        let clamped = bounds.clamp_inset(Vec2::new(-3.0, 200.0), 5.0);
        assert_relative_eq!(clamped.x, 2.0);
        assert_relative_eq!(clamped.y, 95.0);
    }

    #[test]
    fn colours_blend_and_print() {
        let dark = Rgb::new(0, 0, 0);
        let light = Rgb::new(200, 100, 50);
        assert_eq!(dark.lerp(light, 0.5), Rgb::new(100, 50, 25));
        assert_eq!(light.to_string(), "#C86432");
    }

    #[test]
    fn colours_serialise_as_hex() {
        let json = serde_json::to_string(&Rgb::new(0x44, 0xDD, 0xFF)).unwrap_or_default();
        assert_eq!(json, "\"#44DDFF\"");
        let parsed: Result<Rgb, _> = serde_json::from_str("\"#zzzzzz\"");
        assert!(parsed.is_err());
    }
}
