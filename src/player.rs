//! The player snake, steered by a pointer or by its own autoplay brain.
use std::fmt;

use glam::Vec2;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, SteeringAgent, WanderParams};
use crate::chain::{Chain, ChainStyle, DroppedSegment, StepPlan};
use crate::collider::CircleCollider;
use crate::collision::{self, SnakeBody};
use crate::constants::{
    DASH_MIN_SEGMENTS, DASH_STRIKE_DISTANCE, HEAD_CLAMP_INSET, MULTIPLIER_TICKS, SHIELD_TICKS,
    SPEED_BOOST_TICKS,
};
use crate::dash::Dash;
use crate::obstacle::Obstacle;
use crate::steering;
use crate::world::{AgentClass, AgentView, Bounds, Rgb, WorldContext, WorldSnapshot};

/// Top speed multiplier of the speed boost.
const SPEED_BOOST_FACTOR: f32 = 1.5;
/// Dash speed multiplier when a speed boost is also active.
const BOOSTED_DASH_FACTOR: f32 = 1.3;
/// Boundary margin in pointer mode.
const POINTER_MARGIN: f32 = 40.0;
/// Boundary margin in autoplay.
const AUTOPLAY_MARGIN: f32 = 50.0;
/// Range inside which autoplay runs from a longer snake.
const AUTOPLAY_FLEE_RANGE: f32 = 160.0;
/// Autoplay hunts only past this length.
const AUTOPLAY_HUNT_LENGTH: usize = 8;
/// Autoplay hunts snakes at least this much shorter.
const AUTOPLAY_HUNT_MARGIN: usize = 3;
/// Ticks between segments shed while dashing.
const PLAYER_SHED_INTERVAL: u32 = 10;
/// Segment top speed outside a dash.
const PLAYER_SEGMENT_SPEED: f32 = 9.0;

/// Countdown timers of collected power-ups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUps {
    shield: u32,
    speed_boost: u32,
    multiplier: u32,
}

impl PowerUps {
    /// Starts (or refreshes) the shield.
    pub fn activate_shield(&mut self) {
        self.shield = SHIELD_TICKS;
    }

    /// Starts (or refreshes) the speed boost.
    pub fn activate_speed_boost(&mut self) {
        self.speed_boost = SPEED_BOOST_TICKS;
    }

    /// Starts (or refreshes) the score multiplier.
    pub fn activate_multiplier(&mut self) {
        self.multiplier = MULTIPLIER_TICKS;
    }

    /// Counts every timer down by one tick.
    pub fn tick(&mut self) {
        self.shield = self.shield.saturating_sub(1);
        self.speed_boost = self.speed_boost.saturating_sub(1);
        self.multiplier = self.multiplier.saturating_sub(1);
    }

    /// Shield active.
    #[must_use]
    pub const fn has_shield(&self) -> bool {
        self.shield > 0
    }

    /// Speed boost active.
    #[must_use]
    pub const fn has_speed_boost(&self) -> bool {
        self.speed_boost > 0
    }

    /// Current score multiplier.
    #[must_use]
    pub const fn score_multiplier(&self) -> u32 {
        if self.multiplier > 0 {
            2
        } else {
            1
        }
    }
}

/// Who steers the player head.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    /// Arrive at the pointer.
    #[default]
    Pointer,
    /// Built-in AI ("watch mode").
    Autoplay,
}

/// What the autoplay brain did last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoplayState {
    /// Nothing decided yet.
    #[default]
    Foraging,
    /// Heading for prey or food.
    Seeking,
    /// Nothing in sight.
    Wandering,
    /// Chasing a shorter snake.
    Hunting,
    /// Running from a longer snake.
    Fleeing,
}

impl AutoplayState {
    /// HUD label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Foraging => "foraging",
            Self::Seeking => "seeking",
            Self::Wandering => "wandering",
            Self::Hunting => "hunting",
            Self::Fleeing => "fleeing",
        }
    }
}

impl fmt::Display for AutoplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Behaviour weights of the player head.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Cruising top speed of the head.
    pub max_speed: f32,
    /// Force ceiling of the head.
    pub max_force: f32,
    /// Weight of arriving at the pointer.
    pub seek_weight: f32,
    /// Weight of obstacle avoidance.
    pub avoid_weight: f32,
    /// Weight of the boundary force (tripled while dashing).
    pub boundaries_weight: f32,
    /// Range at which autoplay notices prey and food.
    pub ai_perception: f32,
    /// Segment radius.
    pub seg_size: f32,
    /// Initial body segments.
    pub start_segments: usize,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_speed: 8.0,
            max_force: 0.4,
            seek_weight: 0.6,
            avoid_weight: 4.0,
            boundaries_weight: 5.0,
            ai_perception: 380.0,
            seg_size: 14.0,
            start_segments: 10,
        }
    }
}

/// The player snake.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnake {
    /// Registry id.
    pub id: AgentId,
    /// Head agent.
    pub head: SteeringAgent,
    /// Trailing body.
    pub body: Chain,
    /// Dash state.
    pub dash: Dash,
    /// Power-up timers.
    pub power: PowerUps,
    /// Steering source.
    pub control: Control,
    /// Last autoplay decision.
    pub autoplay: AutoplayState,
    /// Tuning.
    pub tuning: PlayerTuning,
    /// Liveness flag.
    pub alive: bool,
    /// Head colour.
    pub head_colour: Rgb,
}

impl PlayerSnake {
    /// Creates the player at `position` with its body laid out behind it.
    pub fn new<R: Rng + ?Sized>(id: AgentId, position: Vec2, tuning: PlayerTuning, rng: &mut R) -> Self {
        let seg = tuning.seg_size;
        let head = SteeringAgent::new(position)
            .with_limits(tuning.max_speed, tuning.max_force)
            .with_radius(seg)
            .with_wander(WanderParams::new(
                120.0,
                60.0,
                rng.random_range(0.0..std::f32::consts::TAU),
                0.25,
            ));
        let style = ChainStyle {
            seg_size: seg,
            max_speed: PLAYER_SEGMENT_SPEED,
            max_force: 0.5,
            body_colour: Rgb::new(0x00, 0xCC, 0x66),
            fade_colour: Rgb::new(0x11, 0x11, 0x11),
            fade_length: 50,
        };
        Self {
            id,
            head,
            body: Chain::new(position, tuning.start_segments, style),
            dash: Dash::new(14.0, 60, 90, PLAYER_SHED_INTERVAL),
            power: PowerUps::default(),
            control: Control::Pointer,
            autoplay: AutoplayState::Foraging,
            tuning,
            alive: true,
            head_colour: Rgb::new(0x00, 0xFF, 0x88),
        }
    }

    /// Chain length including the head.
    #[must_use]
    pub fn length(&self) -> usize {
        1 + self.body.len()
    }

    /// Segment radius.
    #[must_use]
    pub const fn seg_size(&self) -> f32 {
        self.body.style.seg_size
    }

    /// Label for the HUD: the autoplay decision, or `player`.
    #[must_use]
    pub const fn ai_label(&self) -> &'static str {
        match self.control {
            Control::Pointer => "player",
            Control::Autoplay => self.autoplay.label(),
        }
    }

    /// What other agents see of the player.
    #[must_use]
    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            class: AgentClass::Player,
            position: self.head.position(),
            velocity: self.head.velocity(),
            radius: self.seg_size(),
            length: self.length(),
            alive: self.alive,
            shielded: self.power.has_shield(),
            segments: self.body.positions().collect(),
        }
    }

    /// Starts a dash if one is available.
    pub fn start_dash(&mut self) -> bool {
        self.dash.start(self.body.len())
    }

    fn tick_timers(&mut self) -> Option<DroppedSegment> {
        self.power.tick();
        let dropped = self.dash.tick(&mut self.body);
        let boost = if self.power.has_speed_boost() {
            SPEED_BOOST_FACTOR
        } else {
            1.0
        };
        let speed = if self.dash.is_active() {
            let dash_boost = if self.power.has_speed_boost() {
                BOOSTED_DASH_FACTOR
            } else {
                1.0
            };
            self.dash.speed * dash_boost
        } else {
            self.tuning.max_speed * boost
        };
        self.head.set_max_speed(speed);
        dropped
    }

    fn boundary_weight(&self) -> f32 {
        if self.dash.is_active() {
            self.tuning.boundaries_weight * 3.0
        } else {
            self.tuning.boundaries_weight
        }
    }

    fn plan_pointer(&self, ctx: &WorldContext, obstacles: &[Obstacle]) -> Vec2 {
        let target = ctx.pointer.unwrap_or_else(|| self.head.position());
        steering::arrive(&self.head, target) * self.tuning.seek_weight
            + steering::avoid_obstacles(&self.head, obstacles) * self.tuning.avoid_weight
            + steering::boundaries(&self.head, &ctx.bounds, POINTER_MARGIN) * self.boundary_weight()
    }

    fn plan_autoplay<R: Rng + ?Sized>(
        &mut self,
        snapshot: &WorldSnapshot,
        ctx: &WorldContext,
        rng: &mut R,
    ) -> Vec2 {
        let position = self.head.position();
        let length = self.length();
        let rivals: Vec<&AgentView> = snapshot.live_of(AgentClass::Rival).collect();

        let threat = rivals
            .iter()
            .filter(|r| r.length > length)
            .map(|r| (*r, position.distance(r.position)))
            .filter(|(_, d)| *d < AUTOPLAY_FLEE_RANGE)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let mut force = Vec2::ZERO;
        if let Some((threat, _)) = threat {
            force += steering::flee(&self.head, threat.position) * 4.0;
            force += steering::evade(&self.head, threat.position, threat.velocity) * 2.0;
            if self.body.len() > DASH_MIN_SEGMENTS {
                self.start_dash();
            }
            self.autoplay = AutoplayState::Fleeing;
        } else {
            force += self.forage(snapshot, rng);
            if length > AUTOPLAY_HUNT_LENGTH {
                let prey = rivals.iter().find(|r| {
                    r.length + AUTOPLAY_HUNT_MARGIN < length
                        && position.distance(r.position) < AUTOPLAY_FLEE_RANGE
                });
                if let Some(prey) = prey {
                    force += steering::pursue(&self.head, prey.position, prey.velocity) * 2.0;
                    self.autoplay = AutoplayState::Hunting;
                    let close = position.distance(prey.position) < DASH_STRIKE_DISTANCE;
                    if close && self.body.len() > DASH_MIN_SEGMENTS + 1 {
                        self.start_dash();
                    }
                }
            }
        }

        let seg = self.seg_size();
        force += steering::avoid_obstacles(&self.head, &snapshot.obstacles) * self.tuning.avoid_weight;
        force += steering::obstacle_proximity_push(
            position,
            &snapshot.obstacles,
            seg * 3.0,
            self.head.max_speed(),
        ) * 4.0;
        force += steering::boundaries(&self.head, &ctx.bounds, AUTOPLAY_MARGIN) * self.boundary_weight();
        let rival_segments = rivals.iter().flat_map(|r| r.segments.iter().copied());
        force += steering::body_avoidance(position, rival_segments, seg * 5.0) * 3.0;
        force
    }

    fn forage<R: Rng + ?Sized>(&mut self, snapshot: &WorldSnapshot, rng: &mut R) -> Vec2 {
        let position = self.head.position();
        let prey = snapshot.live_of(AgentClass::Prey).map(|v| v.position);
        let mut best = steering::nearest_within(position, prey, self.tuning.ai_perception);
        let reach = best.map_or(self.tuning.ai_perception, |(_, d)| d) * 0.8;
        if let Some(food) =
            steering::nearest_within(position, snapshot.food.iter().map(|f| f.position), reach)
        {
            best = Some(food);
        }
        match best {
            Some((target, _)) => {
                self.autoplay = AutoplayState::Seeking;
                steering::seek(&self.head, target) * 2.5 + steering::wander(&mut self.head, rng) * 0.3
            }
            None => {
                self.autoplay = AutoplayState::Wandering;
                steering::wander(&mut self.head, rng)
            }
        }
    }

    /// Ticks timers and composes this tick's force.
    pub fn plan<R: Rng + ?Sized>(
        &mut self,
        snapshot: &WorldSnapshot,
        ctx: &WorldContext,
        rng: &mut R,
    ) -> StepPlan {
        if !self.alive {
            return StepPlan::default();
        }
        let dropped = self.tick_timers().into_iter().collect();
        let force = match self.control {
            Control::Pointer => self.plan_pointer(ctx, &snapshot.obstacles),
            Control::Autoplay => self.plan_autoplay(snapshot, ctx, rng),
        };
        StepPlan { force, dropped }
    }

    /// Integrates, drags the body and checks obstacle contact.
    pub fn commit(&mut self, force: Vec2, bounds: &Bounds, obstacles: &[Obstacle]) {
        if !self.alive {
            return;
        }
        self.head.apply_force(force);
        self.head.integrate();
        let clamped = bounds.clamp_inset(self.head.position(), HEAD_CLAMP_INSET);
        self.head.kinematics.position = clamped;
        self.body
            .follow(clamped, self.dash.segment_speed(PLAYER_SEGMENT_SPEED), bounds);

        if !self.power.has_shield() && obstacles.iter().any(|o| o.contains_point(clamped)) {
            self.alive = false;
            info!("player ran into an obstacle at length {}", self.length());
        }
    }

    /// Whether the head has looped back into its own body.
    #[must_use]
    pub fn hits_itself(&self) -> bool {
        let segments: Vec<Vec2> = self.body.positions().collect();
        collision::self_collision(&SnakeBody {
            head: self.head.position(),
            seg_size: self.seg_size(),
            length: self.length(),
            shielded: self.power.has_shield(),
            segments: &segments,
        })
    }

    /// Whether the head touches a pickup of `radius` at `point`.
    #[must_use]
    pub fn reaches(&self, point: Vec2, radius: f32) -> bool {
        self.alive && self.head.position().distance(point) < self.seg_size() + radius
    }

    /// Grows by one when the head reaches the pickup.
    pub fn try_eat(&mut self, point: Vec2, radius: f32) -> bool {
        if !self.reaches(point, radius) {
            return false;
        }
        self.body.grow(self.head.position());
        true
    }

    /// Loses up to `count` tail segments, never the last one.
    pub fn shrink(&mut self, count: usize) -> Vec<DroppedSegment> {
        let dropped = self.body.shrink(count, 1);
        debug!("player shrank to {}", self.length());
        dropped
    }

    /// Head and body positions as drops, for when the player dies.
    #[must_use]
    pub fn scatter(&self) -> Vec<DroppedSegment> {
        let head = DroppedSegment {
            position: self.head.position(),
            colour: self.head_colour,
        };
        std::iter::once(head).chain(self.body.scatter()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::FoodItem;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn player() -> PlayerSnake {
        let mut rng = SmallRng::seed_from_u64(8);
        PlayerSnake::new(AgentId(0), Vec2::new(400.0, 300.0), PlayerTuning::default(), &mut rng)
    }

    fn ctx() -> WorldContext {
        WorldContext::new(Bounds::new(800.0, 600.0), 40.0)
    }

    #[rstest]
    fn power_ups_expire(mut player: PlayerSnake) {
        player.power.activate_multiplier();
        assert_eq!(player.power.score_multiplier(), 2);
        for _ in 0..MULTIPLIER_TICKS {
            player.power.tick();
        }
        assert_eq!(player.power.score_multiplier(), 1);
    }

    #[rstest]
    fn speed_boost_raises_top_speed(mut player: PlayerSnake) {
        player.power.activate_speed_boost();
        let _ = player.plan(&WorldSnapshot::default(), &ctx(), &mut SmallRng::seed_from_u64(1));
        assert_relative_eq!(player.head.max_speed(), 12.0);
    }

    #[rstest]
    fn pointer_mode_heads_for_the_pointer(mut player: PlayerSnake) {
        let mut context = ctx();
        context.pointer = Some(Vec2::new(600.0, 300.0));
        let plan = player.plan(&WorldSnapshot::default(), &context, &mut SmallRng::seed_from_u64(1));
        assert!(plan.force.x > 0.0);
        assert_eq!(player.ai_label(), "player");
    }

    #[rstest]
    fn autoplay_runs_from_longer_rivals(mut player: PlayerSnake) {
        player.control = Control::Autoplay;
        let mut big = AgentView::single(
            AgentId(5),
            AgentClass::Rival,
            Vec2::new(480.0, 300.0),
            Vec2::ZERO,
            11.0,
        );
        big.length = 40;
        let snapshot = WorldSnapshot::new(vec![big], vec![], vec![]);
        let plan = player.plan(&snapshot, &ctx(), &mut SmallRng::seed_from_u64(1));
        assert_eq!(player.ai_label(), "fleeing");
        assert!(plan.force.x < 0.0);
        assert!(player.dash.is_active());
    }

    #[rstest]
    fn autoplay_prefers_close_food(mut player: PlayerSnake) {
        player.control = Control::Autoplay;
        let food = FoodItem {
            position: Vec2::new(400.0, 250.0),
            radius: 6.0,
            colour: Rgb::new(0x88, 0xFF, 0x88),
        };
        let snapshot = WorldSnapshot::new(vec![], vec![], vec![food]);
        let _ = player.plan(&snapshot, &ctx(), &mut SmallRng::seed_from_u64(1));
        assert_eq!(player.autoplay, AutoplayState::Seeking);
    }

    #[rstest]
    fn shield_survives_obstacles(mut player: PlayerSnake) {
        let rock = Obstacle::new(player.head.position(), 40.0);
        player.power.activate_shield();
        player.commit(Vec2::ZERO, &Bounds::new(800.0, 600.0), &[rock]);
        assert!(player.alive);
        player.power = PowerUps::default();
        player.commit(Vec2::ZERO, &Bounds::new(800.0, 600.0), &[rock]);
        assert!(!player.alive);
    }

    #[rstest]
    fn shrink_never_removes_the_last_segment(mut player: PlayerSnake) {
        let dropped = player.shrink(30);
        assert_eq!(dropped.len(), 9);
        assert_eq!(player.length(), 2);
    }

    #[rstest]
    fn fresh_body_does_not_hit_itself(player: PlayerSnake) {
        assert!(!player.hits_itself());
    }
}
