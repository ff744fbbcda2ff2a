//! AI rival snakes: skill personalities and the foraging/hunting/fleeing
//! state machine.
//!
//! A rival is a snake head plus a [`Chain`] body. Its single skill scalar,
//! rolled at spawn within a band capped by the current difficulty, fans out
//! into every tuning value in [`SkillProfile`]. Each tick [`Rival::plan`]
//! re-evaluates the state machine against the snapshot, composes the forces
//! of the current state and returns them; [`Rival::commit`] integrates.
use std::f32::consts::{FRAC_PI_3, PI, TAU};
use std::fmt;

use glam::Vec2;
use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, SteeringAgent, WanderParams};
use crate::chain::{Chain, ChainStyle, DroppedSegment, StepPlan};
use crate::collider::CircleCollider;
use crate::constants::{
    DASH_MIN_SEGMENTS, DASH_STRIKE_DISTANCE, DOMINANCE_MARGIN, FLEE_RELEASE_DISTANCE,
    FLEE_SPEED_BOOST, FLEE_TIMEOUT, HEAD_CLAMP_INSET, HUNT_CLOSE_DISTANCE, HUNT_HYSTERESIS,
    HUNT_TIMEOUT, INTERCEPT_LOOKAHEAD, INTERCEPT_OFFSET, MIN_HUNT_LENGTH,
};
use crate::dash::Dash;
use crate::numeric::{map_range, ticks_from_f32};
use crate::obstacle::Obstacle;
use crate::steering;
use crate::vector_math::{angle_between, VecExt};
use crate::world::{AgentClass, AgentView, Bounds, Rgb, WorldContext, WorldSnapshot};

/// Segment radius of a freshly spawned rival.
pub const RIVAL_SEG_SIZE: f32 = 11.0;
/// Body segments of a freshly spawned rival.
pub const RIVAL_START_SEGMENTS: usize = 3;
/// Body segment top speed outside a dash.
const RIVAL_SEGMENT_SPEED: f32 = 5.5;
/// Body segment force ceiling.
const RIVAL_SEGMENT_FORCE: f32 = 0.4;
/// Ticks between segments shed while dashing.
const RIVAL_SHED_INTERVAL: u32 = 8;
/// Boundary margin of a rival head.
const RIVAL_BOUNDARY_MARGIN: f32 = 50.0;
/// Body avoidance reach in segment sizes.
const BODY_DANGER_SEGMENTS: f32 = 6.0;
/// Obstacle push envelope in segment sizes.
const OBSTACLE_CLEARANCE_SEGMENTS: f32 = 3.0;
/// Weight of the body avoidance push.
const BODY_AVOID_WEIGHT: f32 = 3.0;
/// Weight of the pursuit force while hunting.
const PURSUE_WEIGHT: f32 = 2.5;
/// Weight of the flee force while fleeing.
const FLEE_WEIGHT: f32 = 4.0;
/// Weight of the evade force while fleeing.
const EVADE_WEIGHT: f32 = 2.0;
/// Food is preferred over prey when closer than this fraction of the best.
const FOOD_BIAS: f32 = 0.8;
/// Tail colour of long rivals.
const RIVAL_FADE: Rgb = Rgb::new(0x22, 0, 0);
/// Segments over which the tail fades.
const RIVAL_FADE_LENGTH: usize = 40;

/// Draws a skill level in a band capped by `difficulty`.
///
/// Difficulty 0 yields skills in roughly `[0.05, 0.25]`; difficulty 1 in
/// `[0.2, 1.0]`. Three rolls in ten land in the upper part of the band.
pub fn roll_skill<R: Rng + ?Sized>(difficulty: f32, rng: &mut R) -> f32 {
    let difficulty = difficulty.clamp(0.0, 1.0);
    let max_skill = map_range(difficulty, 0.0, 1.0, 0.25, 1.0);
    let min_skill = map_range(difficulty, 0.0, 1.0, 0.05, 0.2);
    let raw = if rng.random_bool(0.3) {
        rng.random_range(0.6..1.0)
    } else {
        rng.random_range(0.15..0.65)
    };
    map_range(raw, 0.0, 1.0, min_skill, max_skill).clamp(0.05, 1.0)
}

/// Every tuning value derived from a rival's skill level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    /// The skill scalar in `[0, 1]`.
    pub skill: f32,
    /// Cruising top speed.
    pub normal_speed: f32,
    /// Steering force ceiling.
    pub max_force: f32,
    /// Obstacle probe corridor width.
    pub avoidance_width: f32,
    /// Wander geometry; skilled rivals wander wider and steadier.
    pub wander: WanderParams,
    /// Weight of wandering while foraging.
    pub wander_weight: f32,
    /// Weight of obstacle avoidance.
    pub avoid_weight: f32,
    /// Weight of the boundary force.
    pub boundaries_weight: f32,
    /// Weight of seeking prey and food.
    pub seek_prey_weight: f32,
    /// Range at which prey is noticed.
    pub prey_perception: f32,
    /// Range at which other snakes are considered.
    pub hunt_perception: f32,
    /// Range at which dropped food is noticed.
    pub food_perception: f32,
    /// Range at which a longer snake triggers fleeing.
    pub flee_range: f32,
    /// Probability scale of starting a hunt.
    pub aggression: f32,
    /// Head top speed while dashing.
    pub dash_speed: f32,
    /// Longest dash in ticks.
    pub dash_duration: u32,
    /// Ticks between dashes.
    pub dash_cooldown: u32,
    /// Weight of the direct obstacle push.
    pub obstacle_proximity_weight: f32,
}

impl SkillProfile {
    /// Fans `skill` out into tuning values, adding a little per-rival noise.
    pub fn roll<R: Rng + ?Sized>(skill: f32, seg_size: f32, rng: &mut R) -> Self {
        Self::with_jitter(skill, seg_size, |spread| rng.random_range(-spread..=spread))
    }

    /// The noise-free profile for `skill`.
    #[must_use]
    pub fn centred(skill: f32, seg_size: f32) -> Self {
        Self::with_jitter(skill, seg_size, |_| 0.0)
    }

    /// Builds a profile where `jitter(spread)` returns a value in
    /// `[-spread, spread]`.
    pub fn with_jitter<F>(skill: f32, seg_size: f32, mut jitter: F) -> Self
    where
        F: FnMut(f32) -> f32,
    {
        let skill = skill.clamp(0.0, 1.0);
        let by_skill = |lo: f32, hi: f32| map_range(skill, 0.0, 1.0, lo, hi);
        let wander = WanderParams::new(
            by_skill(80.0, 150.0),
            by_skill(40.0, 70.0),
            PI + jitter(PI),
            by_skill(0.4, 0.2),
        );
        Self {
            skill,
            normal_speed: by_skill(3.5, 5.5) + jitter(0.3),
            max_force: by_skill(0.2, 0.45) + jitter(0.03),
            avoidance_width: by_skill(seg_size * 1.5, seg_size * 3.0),
            wander,
            wander_weight: 0.85 + jitter(0.35),
            avoid_weight: by_skill(4.0, 8.0) + jitter(0.5),
            boundaries_weight: by_skill(4.0, 7.0),
            seek_prey_weight: by_skill(1.5, 3.5) + jitter(0.3),
            prey_perception: by_skill(200.0, 400.0) + jitter(20.0),
            hunt_perception: by_skill(250.0, 500.0) + jitter(20.0),
            food_perception: by_skill(220.0, 420.0) + jitter(20.0),
            flee_range: by_skill(120.0, 200.0),
            aggression: (by_skill(0.2, 0.95) + jitter(0.1)).clamp(0.1, 1.0),
            dash_speed: by_skill(8.0, 12.0),
            dash_duration: ticks_from_f32(by_skill(30.0, 50.0)),
            dash_cooldown: ticks_from_f32(by_skill(150.0, 80.0)),
            obstacle_proximity_weight: by_skill(3.0, 6.0),
        }
    }
}

/// Decision state of a rival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiState {
    /// Wandering and eating.
    #[default]
    Foraging,
    /// Chasing a smaller snake.
    Hunting,
    /// Running from a longer snake.
    Fleeing,
}

impl AiState {
    /// Label shown on the HUD.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Foraging => "foraging",
            Self::Hunting => "hunting",
            Self::Fleeing => "fleeing",
        }
    }
}

impl fmt::Display for AiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Head and body colours of a rival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RivalPalette {
    /// Head colour.
    pub head: Rgb,
    /// First body segment colour.
    pub body: Rgb,
}

impl Default for RivalPalette {
    fn default() -> Self {
        Self {
            head: Rgb::new(0xFF, 0x44, 0x44),
            body: Rgb::new(0xCC, 0x22, 0x22),
        }
    }
}

/// A snake visible to the decision layer this tick.
#[derive(Debug, Clone, Copy)]
struct Sighting {
    id: AgentId,
    length: usize,
    distance: f32,
}

/// An AI-controlled snake.
#[derive(Debug, Clone, PartialEq)]
pub struct Rival {
    /// Registry id.
    pub id: AgentId,
    /// Head agent.
    pub head: SteeringAgent,
    /// Trailing body.
    pub body: Chain,
    /// Derived tuning.
    pub profile: SkillProfile,
    /// Dash state.
    pub dash: Dash,
    /// Current decision state.
    pub state: AiState,
    /// Hunted or feared snake, re-validated every tick.
    pub target: Option<AgentId>,
    /// Ticks spent in the current state.
    pub state_timer: u32,
    /// Liveness flag; the owner removes or respawns dead rivals.
    pub alive: bool,
    /// Colours.
    pub palette: RivalPalette,
}

impl Rival {
    /// Builds a rival with an explicit profile, heading nowhere.
    #[must_use]
    pub fn new(
        id: AgentId,
        position: Vec2,
        body_len: usize,
        seg_size: f32,
        profile: SkillProfile,
        palette: RivalPalette,
    ) -> Self {
        let head = SteeringAgent::new(position)
            .with_limits(profile.normal_speed, profile.max_force)
            .with_radius(seg_size)
            .with_avoidance_width(profile.avoidance_width)
            .with_wander(profile.wander);
        let style = ChainStyle {
            seg_size,
            max_speed: RIVAL_SEGMENT_SPEED,
            max_force: RIVAL_SEGMENT_FORCE,
            body_colour: palette.body,
            fade_colour: RIVAL_FADE,
            fade_length: RIVAL_FADE_LENGTH,
        };
        Self {
            id,
            head,
            body: Chain::new(position, body_len, style),
            dash: Dash::new(
                profile.dash_speed,
                profile.dash_duration,
                profile.dash_cooldown,
                RIVAL_SHED_INTERVAL,
            ),
            profile,
            state: AiState::Foraging,
            target: None,
            state_timer: 0,
            alive: true,
            palette,
        }
    }

    /// Spawns a rival with a skill rolled against `difficulty` and a random
    /// initial heading.
    pub fn spawn<R: Rng + ?Sized>(
        id: AgentId,
        position: Vec2,
        difficulty: f32,
        palette: RivalPalette,
        rng: &mut R,
    ) -> Self {
        let skill = roll_skill(difficulty, rng);
        let profile = SkillProfile::roll(skill, RIVAL_SEG_SIZE, rng);
        let mut rival = Self::new(id, position, RIVAL_START_SEGMENTS, RIVAL_SEG_SIZE, profile, palette);
        let heading = Vec2::from_angle(rng.random_range(0.0..TAU));
        rival.head.kinematics.velocity = heading * 2.0;
        debug!("rival {id} spawned with skill {skill:.2}");
        rival
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

    /// Label of the current state.
    #[must_use]
    pub const fn ai_label(&self) -> &'static str {
        self.state.label()
    }

    /// What other agents see of this rival.
    #[must_use]
    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            class: AgentClass::Rival,
            position: self.head.position(),
            velocity: self.head.velocity(),
            radius: self.seg_size(),
            length: self.length(),
            alive: self.alive,
            shielded: false,
            segments: self.body.positions().collect(),
        }
    }

    fn enter(&mut self, state: AiState, target: Option<AgentId>) {
        if self.state != state {
            debug!("rival {} {} -> {}", self.id, self.state, state);
        }
        self.state = state;
        self.target = target;
        self.state_timer = 0;
    }

    fn sightings(&self, snapshot: &WorldSnapshot) -> Vec<Sighting> {
        let position = self.head.position();
        snapshot
            .live_snakes(self.id)
            .map(|view| Sighting {
                id: view.id,
                length: view.length,
                distance: position.distance(view.position),
            })
            .filter(|s| s.distance < self.profile.hunt_perception)
            .collect()
    }

    /// Runs the state machine for one tick.
    ///
    /// Fleeing overrides whatever was decided before it: a hunting rival that
    /// spots a longer snake inside its flee range switches immediately.
    pub fn decide<R: Rng + ?Sized>(&mut self, snapshot: &WorldSnapshot, rng: &mut R) {
        self.state_timer = self.state_timer.saturating_add(1);
        let length = self.length();
        let position = self.head.position();
        let nearby = self.sightings(snapshot);

        match self.state {
            AiState::Foraging => {
                let aggression = self.profile.aggression;
                let prey = nearby.iter().find(|t| {
                    let dominated = length > t.length + DOMINANCE_MARGIN;
                    let can_kill = length > t.length;
                    let close = t.distance < HUNT_CLOSE_DISTANCE;
                    let wants = (dominated && rng.random::<f32>() < aggression)
                        || (can_kill && close && rng.random::<f32>() < aggression * 0.5);
                    wants && length > MIN_HUNT_LENGTH
                });
                if let Some(prey) = prey {
                    self.enter(AiState::Hunting, Some(prey.id));
                }
            }
            AiState::Hunting => match self.target.and_then(|id| snapshot.live(id)) {
                None => self.enter(AiState::Foraging, None),
                Some(target) => {
                    let distance = position.distance(target.position);
                    let lost = distance > self.profile.hunt_perception * HUNT_HYSTERESIS;
                    if lost || length < MIN_HUNT_LENGTH || self.state_timer > HUNT_TIMEOUT {
                        self.enter(AiState::Foraging, None);
                    }
                }
            },
            AiState::Fleeing => {}
        }

        if let Some(threat) = nearby
            .iter()
            .find(|t| t.length > length && t.distance < self.profile.flee_range)
        {
            self.enter(AiState::Fleeing, Some(threat.id));
        }

        if self.state == AiState::Fleeing {
            match self.target.and_then(|id| snapshot.live(id)) {
                None => self.enter(AiState::Foraging, None),
                Some(threat) => {
                    let distance = position.distance(threat.position);
                    if distance > FLEE_RELEASE_DISTANCE || self.state_timer > FLEE_TIMEOUT {
                        self.enter(AiState::Foraging, None);
                    }
                }
            }
        }
    }

    /// Seek the closest prey, or dropped food when it is clearly closer.
    #[must_use]
    pub fn seek_food(&self, snapshot: &WorldSnapshot) -> Vec2 {
        let position = self.head.position();
        let prey = snapshot
            .agents()
            .iter()
            .filter(|v| v.alive && matches!(v.class, AgentClass::Prey | AgentClass::PoisonPrey))
            .map(|v| v.position);
        let mut best = steering::nearest_within(position, prey, self.profile.prey_perception);
        let best_distance = best.map_or(self.profile.prey_perception, |(_, d)| d);
        let food_reach = self.profile.food_perception.min(best_distance * FOOD_BIAS);
        if let Some(food) =
            steering::nearest_within(position, snapshot.food.iter().map(|f| f.position), food_reach)
        {
            best = Some(food);
        }
        best.map_or(Vec2::ZERO, |(target, _)| {
            steering::seek(&self.head, target) * self.profile.seek_prey_weight
        })
    }

    /// Point beside the target's predicted path, on the side nearer to us.
    #[must_use]
    pub fn intercept_point(&self, target_position: Vec2, target_velocity: Vec2) -> Vec2 {
        let future = target_position + target_velocity * INTERCEPT_LOOKAHEAD;
        let side = target_velocity.perp().normalized_or_zero() * INTERCEPT_OFFSET;
        let position = self.head.position();
        let (a, b) = (future + side, future - side);
        if position.distance(a) < position.distance(b) {
            a
        } else {
            b
        }
    }

    fn hunt(&mut self, target: &AgentView) -> Vec2 {
        let pursue =
            steering::pursue(&self.head, target.position, target.velocity) * PURSUE_WEIGHT;
        let cut = steering::seek(
            &self.head,
            self.intercept_point(target.position, target.velocity),
        );

        let to_target = target.position - self.head.position();
        if to_target.length() < DASH_STRIKE_DISTANCE && self.body.len() > DASH_MIN_SEGMENTS {
            let facing = angle_between(self.head.velocity().heading(), to_target.heading());
            if facing < FRAC_PI_3 {
                self.dash.start(self.body.len());
            }
        }
        pursue + cut
    }

    fn flee_from(&mut self, threat: &AgentView) -> Vec2 {
        let flee = steering::flee(&self.head, threat.position) * FLEE_WEIGHT;
        let evade = steering::evade(&self.head, threat.position, threat.velocity) * EVADE_WEIGHT;
        if self.body.len() > DASH_MIN_SEGMENTS {
            self.dash.start(self.body.len());
        }
        flee + evade
    }

    /// Push away from the trailing segments of every other live snake.
    #[must_use]
    pub fn avoid_bodies(&self, snapshot: &WorldSnapshot) -> Vec2 {
        let segments = snapshot
            .live_snakes(self.id)
            .flat_map(|view| view.segments.iter().copied());
        steering::body_avoidance(
            self.head.position(),
            segments,
            self.seg_size() * BODY_DANGER_SEGMENTS,
        ) * BODY_AVOID_WEIGHT
    }

    /// Decides, ticks the dash and composes this tick's force.
    ///
    /// Mutates only this rival: state, wander angle, dash timers and shed
    /// tail segments. Nothing moves until [`Rival::commit`].
    pub fn plan<R: Rng + ?Sized>(
        &mut self,
        snapshot: &WorldSnapshot,
        ctx: &WorldContext,
        rng: &mut R,
    ) -> StepPlan {
        if !self.alive {
            return StepPlan::default();
        }
        self.decide(snapshot, rng);
        let dropped: Vec<DroppedSegment> = self.dash.tick(&mut self.body).into_iter().collect();
        let target = self.target.and_then(|id| snapshot.live(id));

        let cruising = if self.state == AiState::Fleeing && target.is_some() {
            self.profile.normal_speed * FLEE_SPEED_BOOST
        } else {
            self.profile.normal_speed
        };
        self.head.set_max_speed(self.dash.head_speed(cruising));

        let p = self.profile;
        let wander = steering::wander(&mut self.head, rng) * p.wander_weight;
        let avoid = steering::avoid_obstacles(&self.head, &snapshot.obstacles) * p.avoid_weight;
        let proximity = steering::obstacle_proximity_push(
            self.head.position(),
            &snapshot.obstacles,
            self.seg_size() * OBSTACLE_CLEARANCE_SEGMENTS,
            self.head.max_speed(),
        ) * p.obstacle_proximity_weight;
        let boundary_weight = if self.dash.is_active() {
            p.boundaries_weight * 3.0
        } else {
            p.boundaries_weight
        };
        let boundary =
            steering::boundaries(&self.head, &ctx.bounds, RIVAL_BOUNDARY_MARGIN) * boundary_weight;

        let behaviour = match (self.state, target) {
            (AiState::Hunting, Some(target)) => self.hunt(target),
            (AiState::Fleeing, Some(threat)) => self.flee_from(threat),
            _ => wander + self.seek_food(snapshot),
        };

        StepPlan {
            force: avoid + proximity + boundary + behaviour + self.avoid_bodies(snapshot),
            dropped,
        }
    }

    /// Integrates the head, drags the body along and checks obstacle contact.
    pub fn commit(&mut self, force: Vec2, bounds: &Bounds, obstacles: &[Obstacle]) {
        if !self.alive {
            return;
        }
        self.head.apply_force(force);
        self.head.integrate();
        let clamped = bounds.clamp_inset(self.head.position(), HEAD_CLAMP_INSET);
        self.head.kinematics.position = clamped;
        self.body.follow(clamped, self.dash.segment_speed(RIVAL_SEGMENT_SPEED), bounds);

        if obstacles.iter().any(|o| o.contains_point(clamped)) {
            self.alive = false;
            debug!("rival {} ran into an obstacle", self.id);
        }
    }

    /// Grows when the head reaches a pickup of `radius` at `point`.
    pub fn try_eat(&mut self, point: Vec2, radius: f32) -> bool {
        if !self.alive || self.head.position().distance(point) >= self.seg_size() + radius {
            return false;
        }
        self.grow(1);
        true
    }

    /// Appends `count` segments.
    pub fn grow(&mut self, count: usize) {
        let head = self.head.position();
        for _ in 0..count {
            self.body.grow(head);
        }
        trace!("rival {} length {}", self.id, self.length());
    }

    /// Head and body positions as drops, for when this rival dies.
    #[must_use]
    pub fn scatter(&self) -> Vec<DroppedSegment> {
        let head = DroppedSegment {
            position: self.head.position(),
            colour: self.palette.head,
        };
        std::iter::once(head).chain(self.body.scatter()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn rival(body_len: usize) -> Rival {
        Rival::new(
            AgentId(1),
            Vec2::new(400.0, 300.0),
            body_len,
            RIVAL_SEG_SIZE,
            SkillProfile::centred(0.5, RIVAL_SEG_SIZE),
            RivalPalette::default(),
        )
    }

    fn snake(id: u32, position: Vec2, length: usize) -> AgentView {
        let mut view = AgentView::single(AgentId(id), AgentClass::Rival, position, Vec2::ZERO, 11.0);
        view.length = length;
        view
    }

    #[test]
    fn skill_fans_out_monotonically() {
        let low = SkillProfile::centred(0.0, RIVAL_SEG_SIZE);
        let high = SkillProfile::centred(1.0, RIVAL_SEG_SIZE);
        assert!(high.normal_speed > low.normal_speed);
        assert!(high.max_force > low.max_force);
        assert!(high.hunt_perception > low.hunt_perception);
        assert!(high.prey_perception > low.prey_perception);
        assert!(high.aggression > low.aggression);
        assert!(high.wander.displace_range < low.wander.displace_range);
        assert!(high.dash_cooldown < low.dash_cooldown);
        assert_eq!(low.dash_duration, 30);
        assert_eq!(high.dash_cooldown, 80);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    fn noisy_profiles_keep_their_ordering(#[case] seed: u64) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let low = SkillProfile::roll(0.0, RIVAL_SEG_SIZE, &mut rng);
        let high = SkillProfile::roll(1.0, RIVAL_SEG_SIZE, &mut rng);
        assert!(high.normal_speed > low.normal_speed);
        assert!(high.hunt_perception > low.hunt_perception);
        assert!(high.aggression > low.aggression);
    }

    #[rstest]
    #[case(0.0, 0.25)]
    #[case(0.5, 0.625)]
    #[case(1.0, 1.0)]
    fn skill_rolls_stay_in_band(#[case] difficulty: f32, #[case] ceiling: f32) {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let skill = roll_skill(difficulty, &mut rng);
            assert!((0.05..=ceiling + 1e-6).contains(&skill), "{skill}");
        }
    }

    #[test]
    fn longer_snake_in_range_forces_flight_even_while_hunting() {
        let mut me = rival(6);
        me.state = AiState::Hunting;
        me.target = Some(AgentId(2));
        let snapshot = WorldSnapshot::new(
            vec![
                snake(2, Vec2::new(700.0, 300.0), 3),
                snake(3, Vec2::new(450.0, 300.0), me.length() + 1),
            ],
            vec![],
            vec![],
        );
        let mut rng = SmallRng::seed_from_u64(9);
        me.decide(&snapshot, &mut rng);
        assert_eq!(me.state, AiState::Fleeing);
        assert_eq!(me.target, Some(AgentId(3)));
        assert_eq!(me.ai_label(), "fleeing");
    }

    #[test]
    fn aggressive_long_rival_hunts_a_dominated_snake() {
        let mut me = rival(9);
        me.profile.aggression = 1.0;
        let snapshot = WorldSnapshot::new(vec![snake(2, Vec2::new(500.0, 300.0), 3)], vec![], vec![]);
        let mut rng = SmallRng::seed_from_u64(4);
        me.decide(&snapshot, &mut rng);
        assert_eq!(me.state, AiState::Hunting);
        assert_eq!(me.target, Some(AgentId(2)));
    }

    #[test]
    fn short_rival_never_hunts() {
        let mut me = rival(4);
        me.profile.aggression = 1.0;
        let snapshot = WorldSnapshot::new(vec![snake(2, Vec2::new(500.0, 300.0), 1)], vec![], vec![]);
        let mut rng = SmallRng::seed_from_u64(4);
        me.decide(&snapshot, &mut rng);
        assert_eq!(me.state, AiState::Foraging);
    }

    #[test]
    fn dead_target_ends_the_hunt() {
        let mut me = rival(9);
        me.state = AiState::Hunting;
        me.target = Some(AgentId(2));
        let mut corpse = snake(2, Vec2::new(500.0, 300.0), 3);
        corpse.alive = false;
        let snapshot = WorldSnapshot::new(vec![corpse], vec![], vec![]);
        me.decide(&snapshot, &mut SmallRng::seed_from_u64(1));
        assert_eq!(me.state, AiState::Foraging);
        assert!(me.target.is_none());
    }

    #[test]
    fn hunts_time_out() {
        let mut me = rival(9);
        me.profile.aggression = 0.0;
        me.state = AiState::Hunting;
        me.target = Some(AgentId(2));
        me.state_timer = HUNT_TIMEOUT;
        let snapshot = WorldSnapshot::new(vec![snake(2, Vec2::new(500.0, 300.0), 3)], vec![], vec![]);
        me.decide(&snapshot, &mut SmallRng::seed_from_u64(1));
        assert_eq!(me.state, AiState::Foraging);
    }

    #[test]
    fn fleeing_ends_when_the_threat_is_far() {
        let mut me = rival(3);
        me.state = AiState::Fleeing;
        me.target = Some(AgentId(2));
        let snapshot = WorldSnapshot::new(vec![snake(2, Vec2::new(800.0, 300.0), 20)], vec![], vec![]);
        me.decide(&snapshot, &mut SmallRng::seed_from_u64(1));
        assert_eq!(me.state, AiState::Foraging);
    }

    #[test]
    fn stale_target_falls_back_to_foraging_in_plan() {
        let mut me = rival(3);
        me.state = AiState::Fleeing;
        me.target = Some(AgentId(77));
        let ctx = WorldContext::new(Bounds::new(800.0, 600.0), 50.0);
        let plan = me.plan(&WorldSnapshot::default(), &ctx, &mut SmallRng::seed_from_u64(2));
        assert_eq!(me.state, AiState::Foraging);
        assert!(plan.force.is_finite());
    }

    #[test]
    fn intercept_picks_the_nearer_side() {
        let me = rival(3);
        let point = me.intercept_point(Vec2::new(400.0, 200.0), Vec2::new(2.0, 0.0));
        assert_relative_eq!(point.x, 430.0);
        assert_relative_eq!(point.y, 235.0);
    }

    #[test]
    fn obstacles_kill_on_contact() {
        let mut me = rival(3);
        let rock = Obstacle::new(me.head.position(), 30.0);
        me.commit(Vec2::ZERO, &Bounds::new(800.0, 600.0), &[rock]);
        assert!(!me.alive);
        assert_eq!(me.scatter().len(), 4);
    }

    #[test]
    fn eating_grows_by_one() {
        let mut me = rival(3);
        assert!(me.try_eat(Vec2::new(410.0, 300.0), 5.0));
        assert_eq!(me.length(), 5);
        assert!(!me.try_eat(Vec2::new(600.0, 300.0), 5.0));
    }
}
