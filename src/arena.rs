//! Headless snake arena: the player, rivals, prey, boids, power-ups and
//! obstacles stepped together one tick at a time.
//!
//! Every tick follows the same order:
//!
//! 1. snapshot the world and plan every agent against it;
//! 2. commit wandering obstacles, then every other agent;
//! 3. resolve eating, then snake collisions;
//! 4. turn the dead into food, respawn rivals and top populations up.
//!
//! The arena owns its random number generator, so a seed fully determines a
//! run.
use glam::Vec2;
use log::{debug, info, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::chain::{DroppedSegment, StepPlan};
use crate::collision::{self, SnakeBody};
use crate::config::ArenaConfig;
use crate::flocking::{Boid, FlockMate};
use crate::kind::{select_steering, AgentKind, Pickup};
use crate::numeric::{map_range, ticks_from_f32, u32_to_f32, usize_to_f32};
use crate::obstacle::{MovingObstacle, Obstacle, ObstacleField};
use crate::player::{Control, PlayerSnake};
use crate::prey::{PowerUp, PowerUpKind, Prey, PreyKind};
use crate::rival::{AiState, Rival, RivalPalette};
use crate::world::{AgentClass, AgentView, Bounds, FoodItem, Rgb, WorldContext, WorldSnapshot};

/// Radius of food shed by a dash.
const SHED_FOOD_RADIUS: f32 = 5.0;
/// Radius of food left by a dead snake.
const CORPSE_FOOD_RADIUS: f32 = 6.0;
/// Points for a food pellet.
const FOOD_POINTS: u32 = 5;
/// Points for killing a rival.
const RIVAL_KILL_POINTS: u32 = 50;
/// Tail segments lost to poison.
const POISON_SHRINK: usize = 3;
/// Segments a rival gains from a power-up.
const RIVAL_POWER_UP_GROWTH: usize = 2;
/// Score at which difficulty saturates.
const DIFFICULTY_SCORE: f32 = 2000.0;
/// Spread of a respawned rival's difficulty around the arena's.
const RIVAL_DIFFICULTY_JITTER: f32 = 0.3;
/// Ticks between passive autoplay score awards.
const AUTOPLAY_SCORE_INTERVAL: u64 = 120;
/// Static obstacles never drop below this count.
const MIN_STATIC_OBSTACLES: usize = 3;
/// Score thresholds that grow the flock.
const MILESTONES: [u32; 6] = [100, 250, 500, 1000, 2000, 5000];
/// Share of the flock present at score zero.
const OPENING_FLOCK_SHARE: f32 = 0.4;
/// Closest a rival may spawn to the player.
const RIVAL_CLEARANCE: f32 = 200.0;
/// Placement attempts before a spawn gives up on its constraints.
const SPAWN_ATTEMPTS: u32 = 50;

/// Why an agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Head entered an obstacle.
    Obstacle,
    /// Lost a snake-versus-snake collision.
    Collision,
    /// Head looped into its own body.
    SelfCollision,
    /// Touched a flocking enemy.
    Boid,
}

/// Notable things that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ArenaEvent {
    /// A dashing snake shed a tail segment as food.
    SegmentDropped {
        /// Snake that shed it.
        owner: AgentId,
        /// Where the food landed.
        position: Vec2,
    },
    /// A snake ate prey or food.
    FoodEaten {
        /// Eater.
        by: AgentId,
        /// Points scored (zero for rivals and poison).
        points: u32,
    },
    /// Poison prey shrank the player.
    Poisoned {
        /// Length after shrinking.
        length: usize,
    },
    /// A snake collected a power-up.
    PowerUpCollected {
        /// Collector.
        by: AgentId,
        /// Power-up type.
        kind: PowerUpKind,
    },
    /// A snake died.
    AgentDied {
        /// The dead snake.
        id: AgentId,
        /// Player or rival.
        class: AgentClass,
        /// Length at death.
        length: usize,
        /// What killed it.
        cause: DeathCause,
    },
    /// A dead rival's slot was refilled.
    RivalRespawned {
        /// New rival id.
        id: AgentId,
        /// Skill rolled for the newcomer.
        skill: f32,
    },
    /// The score crossed a milestone.
    Milestone {
        /// Threshold crossed.
        score: u32,
    },
}

/// Per-rival line in an [`ArenaSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RivalSummary {
    /// Rival id.
    pub id: AgentId,
    /// Chain length.
    pub length: usize,
    /// Current AI state.
    pub state: AiState,
    /// Liveness.
    pub alive: bool,
}

/// Serializable picture of the arena for logs and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSummary {
    /// Ticks run so far.
    pub tick: u64,
    /// Player score.
    pub score: u32,
    /// Rivals killed by the player.
    pub kills: u32,
    /// Current difficulty.
    pub difficulty: f32,
    /// Whether the player is alive.
    pub player_alive: bool,
    /// Player length.
    pub player_length: usize,
    /// Player AI label.
    pub player_state: String,
    /// Rival lines.
    pub rivals: Vec<RivalSummary>,
    /// Live prey.
    pub prey: usize,
    /// Boids.
    pub boids: usize,
    /// Food pellets.
    pub food: usize,
    /// Power-ups on the field.
    pub power_ups: usize,
    /// Static obstacles.
    pub obstacles: usize,
    /// Wandering obstacles.
    pub moving_obstacles: usize,
}

/// The whole snake game minus rendering and input.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Settings the arena was built from.
    pub config: ArenaConfig,
    /// Bounds, margin, tick and pointer handed to every plan.
    pub ctx: WorldContext,
    /// The player.
    pub player: PlayerSnake,
    /// Rival slots; dead rivals stay until respawned.
    pub rivals: Vec<Rival>,
    /// Flocking enemies with their ids.
    pub boids: Vec<(AgentId, Boid)>,
    /// Prey.
    pub prey: Vec<Prey>,
    /// Power-ups.
    pub power_ups: Vec<PowerUp>,
    /// Static and wandering obstacles.
    pub obstacles: ObstacleField,
    /// Food pellets.
    pub food: Vec<FoodItem>,
    /// Player score.
    pub score: u32,
    /// Rivals killed by the player.
    pub kills: u32,
    respawn_timers: Vec<u32>,
    power_up_timer: u32,
    obstacle_spawn_timer: u32,
    obstacle_despawn_timer: u32,
    last_milestone: u32,
    next_id: u32,
    rng: SmallRng,
}

/// Uniform point inside `bounds` shrunk by `inset`.
fn random_in<R: Rng + ?Sized>(rng: &mut R, bounds: &Bounds, inset: f32) -> Vec2 {
    let (min, max) = bounds.inset_corners(inset);
    Vec2::new(
        rng.random_range(min.x..=max.x),
        rng.random_range(min.y..=max.y),
    )
}

/// First random point accepted by `accept`, if any within the attempt budget.
fn find_spot<R, F>(rng: &mut R, bounds: &Bounds, inset: f32, accept: F) -> Option<Vec2>
where
    R: Rng + ?Sized,
    F: Fn(Vec2) -> bool,
{
    (0..SPAWN_ATTEMPTS)
        .map(|_| random_in(rng, bounds, inset))
        .find(|spot| accept(*spot))
}

fn clear_of(obstacles: &[Obstacle], point: Vec2, gap: f32) -> bool {
    obstacles
        .iter()
        .all(|o| o.position.distance(point) >= o.radius + gap)
}

fn palette_for(palettes: &[RivalPalette], slot: usize) -> RivalPalette {
    slot.checked_rem(palettes.len())
        .and_then(|index| palettes.get(index))
        .copied()
        .unwrap_or_default()
}

impl Arena {
    /// Builds the opening arena: obstacles, prey, the opening flock and the
    /// rivals around a centred player.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        let bounds = config.bounds();
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let centre = bounds.origin + bounds.size * 0.5;
        let mut player = PlayerSnake::new(AgentId(0), centre, config.player, &mut rng);
        if config.autoplay {
            player.control = Control::Autoplay;
        }
        let mut arena = Self {
            ctx: WorldContext::new(bounds, config.margin),
            player,
            rivals: Vec::new(),
            boids: Vec::new(),
            prey: Vec::new(),
            power_ups: Vec::new(),
            obstacles: ObstacleField::new(),
            food: Vec::new(),
            score: 0,
            kills: 0,
            respawn_timers: Vec::new(),
            power_up_timer: 0,
            obstacle_spawn_timer: 0,
            obstacle_despawn_timer: 0,
            last_milestone: 0,
            next_id: 1,
            rng,
            config,
        };
        for _ in 0..arena.config.obstacles {
            arena.spawn_obstacle();
        }
        for _ in 0..arena.config.initial_prey {
            arena.spawn_prey();
        }
        arena.grow_flock();
        for slot in 0..arena.config.rivals {
            let rival = arena.spawn_rival(slot, centre);
            arena.rivals.push(rival);
            arena.respawn_timers.push(0);
        }
        info!(
            "arena {}x{} ready: {} rivals, {} prey, {} boids, {} obstacles",
            bounds.width(),
            bounds.height(),
            arena.rivals.len(),
            arena.prey.len(),
            arena.boids.len(),
            arena.obstacles.len()
        );
        arena
    }

    /// Difficulty in `[initial_difficulty, 1]`, rising with score.
    #[must_use]
    pub fn difficulty(&self) -> f32 {
        let floor = self.config.initial_difficulty;
        map_range(u32_to_f32(self.score), 0.0, DIFFICULTY_SCORE, floor, 1.0).clamp(floor, 1.0)
    }

    /// Whether the player has died.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        !self.player.alive
    }

    /// Read-only copy of every agent, obstacle and pellet.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut agents: Vec<AgentView> = Vec::with_capacity(
            1 + self.rivals.len() + self.boids.len() + self.prey.len() + self.power_ups.len(),
        );
        agents.push(self.player.view());
        agents.extend(self.rivals.iter().map(Rival::view));
        agents.extend(self.boids.iter().map(|(id, boid)| {
            AgentView::single(
                *id,
                AgentClass::Boid,
                boid.agent.position(),
                boid.agent.velocity(),
                boid.agent.radius,
            )
        }));
        agents.extend(self.prey.iter().map(Prey::view));
        agents.extend(self.power_ups.iter().map(PowerUp::view));
        WorldSnapshot::new(agents, self.obstacles.all(), self.food.clone())
    }

    /// Advances the arena by one tick and reports what happened.
    pub fn tick(&mut self) -> Vec<ArenaEvent> {
        let mut events = Vec::new();
        self.ctx.tick += 1;
        let snapshot = self.snapshot();
        let plans = self.plan_all(&snapshot);
        let mut fallen = self.commit_all(plans, &mut events);
        self.feed(&mut events);
        fallen.extend(self.collide(&mut events));
        self.bury(&fallen, &mut events);
        self.respawn_rivals(&mut events);
        self.replenish();
        if self.player.alive
            && self.player.control == Control::Autoplay
            && self.ctx.tick % AUTOPLAY_SCORE_INTERVAL == 0
        {
            self.award(u32::try_from(self.player.length()).unwrap_or(u32::MAX), &mut events);
        }
        trace!(
            "tick {} score {} events {}",
            self.ctx.tick,
            self.score,
            events.len()
        );
        events
    }

    /// Summary of the current state.
    #[must_use]
    pub fn summary(&self) -> ArenaSummary {
        ArenaSummary {
            tick: self.ctx.tick,
            score: self.score,
            kills: self.kills,
            difficulty: self.difficulty(),
            player_alive: self.player.alive,
            player_length: self.player.length(),
            player_state: self.player.ai_label().to_owned(),
            rivals: self
                .rivals
                .iter()
                .map(|rival| RivalSummary {
                    id: rival.id,
                    length: rival.length(),
                    state: rival.state,
                    alive: rival.alive,
                })
                .collect(),
            prey: self.prey.len(),
            boids: self.boids.len(),
            food: self.food.len(),
            power_ups: self.power_ups.len(),
            obstacles: self.obstacles.statics.len(),
            moving_obstacles: self.obstacles.moving.len(),
        }
    }

    /// Player head, or a point infinitely far away once the player is dead.
    fn player_clearance(&self) -> Vec2 {
        if self.player.alive {
            self.player.head.position()
        } else {
            Vec2::splat(f32::INFINITY)
        }
    }

    fn issue_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn plan_all(&mut self, snapshot: &WorldSnapshot) -> Vec<StepPlan> {
        let flock: Vec<FlockMate> = self
            .boids
            .iter()
            .map(|(_, boid)| FlockMate::from(&boid.agent))
            .collect();
        let mut kinds: Vec<AgentKind<'_>> = Vec::new();
        kinds.push(AgentKind::Player(&mut self.player));
        kinds.extend(self.rivals.iter_mut().map(AgentKind::RivalHead));
        kinds.extend(self.boids.iter_mut().enumerate().map(|(slot, (_, boid))| {
            let mates = flock
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != slot)
                .map(|(_, mate)| *mate)
                .collect();
            AgentKind::FlockMember { boid, mates }
        }));
        kinds.extend(
            self.prey
                .iter_mut()
                .map(|prey| AgentKind::Pickup(Pickup::Prey(prey))),
        );
        kinds.extend(
            self.power_ups
                .iter_mut()
                .map(|pickup| AgentKind::Pickup(Pickup::PowerUp(pickup))),
        );
        kinds.extend(self.obstacles.planning_kinds(&snapshot.obstacles));
        let ctx = self.ctx;
        let rng = &mut self.rng;
        kinds
            .iter_mut()
            .map(|kind| select_steering(kind, snapshot, &ctx, rng))
            .collect()
    }

    /// Applies the plans in the order [`Arena::plan_all`] produced them and
    /// returns snakes killed by obstacles.
    fn commit_all(
        &mut self,
        plans: Vec<StepPlan>,
        events: &mut Vec<ArenaEvent>,
    ) -> Vec<(AgentId, DeathCause)> {
        let bounds = self.ctx.bounds;
        let mut plans = plans.into_iter();
        let player_plan = plans.next().unwrap_or_default();
        let rival_plans: Vec<StepPlan> = plans.by_ref().take(self.rivals.len()).collect();
        let boid_plans: Vec<StepPlan> = plans.by_ref().take(self.boids.len()).collect();
        let prey_plans: Vec<StepPlan> = plans.by_ref().take(self.prey.len()).collect();
        let power_plans: Vec<StepPlan> = plans.by_ref().take(self.power_ups.len()).collect();
        let mover_plans: Vec<StepPlan> = plans.collect();

        for (mover, plan) in self.obstacles.moving.iter_mut().zip(mover_plans) {
            mover.commit(plan.force, &bounds);
        }
        let obstacles = self.obstacles.all();
        let mut fallen = Vec::new();

        let was_alive = self.player.alive;
        self.player.commit(player_plan.force, &bounds, &obstacles);
        if was_alive && !self.player.alive {
            fallen.push((self.player.id, DeathCause::Obstacle));
        }
        let mut shed: Vec<(AgentId, DroppedSegment)> = player_plan
            .dropped
            .into_iter()
            .map(|segment| (self.player.id, segment))
            .collect();

        for (rival, plan) in self.rivals.iter_mut().zip(rival_plans) {
            let was_alive = rival.alive;
            rival.commit(plan.force, &bounds, &obstacles);
            if was_alive && !rival.alive {
                fallen.push((rival.id, DeathCause::Obstacle));
            }
            shed.extend(plan.dropped.into_iter().map(|segment| (rival.id, segment)));
        }
        for ((_, boid), plan) in self.boids.iter_mut().zip(boid_plans) {
            boid.commit(plan.force);
        }
        for (prey, plan) in self.prey.iter_mut().zip(prey_plans) {
            prey.commit(plan.force);
        }
        for (pickup, plan) in self.power_ups.iter_mut().zip(power_plans) {
            pickup.commit(plan.force);
        }

        for (owner, segment) in shed {
            self.drop_food(segment.position, SHED_FOOD_RADIUS, segment.colour);
            events.push(ArenaEvent::SegmentDropped {
                owner,
                position: segment.position,
            });
        }
        fallen
    }

    fn drop_food(&mut self, position: Vec2, radius: f32, colour: Rgb) {
        if self.food.len() < self.config.max_food {
            self.food.push(FoodItem {
                position,
                radius,
                colour,
            });
        }
    }

    fn award(&mut self, points: u32, events: &mut Vec<ArenaEvent>) {
        self.score = self.score.saturating_add(points);
        let crossed = MILESTONES
            .iter()
            .copied()
            .find(|m| self.score >= *m && self.last_milestone < *m);
        if let Some(milestone) = crossed {
            self.last_milestone = milestone;
            info!("milestone {milestone} reached");
            events.push(ArenaEvent::Milestone { score: milestone });
            self.grow_flock();
        }
    }

    /// Prey, then food, then power-ups; the player always gets first bite.
    fn feed(&mut self, events: &mut Vec<ArenaEvent>) {
        let multiplier = self.player.power.score_multiplier();
        let mut earned = self.eat_prey(multiplier, events);
        earned.extend(self.eat_food(multiplier, events));
        self.collect_power_ups(events);
        for points in earned {
            self.award(points, events);
        }
    }

    fn eat_prey(&mut self, multiplier: u32, events: &mut Vec<ArenaEvent>) -> Vec<u32> {
        let mut earned = Vec::new();
        for prey in self.prey.iter_mut().filter(|p| p.alive) {
            let position = prey.agent.position();
            if prey.kind == PreyKind::Poison && self.player.reaches(position, prey.draw_radius) {
                self.player.shrink(POISON_SHRINK);
                prey.alive = false;
                events.push(ArenaEvent::Poisoned {
                    length: self.player.length(),
                });
                continue;
            }
            if self.player.try_eat(position, prey.draw_radius) {
                prey.alive = false;
                let points = prey.points().saturating_mul(multiplier);
                earned.push(points);
                events.push(ArenaEvent::FoodEaten {
                    by: self.player.id,
                    points,
                });
                continue;
            }
            let radius = prey.draw_radius;
            if let Some(rival) = self
                .rivals
                .iter_mut()
                .find_map(|r| r.try_eat(position, radius).then_some(r))
            {
                prey.alive = false;
                events.push(ArenaEvent::FoodEaten {
                    by: rival.id,
                    points: 0,
                });
            }
        }
        self.prey.retain(|p| p.alive);
        earned
    }

    fn eat_food(&mut self, multiplier: u32, events: &mut Vec<ArenaEvent>) -> Vec<u32> {
        let mut earned = Vec::new();
        let player = &mut self.player;
        let rivals = &mut self.rivals;
        self.food.retain(|pellet| {
            if player.try_eat(pellet.position, pellet.radius) {
                let points = FOOD_POINTS.saturating_mul(multiplier);
                earned.push(points);
                events.push(ArenaEvent::FoodEaten {
                    by: player.id,
                    points,
                });
                return false;
            }
            let Some(rival) = rivals
                .iter_mut()
                .find_map(|r| r.try_eat(pellet.position, pellet.radius).then_some(r))
            else {
                return true;
            };
            events.push(ArenaEvent::FoodEaten {
                by: rival.id,
                points: 0,
            });
            false
        });
        earned
    }

    fn collect_power_ups(&mut self, events: &mut Vec<ArenaEvent>) {
        let player = &mut self.player;
        let rivals = &mut self.rivals;
        self.power_ups.retain(|pickup| {
            if pickup.expired() {
                return false;
            }
            let position = pickup.agent.position();
            let radius = pickup.agent.radius;
            if player.reaches(position, radius) {
                match pickup.kind {
                    PowerUpKind::Shield => player.power.activate_shield(),
                    PowerUpKind::Speed => player.power.activate_speed_boost(),
                    PowerUpKind::Multiplier => player.power.activate_multiplier(),
                }
                events.push(ArenaEvent::PowerUpCollected {
                    by: player.id,
                    kind: pickup.kind,
                });
                return false;
            }
            let Some(rival) = rivals
                .iter_mut()
                .find(|r| r.alive && r.head.position().distance(position) < r.seg_size() + radius)
            else {
                return true;
            };
            rival.grow(RIVAL_POWER_UP_GROWTH);
            events.push(ArenaEvent::PowerUpCollected {
                by: rival.id,
                kind: pickup.kind,
            });
            false
        });
    }

    /// Snake pairs, player against boids, then player self-collision.
    fn collide(&mut self, events: &mut Vec<ArenaEvent>) -> Vec<(AgentId, DeathCause)> {
        let mut views: Vec<AgentView> = Vec::with_capacity(1 + self.rivals.len());
        views.push(self.player.view());
        views.extend(self.rivals.iter().map(Rival::view));
        let dead = collision::resolve_all(&views);

        let multiplier = self.player.power.score_multiplier();
        let mut credited = 0;
        if let Some((player_view, rival_views)) = views.split_first() {
            if player_view.alive {
                let player_body = SnakeBody::from(player_view);
                credited = rival_views
                    .iter()
                    .filter(|view| view.alive && dead.contains(&view.id))
                    .filter(|view| collision::resolve_pair(&player_body, &SnakeBody::from(*view)).b_dies())
                    .count();
            }
        }
        let credited = u32::try_from(credited).unwrap_or(u32::MAX);
        self.kills = self.kills.saturating_add(credited);
        let bonus = credited.saturating_mul(RIVAL_KILL_POINTS * multiplier);

        let mut fallen: Vec<(AgentId, DeathCause)> = dead
            .into_iter()
            .map(|id| (id, DeathCause::Collision))
            .collect();
        for (id, _) in &fallen {
            if *id == self.player.id {
                self.player.alive = false;
            } else if let Some(rival) = self.rivals.iter_mut().find(|r| r.id == *id) {
                rival.alive = false;
            }
        }

        if self.player.alive && !self.player.power.has_shield() {
            let head = self.player.head.position();
            let reach = self.player.seg_size();
            if self
                .boids
                .iter()
                .any(|(_, boid)| head.distance(boid.agent.position()) < reach + boid.agent.radius)
            {
                self.player.alive = false;
                fallen.push((self.player.id, DeathCause::Boid));
            }
        }
        if self.player.alive && self.player.hits_itself() {
            self.player.alive = false;
            fallen.push((self.player.id, DeathCause::SelfCollision));
        }
        if bonus > 0 {
            self.award(bonus, events);
        }
        fallen
    }

    /// Turns this tick's dead into food and starts rival respawn timers.
    fn bury(&mut self, fallen: &[(AgentId, DeathCause)], events: &mut Vec<ArenaEvent>) {
        for (id, cause) in fallen {
            let (drops, class, length) = if *id == self.player.id {
                (self.player.scatter(), AgentClass::Player, self.player.length())
            } else if let Some(rival) = self.rivals.iter().find(|r| r.id == *id) {
                (rival.scatter(), AgentClass::Rival, rival.length())
            } else {
                continue;
            };
            for drop in drops {
                self.drop_food(drop.position, CORPSE_FOOD_RADIUS, drop.colour);
            }
            match class {
                AgentClass::Player => info!("player died ({cause:?}) at length {length}"),
                _ => debug!("rival {id} died ({cause:?}) at length {length}"),
            }
            events.push(ArenaEvent::AgentDied {
                id: *id,
                class,
                length,
                cause: *cause,
            });
        }
    }

    fn respawn_rivals(&mut self, events: &mut Vec<ArenaEvent>) {
        let delay = self.config.rival_respawn_delay;
        let due: Vec<usize> = self
            .rivals
            .iter()
            .zip(self.respawn_timers.iter_mut())
            .enumerate()
            .filter_map(|(slot, (rival, timer))| {
                if rival.alive {
                    *timer = 0;
                    return None;
                }
                *timer += 1;
                (*timer >= delay).then_some(slot)
            })
            .collect();
        for slot in due {
            let rival = self.spawn_rival(slot, self.player_clearance());
            events.push(ArenaEvent::RivalRespawned {
                id: rival.id,
                skill: rival.profile.skill,
            });
            if let Some(entry) = self.rivals.get_mut(slot) {
                *entry = rival;
            }
            if let Some(timer) = self.respawn_timers.get_mut(slot) {
                *timer = 0;
            }
        }
    }

    /// Spawns a rival for `slot` away from `keep_clear` and the obstacles.
    fn spawn_rival(&mut self, slot: usize, keep_clear: Vec2) -> Rival {
        let bounds = self.ctx.bounds;
        let statics = self.obstacles.statics.clone();
        let position = find_spot(&mut self.rng, &bounds, 100.0, |spot| {
            spot.distance(keep_clear) >= RIVAL_CLEARANCE && clear_of(&statics, spot, 50.0)
        })
        .unwrap_or_else(|| random_in(&mut self.rng, &bounds, 100.0));
        let jitter = self
            .rng
            .random_range(-RIVAL_DIFFICULTY_JITTER..=RIVAL_DIFFICULTY_JITTER);
        let difficulty = (self.difficulty() + jitter).clamp(0.05, 1.0);
        let palette = palette_for(&self.config.palettes, slot);
        let id = self.issue_id();
        Rival::spawn(id, position, difficulty, palette, &mut self.rng)
    }

    fn spawn_prey(&mut self) {
        let bounds = self.ctx.bounds;
        let statics = self.obstacles.statics.clone();
        let player = self.player_clearance();
        let position = find_spot(&mut self.rng, &bounds, 60.0, |spot| {
            clear_of(&statics, spot, 30.0) && spot.distance(player) >= 100.0
        })
        .unwrap_or_else(|| random_in(&mut self.rng, &bounds, 60.0));
        let kind = PreyKind::roll(self.difficulty(), &mut self.rng);
        let id = self.issue_id();
        self.prey.push(Prey::spawn(id, position, kind, &mut self.rng));
    }

    fn spawn_obstacle(&mut self) {
        let bounds = self.ctx.bounds;
        let centre = bounds.origin + bounds.size * 0.5;
        let radius = self.rng.random_range(25.0..55.0);
        let mut heads: Vec<(Vec2, f32)> = Vec::new();
        if self.player.alive {
            heads.push((self.player.head.position(), self.player.seg_size()));
            heads.extend(
                self.player
                    .body
                    .positions()
                    .map(|p| (p, self.player.seg_size())),
            );
        }
        heads.extend(
            self.rivals
                .iter()
                .filter(|r| r.alive)
                .map(|r| (r.head.position(), r.seg_size())),
        );
        let statics = self.obstacles.statics.clone();
        let spot = find_spot(&mut self.rng, &bounds, radius + 60.0, |spot| {
            spot.distance(centre) >= 150.0
                && heads
                    .iter()
                    .all(|(p, seg)| spot.distance(*p) >= radius + seg + 20.0)
                && clear_of(&statics, spot, radius + 30.0)
        });
        if let Some(position) = spot {
            self.obstacles.statics.push(Obstacle::new(position, radius));
            debug!("obstacle placed at {position:?} r {radius:.1}");
        }
    }

    fn spawn_moving_obstacle(&mut self) {
        let bounds = self.ctx.bounds;
        let everything = self.obstacles.all();
        let player = self.player_clearance();
        let position = find_spot(&mut self.rng, &bounds, 100.0, |spot| {
            clear_of(&everything, spot, 60.0) && spot.distance(player) >= 150.0
        })
        .unwrap_or_else(|| random_in(&mut self.rng, &bounds, 100.0));
        let radius = self.rng.random_range(18.0..32.0);
        let mover = MovingObstacle::new(position, radius, &mut self.rng);
        self.obstacles.moving.push(mover);
    }

    fn spawn_power_up(&mut self) {
        let bounds = self.ctx.bounds;
        let statics = self.obstacles.statics.clone();
        let position = find_spot(&mut self.rng, &bounds, 80.0, |spot| clear_of(&statics, spot, 40.0))
            .unwrap_or_else(|| random_in(&mut self.rng, &bounds, 80.0));
        let kind = PowerUpKind::roll(&mut self.rng);
        let id = self.issue_id();
        self.power_ups
            .push(PowerUp::spawn(id, position, kind, &mut self.rng));
        debug!("power-up {kind:?} spawned");
    }

    /// Tops the flock up towards its score-scaled size.
    fn grow_flock(&mut self) {
        let full = usize_to_f32(self.config.boids);
        let share = if self.player.control == Control::Autoplay {
            full
        } else {
            map_range(
                u32_to_f32(self.score),
                0.0,
                DIFFICULTY_SCORE,
                full * OPENING_FLOCK_SHARE,
                full,
            )
            .clamp(0.0, full)
        };
        let desired = usize::try_from(ticks_from_f32(share))
            .unwrap_or(0)
            .min(self.config.max_boids);
        let bounds = self.ctx.bounds;
        let player = self.player_clearance();
        while self.boids.len() < desired {
            let position = find_spot(&mut self.rng, &bounds, 50.0, |spot| {
                spot.distance(player) >= 200.0
            })
            .unwrap_or_else(|| random_in(&mut self.rng, &bounds, 50.0));
            let id = self.issue_id();
            let boid = Boid::new(position, &mut self.rng);
            self.boids.push((id, boid));
        }
    }

    /// Prey, power-ups and both kinds of obstacle.
    fn replenish(&mut self) {
        while self.prey.len() < self.config.max_prey {
            self.spawn_prey();
        }
        self.boids.truncate(self.config.max_boids);

        self.power_up_timer += 1;
        if self.power_up_timer >= self.config.power_up_interval
            && self.power_ups.len() < self.config.max_power_ups
        {
            self.spawn_power_up();
            self.power_up_timer = 0;
        }

        self.obstacle_spawn_timer += 1;
        self.obstacle_despawn_timer += 1;
        if self.obstacle_spawn_timer >= self.config.obstacle_spawn_interval
            && self.obstacles.statics.len() < self.config.max_obstacles
        {
            self.spawn_obstacle();
            self.obstacle_spawn_timer = 0;
        }
        if self.obstacle_despawn_timer >= self.config.obstacle_despawn_interval
            && self.obstacles.statics.len() > MIN_STATIC_OBSTACLES
        {
            if self.player.alive {
                self.obstacles
                    .remove_farthest_from(self.player.head.position());
            } else {
                let slot = self.rng.random_range(0..self.obstacles.statics.len());
                self.obstacles.statics.remove(slot);
            }
            self.obstacle_despawn_timer = 0;
        }

        let desired = usize::try_from(self.score / self.config.moving_obstacle_score_step.max(1))
            .unwrap_or(usize::MAX)
            .min(self.config.max_moving_obstacles);
        while self.obstacles.moving.len() < desired {
            self.spawn_moving_obstacle();
        }
    }
}
