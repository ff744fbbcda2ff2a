//! Twin-stick horde: a keyboard-steered ship, waves of enemies and homing
//! projectiles, all built from the same steering primitives as the arena.
//!
//! [`Horde::tick`] plans every enemy against the pre-tick positions of the
//! ship and of the other enemies before any of them moves.
use std::ops::Range;

use glam::Vec2;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::agent::SteeringAgent;
use crate::chain::StepPlan;
use crate::collider::within_reach;
use crate::constants::{SHIELD_TICKS, SPEED_BOOST_TICKS};
use crate::flocking::FlockMate;
use crate::kind::{select_steering, AgentKind};
use crate::numeric::{u32_to_f32, usize_to_f32};
use crate::obstacle::{MovingObstacle, Obstacle, ObstacleField};
use crate::steering;
use crate::vector_math::VecExt;
use crate::world::{Bounds, WorldContext, WorldSnapshot};

/// Ticks of invulnerability after the ship takes a hit.
const SHIP_INVULNERABLE_TICKS: u32 = 45;
/// Idle friction applied to the ship's velocity.
const SHIP_FRICTION: f32 = 0.08;
/// Boundary margin of the ship.
const SHIP_MARGIN: f32 = 35.0;
/// Boundary margin of enemies.
const ENEMY_MARGIN: f32 = 20.0;
/// Angle between neighbouring shot lines.
const SHOT_SPREAD: f32 = 12.0 * std::f32::consts::PI / 180.0;
/// Distance from a shooter's centre at which its shot appears.
const MUZZLE_OFFSET: f32 = 22.0;
/// Slack outside the world after which a projectile is discarded.
const OFFSCREEN_SLACK: f32 = 30.0;
/// Blast radius of a bomber.
const BLAST_RADIUS: f32 = 120.0;
/// Damage a blast deals to other enemies.
const BLAST_DAMAGE: u32 = 2;
/// Longest bomber chain reaction.
const MAX_BLAST_CHAIN: u32 = 5;
/// Ticks per wave.
const WAVE_TICKS: u64 = 600;
/// Enemy cap.
const MAX_ENEMIES: usize = 60;

/// The seven enemy archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Seeks the ship.
    Normal,
    /// Fragile and quick; pursues.
    Fast,
    /// Circles round to hit from the side.
    Flanker,
    /// Slow and heavily armoured.
    Tank,
    /// Explodes on death.
    Bomber,
    /// Keeps its distance and fires homing shots.
    Shooter,
    /// Blinks to random spots around the ship.
    Teleporter,
}

/// Base tuning of an enemy archetype.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyStats {
    /// Range of the top speed.
    pub speed: Range<f32>,
    /// Force ceiling.
    pub max_force: f32,
    /// Range of the body radius.
    pub body_radius: Range<f32>,
    /// Hit points.
    pub hp: u32,
    /// Experience awarded on kill.
    pub xp: u32,
}

impl EnemyKind {
    /// Base tuning of this kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        let (speed, max_force, body_radius, hp, xp) = match self {
            Self::Normal => (3.2..4.5, 0.22, 8.0..13.0, 1, 5),
            Self::Fast => (5.5..7.0, 0.35, 5.0..8.0, 1, 8),
            Self::Flanker => (3.5..4.5, 0.30, 10.0..14.0, 2, 12),
            Self::Tank => (1.8..2.8, 0.12, 18.0..24.0, 6, 25),
            Self::Bomber => (3.0..4.0, 0.25, 10.0..14.0, 2, 15),
            Self::Shooter => (2.5..3.5, 0.18, 12.0..16.0, 3, 18),
            Self::Teleporter => (3.0..4.0, 0.20, 8.0..11.0, 2, 20),
        };
        EnemyStats {
            speed,
            max_force,
            body_radius,
            hp,
            xp,
        }
    }

    /// Picks a kind for a spawn during `wave`; later waves unlock smarter
    /// kinds and, from wave 12, stop producing normal ones.
    pub fn roll<R: Rng + ?Sized>(wave: u32, rng: &mut R) -> Self {
        let roll: f32 = rng.random();
        let table: &[(f32, Self)] = match wave {
            12.. => &[
                (0.18, Self::Shooter),
                (0.32, Self::Teleporter),
                (0.46, Self::Bomber),
                (0.62, Self::Tank),
                (0.80, Self::Flanker),
                (1.01, Self::Fast),
            ],
            9..=11 => &[
                (0.12, Self::Shooter),
                (0.22, Self::Teleporter),
                (0.34, Self::Bomber),
                (0.48, Self::Tank),
                (0.62, Self::Fast),
                (0.75, Self::Flanker),
            ],
            8 => &[
                (0.12, Self::Shooter),
                (0.25, Self::Bomber),
                (0.40, Self::Tank),
                (0.55, Self::Fast),
                (0.68, Self::Flanker),
            ],
            7 => &[
                (0.15, Self::Bomber),
                (0.30, Self::Tank),
                (0.50, Self::Fast),
                (0.65, Self::Flanker),
            ],
            5 | 6 => &[(0.18, Self::Tank), (0.38, Self::Fast), (0.52, Self::Flanker)],
            3 | 4 => &[(0.25, Self::Fast), (0.38, Self::Flanker)],
            _ => &[],
        };
        table
            .iter()
            .find(|(cut, _)| roll < *cut)
            .map_or(Self::Normal, |(_, kind)| *kind)
    }
}

/// Behaviour weights shared by every enemy, adjustable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HordeWeights {
    /// Weight of the kind-specific attack force.
    pub seek: f32,
    /// Weight of separation from other enemies.
    pub separation: f32,
    /// Weight of obstacle avoidance.
    pub avoid: f32,
    /// Weight of the boundary force.
    pub boundaries: f32,
}

impl Default for HordeWeights {
    fn default() -> Self {
        Self {
            seek: 1.0,
            separation: 2.5,
            avoid: 3.0,
            boundaries: 5.0,
        }
    }
}

/// Repeating countdown with a rerollable interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cadence {
    elapsed: u32,
    interval: u32,
}

impl Cadence {
    const fn new(interval: u32) -> Self {
        Self {
            elapsed: 0,
            interval,
        }
    }

    fn advance(&mut self) -> bool {
        self.elapsed += 1;
        self.elapsed >= self.interval
    }
}

/// One horde enemy.
#[derive(Debug, Clone, PartialEq)]
pub struct HordeEnemy {
    /// Kinematics; the collision radius is 2.5 times the body radius.
    pub agent: SteeringAgent,
    /// Archetype.
    pub kind: EnemyKind,
    /// Radius used for hits against the ship and projectiles.
    pub body_radius: f32,
    /// Remaining hit points.
    pub hp: u32,
    /// Liveness flag.
    pub alive: bool,
    /// Set when a shooter is ready to fire; the driver clears it.
    pub wants_to_fire: bool,
    /// Ticks left on the teleport flash.
    pub teleport_flash: u32,
    flank_angle: f32,
    fire: Option<Cadence>,
    teleport: Option<Cadence>,
}

impl HordeEnemy {
    /// Spawns an enemy of `kind`, scaled for `wave`.
    pub fn spawn<R: Rng + ?Sized>(position: Vec2, kind: EnemyKind, wave: u32, rng: &mut R) -> Self {
        let stats = kind.stats();
        let body_radius = rng.random_range(stats.body_radius);
        let mut max_speed = rng.random_range(stats.speed);
        let mut hp = stats.hp;
        if wave > 3 {
            max_speed += u32_to_f32(wave - 3) * 0.08;
        }
        if wave > 5 {
            hp += 1;
        }
        if wave > 9 {
            hp += 1;
        }
        let heading = Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU));
        let agent = SteeringAgent::new(position)
            .with_limits(max_speed, stats.max_force)
            .with_radius(body_radius * 2.5)
            .with_avoidance_width(body_radius)
            .with_velocity(heading * rng.random_range(1.0..2.5));
        let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let flank_angle = side * rng.random_range(std::f32::consts::FRAC_PI_3..std::f32::consts::FRAC_PI_2);
        Self {
            agent,
            kind,
            body_radius,
            hp,
            alive: true,
            wants_to_fire: false,
            teleport_flash: 0,
            flank_angle,
            fire: (kind == EnemyKind::Shooter).then(|| Cadence::new(rng.random_range(90..150))),
            teleport: (kind == EnemyKind::Teleporter)
                .then(|| Cadence::new(rng.random_range(120..240))),
        }
    }

    fn blink<R: Rng + ?Sized>(&mut self, ship: Vec2, bounds: &Bounds, rng: &mut R) {
        let Some(teleport) = self.teleport.as_mut() else {
            return;
        };
        if teleport.advance() {
            *teleport = Cadence::new(rng.random_range(100..200));
            let offset = Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU))
                * rng.random_range(100.0..250.0);
            self.agent.kinematics.position = bounds.clamp_inset(ship + offset, 40.0);
            self.agent.kinematics.velocity *= 0.2;
            self.teleport_flash = 20;
            debug!("teleporter blinked to {:?}", self.agent.position());
        }
        self.teleport_flash = self.teleport_flash.saturating_sub(1);
    }

    /// Kind-specific force toward (or around) the ship.
    #[must_use]
    pub fn attack(&self, ship: &FlockMate) -> Vec2 {
        let agent = &self.agent;
        let d = agent.position().distance(ship.position);
        match self.kind {
            EnemyKind::Normal => {
                let boost = if d < 200.0 { 1.4 } else { 1.0 };
                steering::seek(agent, ship.position) * boost
            }
            EnemyKind::Fast => {
                let boost = if d < 150.0 { 2.0 } else { 1.0 };
                steering::pursue(agent, ship.position, ship.velocity) * boost
            }
            EnemyKind::Flanker => {
                if d < 80.0 {
                    return steering::seek(agent, ship.position) * 1.8;
                }
                let target = if d > 120.0 {
                    let to_ship = ship.position - agent.position();
                    ship.position + Vec2::from_angle(self.flank_angle).rotate(to_ship).with_magnitude(80.0)
                } else {
                    ship.position
                };
                steering::seek(agent, target)
            }
            EnemyKind::Tank => steering::arrive(agent, ship.position) * 1.5,
            EnemyKind::Bomber => {
                let boost = if d < 100.0 { 2.5 } else { 1.0 };
                steering::pursue(agent, ship.position, ship.velocity) * boost
            }
            EnemyKind::Shooter => {
                if d < 130.0 {
                    steering::flee(agent, ship.position) * 2.0
                } else if d > 300.0 {
                    steering::seek(agent, ship.position)
                } else {
                    (ship.position - agent.position())
                        .perp()
                        .with_magnitude(agent.max_force())
                }
            }
            EnemyKind::Teleporter => {
                let boost = if d < 120.0 { 1.6 } else { 1.0 };
                steering::seek(agent, ship.position) * boost
            }
        }
    }

    /// Runs timers (teleport, fire) and composes this tick's force.
    ///
    /// `mates` are the pre-tick positions of every live enemy, this one
    /// included; the zero-distance entry is ignored by separation.
    pub fn plan<R: Rng + ?Sized>(
        &mut self,
        ship: &FlockMate,
        mates: &[Vec2],
        obstacles: &[Obstacle],
        bounds: &Bounds,
        weights: &HordeWeights,
        rng: &mut R,
    ) -> Vec2 {
        if !self.alive {
            return Vec2::ZERO;
        }
        self.blink(ship.position, bounds, rng);
        let d = self.agent.position().distance(ship.position);
        if let Some(fire) = self.fire.as_mut() {
            if fire.advance() && d < 400.0 {
                fire.elapsed = 0;
                self.wants_to_fire = true;
            }
        }
        let agent = &self.agent;
        self.attack(ship) * weights.seek
            + steering::separate(agent, mates.iter().copied(), agent.radius) * weights.separation
            + steering::avoid_obstacles(agent, obstacles) * weights.avoid
            + steering::boundaries(agent, bounds, ENEMY_MARGIN) * weights.boundaries
    }

    /// Integrates the planned force.
    pub fn commit(&mut self, force: Vec2) {
        if self.alive {
            self.agent.apply_force(force);
            self.agent.integrate();
        }
    }

    /// Subtracts `damage` hit points; returns whether this killed the enemy.
    pub fn take_damage(&mut self, damage: u32) -> bool {
        if !self.alive {
            return false;
        }
        self.hp = self.hp.saturating_sub(damage);
        if self.hp == 0 {
            self.alive = false;
        }
        !self.alive
    }

    fn as_mate(&self) -> FlockMate {
        FlockMate::from(&self.agent)
    }
}

/// Who fired a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotOwner {
    /// Fired by the ship; homes on enemies.
    Ship,
    /// Fired by a shooter; homes on the ship.
    Enemy,
}

/// A homing projectile: a small steering agent with a lifespan.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Kinematics.
    pub agent: SteeringAgent,
    /// Shooter side.
    pub owner: ShotOwner,
    /// Ticks since launch.
    pub age: u32,
    /// Ticks before the projectile fizzles.
    pub lifespan: u32,
    /// Damage dealt on hit.
    pub damage: u32,
    /// Liveness flag.
    pub alive: bool,
}

impl Projectile {
    /// Launches a projectile along `direction` at full speed.
    #[must_use]
    pub fn launch(position: Vec2, direction: Vec2, owner: ShotOwner) -> Self {
        let (max_speed, max_force, radius, lifespan) = match owner {
            ShotOwner::Ship => (4.0, 0.4, 6.0, 100),
            ShotOwner::Enemy => (3.5, 0.25, 7.0, 180),
        };
        let agent = SteeringAgent::new(position)
            .with_limits(max_speed, max_force)
            .with_radius(radius)
            .with_avoidance_width(6.0)
            .with_velocity(direction.with_magnitude(max_speed));
        Self {
            agent,
            owner,
            age: 0,
            lifespan,
            damage: 1,
            alive: true,
        }
    }

    /// Homing force toward the nearest target plus obstacle avoidance.
    ///
    /// Ship shots pursue the nearest target within 300 and seek farther
    /// ones; enemy shots always seek.
    #[must_use]
    pub fn plan(&self, targets: &[FlockMate], obstacles: &[Obstacle]) -> Vec2 {
        if !self.alive {
            return Vec2::ZERO;
        }
        let position = self.agent.position();
        let nearest = targets
            .iter()
            .map(|t| (t, position.distance(t.position)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let (home_weight, avoid_weight) = match self.owner {
            ShotOwner::Ship => (1.5, 2.0),
            ShotOwner::Enemy => (2.0, 1.0),
        };
        let home = nearest.map_or(Vec2::ZERO, |(target, d)| {
            if self.owner == ShotOwner::Ship && d < 300.0 {
                steering::pursue(&self.agent, target.position, target.velocity)
            } else {
                steering::seek(&self.agent, target.position)
            }
        });
        home * home_weight + steering::avoid_obstacles(&self.agent, obstacles) * avoid_weight
    }

    /// Integrates, ages and discards spent or escaped projectiles.
    pub fn commit(&mut self, force: Vec2, bounds: &Bounds) {
        if !self.alive {
            return;
        }
        self.agent.apply_force(force);
        self.agent.integrate();
        self.age += 1;
        if self.age > self.lifespan || !bounds.contains_with_slack(self.agent.position(), OFFSCREEN_SLACK) {
            self.alive = false;
        }
    }

    /// Whether this projectile touches a circle.
    #[must_use]
    pub fn touches(&self, centre: Vec2, radius: f32) -> bool {
        self.alive && within_reach(self.agent.position(), centre, self.agent.radius + radius)
    }
}

/// The player's ship.
#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    /// Kinematics.
    pub agent: SteeringAgent,
    /// Remaining hit points.
    pub hp: u32,
    /// Hit point ceiling.
    pub max_hp: u32,
    /// Ticks between shots.
    pub fire_rate: u32,
    /// Parallel shot lines per volley.
    pub shot_lines: u32,
    /// Last non-zero heading, used to aim volleys.
    pub facing: Vec2,
    /// Liveness flag.
    pub alive: bool,
    base_speed: f32,
    fire_timer: u32,
    invulnerable: u32,
    shield: u32,
    speed_boost: u32,
}

impl Ship {
    /// A fresh ship at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        let agent = SteeringAgent::new(position)
            .with_limits(5.0, 0.6)
            .with_radius(20.0)
            .with_avoidance_width(16.0);
        Self {
            base_speed: agent.max_speed(),
            agent,
            hp: 8,
            max_hp: 8,
            fire_rate: 15,
            shot_lines: 1,
            facing: Vec2::X,
            alive: true,
            fire_timer: 0,
            invulnerable: 0,
            shield: 0,
            speed_boost: 0,
        }
    }

    /// Steering from a keyboard direction: full speed toward it, friction
    /// when idle, plus avoidance and containment.
    pub fn plan(&mut self, direction: Vec2, obstacles: &[Obstacle], bounds: &Bounds) -> Vec2 {
        let agent = &self.agent;
        let drive = if direction.length_squared() > 0.0 {
            self.facing = direction.normalize_or_zero();
            steering::steer_towards_velocity(agent, direction.with_magnitude(agent.max_speed()))
        } else {
            if agent.velocity().length() > 0.5 {
                self.facing = agent.velocity().normalize_or_zero();
            }
            agent.velocity() * -SHIP_FRICTION
        };
        drive
            + steering::avoid_obstacles(agent, obstacles) * 5.0
            + steering::boundaries(agent, bounds, SHIP_MARGIN) * 8.0
    }

    /// Integrates, runs timers and clamps inside the world.
    pub fn commit(&mut self, force: Vec2, bounds: &Bounds) {
        self.agent.apply_force(force);
        self.agent.integrate();
        self.invulnerable = self.invulnerable.saturating_sub(1);
        self.fire_timer = self.fire_timer.saturating_sub(1);
        self.shield = self.shield.saturating_sub(1);
        if self.speed_boost > 0 {
            self.speed_boost -= 1;
            if self.speed_boost == 0 {
                self.agent.set_max_speed(self.base_speed);
            }
        }
        let clamped = bounds.clamp_inset(self.agent.position(), self.agent.radius);
        self.agent.kinematics.position = clamped;
    }

    /// Whether the fire timer has run out.
    #[must_use]
    pub const fn can_fire(&self) -> bool {
        self.fire_timer == 0
    }

    /// Fires a fanned volley along `facing` if the fire timer allows.
    pub fn fire(&mut self) -> Vec<Projectile> {
        if !self.alive || !self.can_fire() {
            return Vec::new();
        }
        self.fire_timer = self.fire_rate;
        let lines = self.shot_lines.max(1);
        let centre = u32_to_f32(lines - 1) / 2.0;
        (0..lines)
            .map(|i| {
                let offset = (u32_to_f32(i) - centre) * SHOT_SPREAD;
                let direction = Vec2::from_angle(offset).rotate(self.facing);
                Projectile::launch(
                    self.agent.position() + direction * MUZZLE_OFFSET,
                    direction,
                    ShotOwner::Ship,
                )
            })
            .collect()
    }

    /// Starts (or refreshes) the shield.
    pub fn activate_shield(&mut self) {
        self.shield = SHIELD_TICKS;
    }

    /// Starts (or refreshes) the speed boost.
    pub fn activate_speed_boost(&mut self) {
        self.speed_boost = SPEED_BOOST_TICKS;
        self.agent.set_max_speed(self.base_speed * 1.5);
    }

    /// Shield active.
    #[must_use]
    pub const fn is_shielded(&self) -> bool {
        self.shield > 0
    }

    /// Loses one hit point unless shielded or still invulnerable from the
    /// previous hit. Returns whether the hit landed.
    pub fn take_damage(&mut self) -> bool {
        if !self.alive || self.shield > 0 || self.invulnerable > 0 {
            return false;
        }
        self.hp = self.hp.saturating_sub(1);
        self.invulnerable = SHIP_INVULNERABLE_TICKS;
        if self.hp == 0 {
            self.alive = false;
            info!("ship destroyed");
        }
        true
    }

    fn as_mate(&self) -> FlockMate {
        FlockMate::from(&self.agent)
    }
}

/// Per-tick player input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipInput {
    /// Keyboard direction; zero when idle.
    pub direction: Vec2,
    /// Fire button held.
    pub fire: bool,
}

/// Things that happened during a horde tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HordeEvent {
    /// A new wave began.
    WaveStarted {
        /// Wave number.
        wave: u32,
    },
    /// An enemy died.
    EnemyKilled {
        /// Archetype of the dead enemy.
        kind: EnemyKind,
        /// Where it died.
        position: Vec2,
    },
    /// A bomber blew up.
    Blast {
        /// Blast centre.
        position: Vec2,
    },
    /// The ship lost a hit point.
    ShipHit {
        /// Hit points left.
        hp: u32,
    },
}

/// Twin-stick game driver.
#[derive(Debug, Clone)]
pub struct Horde {
    /// The ship.
    pub ship: Ship,
    /// Live enemies.
    pub enemies: Vec<HordeEnemy>,
    /// Ship projectiles in flight.
    pub shots: Vec<Projectile>,
    /// Enemy projectiles in flight.
    pub enemy_shots: Vec<Projectile>,
    /// Static and moving obstacles.
    pub obstacles: ObstacleField,
    /// World rectangle.
    pub bounds: Bounds,
    /// Enemy behaviour weights.
    pub weights: HordeWeights,
    /// Current wave.
    pub wave: u32,
    /// Ticks played.
    pub time: u64,
    /// Score.
    pub score: u32,
    spawn_timer: u32,
    spawn_interval: u32,
    spawn_count: u32,
    rng: SmallRng,
}

impl Horde {
    /// A fresh game: ship in the centre, scattered obstacles, six enemies.
    #[must_use]
    pub fn new(bounds: Bounds, seed: u64) -> Self {
        let centre = bounds.origin + bounds.size * 0.5;
        let mut horde = Self {
            ship: Ship::new(centre),
            enemies: Vec::new(),
            shots: Vec::new(),
            enemy_shots: Vec::new(),
            obstacles: ObstacleField::new(),
            bounds,
            weights: HordeWeights::default(),
            wave: 1,
            time: 0,
            score: 0,
            spawn_timer: 0,
            spawn_interval: 90,
            spawn_count: 2,
            rng: SmallRng::seed_from_u64(seed),
        };
        horde.place_obstacles();
        for _ in 0..6 {
            horde.spawn_enemy();
        }
        horde
    }

    fn place_obstacles(&mut self) {
        let count = self.rng.random_range(5..9);
        let centre = self.bounds.origin + self.bounds.size * 0.5;
        for _ in 0..count {
            for _ in 0..100 {
                let radius = self.rng.random_range(20.0..50.0);
                let (min, max) = self.bounds.inset_corners(radius + 80.0);
                if min.x >= max.x || min.y >= max.y {
                    break;
                }
                let position = Vec2::new(
                    self.rng.random_range(min.x..max.x),
                    self.rng.random_range(min.y..max.y),
                );
                let clear = position.distance(centre) > 160.0
                    && self
                        .obstacles
                        .statics
                        .iter()
                        .all(|o| position.distance(o.position) >= radius + o.radius + 40.0);
                if clear {
                    self.obstacles.statics.push(Obstacle::new(position, radius));
                    break;
                }
            }
        }
    }

    /// Spawns one enemy just outside a random edge.
    pub fn spawn_enemy(&mut self) {
        if self.enemies.len() >= MAX_ENEMIES {
            return;
        }
        let min = self.bounds.origin;
        let max = self.bounds.max();
        let along_x = self.rng.random_range(min.x..=max.x);
        let along_y = self.rng.random_range(min.y..=max.y);
        let position = match self.rng.random_range(0..4_u8) {
            0 => Vec2::new(along_x, min.y - 40.0),
            1 => Vec2::new(along_x, max.y + 40.0),
            2 => Vec2::new(min.x - 40.0, along_y),
            _ => Vec2::new(max.x + 40.0, along_y),
        };
        let kind = EnemyKind::roll(self.wave, &mut self.rng);
        let enemy = HordeEnemy::spawn(position, kind, self.wave, &mut self.rng);
        self.enemies.push(enemy);
    }

    fn advance_waves(&mut self, events: &mut Vec<HordeEvent>) {
        self.spawn_timer += 1;
        if self.spawn_timer >= self.spawn_interval {
            self.spawn_timer = 0;
            for _ in 0..self.spawn_count {
                self.spawn_enemy();
            }
        }
        if self.time % WAVE_TICKS == 0 {
            self.wave += 1;
            self.spawn_count = (self.spawn_count + 1).min(8);
            self.spawn_interval = self.spawn_interval.saturating_sub(5).max(20);
            events.push(HordeEvent::WaveStarted { wave: self.wave });
            info!("wave {} begins", self.wave);
            if self.wave >= 4 {
                let cap = usize::try_from((1 + (self.wave - 4) / 2).min(5)).unwrap_or(5);
                if self.obstacles.moving.len() < cap {
                    let radius = self.rng.random_range(18.0..32.0);
                    let (min, max) = self.bounds.inset_corners(radius + 40.0);
                    let position = Vec2::new(
                        self.rng.random_range(min.x..=max.x),
                        self.rng.random_range(min.y..=max.y),
                    );
                    let mover = MovingObstacle::new(position, radius, &mut self.rng);
                    self.obstacles.moving.push(mover);
                }
            }
        }
    }

    /// Advances the game by one tick.
    ///
    /// Every mover plans against one pre-tick view of the ship, the pack and
    /// the obstacles before anything moves. Volleys launch from the committed
    /// positions and hits resolve last.
    pub fn tick(&mut self, input: &ShipInput) -> Vec<HordeEvent> {
        let mut events = Vec::new();
        if !self.ship.alive {
            return events;
        }
        self.time += 1;
        self.advance_waves(&mut events);

        let snapshot = WorldSnapshot::new(Vec::new(), self.obstacles.all(), Vec::new());
        let plans = self.plan_all(input.direction, &snapshot);
        self.commit_all(plans);

        if input.fire {
            let volley = self.ship.fire();
            self.shots.extend(volley);
        }
        self.launch_enemy_shots();

        let obstacles = self.obstacles.all();
        self.resolve_hits(&obstacles, &mut events);

        self.enemies.retain(|e| e.alive);
        self.shots.retain(|s| s.alive);
        self.enemy_shots.retain(|s| s.alive);
        events
    }

    /// Plans the ship, enemies, enemy shots, ship shots and moving obstacles,
    /// in that order.
    fn plan_all(&mut self, direction: Vec2, snapshot: &WorldSnapshot) -> Vec<StepPlan> {
        let ship = self.ship.as_mate();
        let ship_target = [ship];
        let mates: Vec<Vec2> = self
            .enemies
            .iter()
            .filter(|e| e.alive)
            .map(|e| e.agent.position())
            .collect();
        let targets: Vec<FlockMate> = self
            .enemies
            .iter()
            .filter(|e| e.alive)
            .map(HordeEnemy::as_mate)
            .collect();
        let weights = self.weights;

        let mut kinds: Vec<AgentKind<'_>> = Vec::new();
        kinds.push(AgentKind::Ship {
            ship: &mut self.ship,
            direction,
        });
        kinds.extend(self.enemies.iter_mut().map(|enemy| AgentKind::Enemy {
            enemy,
            ship,
            mates: &mates,
            weights,
        }));
        kinds.extend(self.enemy_shots.iter().map(|shot| AgentKind::Projectile {
            shot,
            targets: &ship_target,
        }));
        kinds.extend(self.shots.iter().map(|shot| AgentKind::Projectile {
            shot,
            targets: &targets,
        }));
        kinds.extend(self.obstacles.planning_kinds(&snapshot.obstacles));

        let mut ctx = WorldContext::new(self.bounds, ENEMY_MARGIN);
        ctx.tick = self.time;
        let rng = &mut self.rng;
        kinds
            .iter_mut()
            .map(|kind| select_steering(kind, snapshot, &ctx, rng))
            .collect()
    }

    /// Applies the plans in the order [`Horde::plan_all`] produced them.
    fn commit_all(&mut self, plans: Vec<StepPlan>) {
        let bounds = self.bounds;
        let mut plans = plans.into_iter();
        let ship_plan = plans.next().unwrap_or_default();
        let enemy_plans: Vec<StepPlan> = plans.by_ref().take(self.enemies.len()).collect();
        let enemy_shot_plans: Vec<StepPlan> = plans.by_ref().take(self.enemy_shots.len()).collect();
        let shot_plans: Vec<StepPlan> = plans.by_ref().take(self.shots.len()).collect();
        let mover_plans: Vec<StepPlan> = plans.collect();

        self.ship.commit(ship_plan.force, &bounds);
        for (enemy, plan) in self.enemies.iter_mut().zip(enemy_plans) {
            enemy.commit(plan.force);
        }
        for (shot, plan) in self.enemy_shots.iter_mut().zip(enemy_shot_plans) {
            shot.commit(plan.force, &bounds);
        }
        for (shot, plan) in self.shots.iter_mut().zip(shot_plans) {
            shot.commit(plan.force, &bounds);
        }
        for (mover, plan) in self.obstacles.moving.iter_mut().zip(mover_plans) {
            mover.commit(plan.force, &bounds);
        }
    }

    /// Turns shooters that finished their cadence into enemy projectiles
    /// aimed at the ship.
    fn launch_enemy_shots(&mut self) {
        let target = self.ship.agent.position();
        for enemy in self.enemies.iter_mut().filter(|e| e.alive && e.wants_to_fire) {
            enemy.wants_to_fire = false;
            let direction = (target - enemy.agent.position()).normalize_or_zero();
            let mut shot = Projectile::launch(
                enemy.agent.position() + direction * 20.0,
                direction,
                ShotOwner::Enemy,
            );
            if self.wave > 10 {
                let extra = u32_to_f32(self.wave - 10);
                let speed = shot.agent.max_speed() + extra * 0.1;
                shot.agent.set_max_speed(speed);
                shot.agent.kinematics.max_force += extra * 0.02;
            }
            self.enemy_shots.push(shot);
        }
    }

    fn hit_ship(&mut self, events: &mut Vec<HordeEvent>) {
        if self.ship.take_damage() {
            events.push(HordeEvent::ShipHit { hp: self.ship.hp });
        }
    }

    fn resolve_hits(&mut self, obstacles: &[Obstacle], events: &mut Vec<HordeEvent>) {
        let mut blasts: Vec<(usize, u32)> = Vec::new();

        for shot in self.shots.iter_mut().filter(|s| s.alive) {
            let victim = self
                .enemies
                .iter_mut()
                .enumerate()
                .find(|(_, e)| e.alive && shot.touches(e.agent.position(), e.body_radius));
            if let Some((slot, enemy)) = victim {
                shot.alive = false;
                if enemy.take_damage(shot.damage) {
                    self.score += 10;
                    events.push(HordeEvent::EnemyKilled {
                        kind: enemy.kind,
                        position: enemy.agent.position(),
                    });
                    if enemy.kind == EnemyKind::Bomber {
                        blasts.push((slot, 0));
                    }
                }
            }
        }

        for shot in self.shots.iter_mut().chain(self.enemy_shots.iter_mut()) {
            if obstacles.iter().any(|o| shot.touches(o.position, o.radius)) {
                shot.alive = false;
            }
        }

        let ship_position = self.ship.agent.position();
        let ship_radius = self.ship.agent.radius;
        let mut contacts = 0_usize;
        for (slot, enemy) in self.enemies.iter_mut().enumerate() {
            if enemy.alive && within_reach(ship_position, enemy.agent.position(), ship_radius + enemy.body_radius) {
                contacts += 1;
                if enemy.kind == EnemyKind::Bomber {
                    enemy.alive = false;
                    blasts.push((slot, 0));
                }
            }
        }
        for _ in 0..contacts {
            self.hit_ship(events);
        }

        for obstacle in obstacles {
            let offset = self.ship.agent.position() - obstacle.position;
            let reach = self.ship.agent.radius + obstacle.radius;
            let d = offset.length();
            if d < reach {
                self.ship.agent.kinematics.position += offset.with_magnitude(reach - d);
                self.hit_ship(events);
            }
        }

        let mut enemy_shot_hits = 0_usize;
        for shot in self.enemy_shots.iter_mut().filter(|s| s.alive) {
            if self.ship.alive && shot.touches(self.ship.agent.position(), self.ship.agent.radius) {
                shot.alive = false;
                enemy_shot_hits += 1;
            }
        }
        for _ in 0..enemy_shot_hits {
            self.hit_ship(events);
        }

        for shot in self.shots.iter_mut().filter(|s| s.alive) {
            let intercepted = self
                .enemy_shots
                .iter_mut()
                .find(|e| e.alive && shot.touches(e.agent.position(), e.agent.radius));
            if let Some(enemy_shot) = intercepted {
                enemy_shot.alive = false;
                shot.alive = false;
                self.score += 3;
            }
        }

        self.detonate(blasts, events);
    }

    fn detonate(&mut self, mut blasts: Vec<(usize, u32)>, events: &mut Vec<HordeEvent>) {
        while let Some((source, depth)) = blasts.pop() {
            let Some(centre) = self.enemies.get(source).map(|e| e.agent.position()) else {
                continue;
            };
            events.push(HordeEvent::Blast { position: centre });
            if within_reach(self.ship.agent.position(), centre, BLAST_RADIUS) {
                self.hit_ship(events);
            }
            for (slot, enemy) in self.enemies.iter_mut().enumerate() {
                if slot == source || !within_reach(enemy.agent.position(), centre, BLAST_RADIUS) {
                    continue;
                }
                if enemy.take_damage(BLAST_DAMAGE) {
                    events.push(HordeEvent::EnemyKilled {
                        kind: enemy.kind,
                        position: enemy.agent.position(),
                    });
                    if enemy.kind == EnemyKind::Bomber && depth < MAX_BLAST_CHAIN {
                        blasts.push((slot, depth + 1));
                    }
                }
            }
        }
    }

    /// Live enemies per kind, for HUDs and summaries.
    #[must_use]
    pub fn census(&self) -> Vec<(EnemyKind, usize)> {
        let mut counts: Vec<(EnemyKind, usize)> = Vec::new();
        for enemy in self.enemies.iter().filter(|e| e.alive) {
            match counts.iter_mut().find(|(kind, _)| *kind == enemy.kind) {
                Some((_, n)) => *n += 1,
                None => counts.push((enemy.kind, 1)),
            }
        }
        counts
    }

    /// Mean enemy speed, for HUDs and summaries.
    #[must_use]
    pub fn mean_enemy_speed(&self) -> f32 {
        if self.enemies.is_empty() {
            return 0.0;
        }
        let total: f32 = self.enemies.iter().map(|e| e.agent.velocity().length()).sum();
        total / usize_to_f32(self.enemies.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn bounds() -> Bounds {
        Bounds::new(1000.0, 800.0)
    }

    fn enemy(kind: EnemyKind, position: Vec2) -> HordeEnemy {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut enemy = HordeEnemy::spawn(position, kind, 1, &mut rng);
        enemy.agent.kinematics.velocity = Vec2::ZERO;
        enemy
    }

    fn still_ship(position: Vec2) -> FlockMate {
        FlockMate {
            position,
            velocity: Vec2::ZERO,
        }
    }

    #[rstest]
    #[case::first_wave(1)]
    #[case::second_wave(2)]
    fn early_waves_only_spawn_normal_enemies(#[case] wave: u32) {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!((0..200).all(|_| EnemyKind::roll(wave, &mut rng) == EnemyKind::Normal));
    }

    #[test]
    fn late_waves_never_spawn_normal_enemies() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!((0..200).all(|_| EnemyKind::roll(12, &mut rng) != EnemyKind::Normal));
    }

    #[test]
    fn later_waves_add_hit_points() {
        let mut rng = SmallRng::seed_from_u64(1);
        let tank = HordeEnemy::spawn(Vec2::ZERO, EnemyKind::Tank, 10, &mut rng);
        assert_eq!(tank.hp, 8);
    }

    #[test]
    fn shooters_back_off_when_close() {
        let shooter = enemy(EnemyKind::Shooter, Vec2::new(100.0, 0.0));
        let force = shooter.attack(&still_ship(Vec2::ZERO));
        assert!(force.x > 0.0);
    }

    #[test]
    fn shooters_strafe_at_mid_range() {
        let shooter = enemy(EnemyKind::Shooter, Vec2::new(200.0, 0.0));
        let force = shooter.attack(&still_ship(Vec2::ZERO));
        assert_relative_eq!(force.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(force.length(), shooter.agent.max_force(), epsilon = 1e-6);
    }

    #[test]
    fn shooters_eventually_want_to_fire() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut shooter = enemy(EnemyKind::Shooter, Vec2::new(200.0, 400.0));
        let ship = still_ship(Vec2::new(400.0, 400.0));
        let weights = HordeWeights::default();
        for _ in 0..150 {
            let _ = shooter.plan(&ship, &[], &[], &bounds(), &weights, &mut rng);
        }
        assert!(shooter.wants_to_fire);
    }

    #[test]
    fn teleporters_blink_near_the_ship() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut blinker = enemy(EnemyKind::Teleporter, Vec2::new(50.0, 50.0));
        let ship = still_ship(Vec2::new(500.0, 400.0));
        let weights = HordeWeights::default();
        let mut blinked = false;
        for _ in 0..240 {
            let _ = blinker.plan(&ship, &[], &[], &bounds(), &weights, &mut rng);
            if blinker.teleport_flash > 0 {
                blinked = true;
                break;
            }
        }
        assert!(blinked);
        assert!(blinker.agent.position().distance(ship.position) <= 250.5);
    }

    #[test]
    fn ship_shots_home_on_the_nearest_enemy() {
        let shot = Projectile::launch(Vec2::ZERO, Vec2::X, ShotOwner::Ship);
        let targets = [still_ship(Vec2::new(0.0, 100.0)), still_ship(Vec2::new(0.0, -500.0))];
        assert!(shot.plan(&targets, &[]).y > 0.0);
    }

    #[test]
    fn projectiles_expire() {
        let mut shot = Projectile::launch(Vec2::new(500.0, 400.0), Vec2::X, ShotOwner::Ship);
        shot.agent.kinematics.max_speed = 0.0;
        shot.agent.kinematics.velocity = Vec2::ZERO;
        for _ in 0..=shot.lifespan {
            shot.commit(Vec2::ZERO, &bounds());
        }
        assert!(!shot.alive);
    }

    #[test]
    fn projectiles_leaving_the_world_are_dropped() {
        let mut shot = Projectile::launch(Vec2::new(-29.0, 400.0), -Vec2::X, ShotOwner::Enemy);
        shot.commit(Vec2::ZERO, &bounds());
        assert!(!shot.alive);
    }

    #[test]
    fn ship_is_briefly_invulnerable_after_a_hit() {
        let mut ship = Ship::new(Vec2::new(500.0, 400.0));
        assert!(ship.take_damage());
        assert!(!ship.take_damage());
        assert_eq!(ship.hp, 7);
        ship.activate_shield();
        for _ in 0..SHIP_INVULNERABLE_TICKS {
            ship.commit(Vec2::ZERO, &bounds());
        }
        assert!(!ship.take_damage());
    }

    #[test]
    fn volleys_fan_out_and_respect_fire_rate() {
        let mut ship = Ship::new(Vec2::new(500.0, 400.0));
        ship.shot_lines = 3;
        let volley = ship.fire();
        assert_eq!(volley.len(), 3);
        assert!(ship.fire().is_empty());
        let ys: Vec<f32> = volley.iter().map(|p| p.agent.velocity().y).collect();
        assert!(ys.iter().any(|y| *y > 0.0) && ys.iter().any(|y| *y < 0.0));
    }

    #[test]
    fn horde_runs_and_keeps_the_ship_inside() {
        let mut horde = Horde::new(bounds(), 42);
        let input = ShipInput {
            direction: Vec2::new(1.0, 0.0),
            fire: true,
        };
        for _ in 0..300 {
            let _ = horde.tick(&input);
        }
        let position = horde.ship.agent.position();
        assert!(bounds().contains_with_slack(position, 0.0));
        assert!(horde.time > 0);
    }

    #[test]
    fn enemies_plan_against_the_ship_before_it_moves() {
        let mut left = Horde::new(bounds(), 7);
        let mut right = left.clone();
        let _ = left.tick(&ShipInput {
            direction: Vec2::new(-1.0, 0.0),
            fire: false,
        });
        let _ = right.tick(&ShipInput {
            direction: Vec2::new(1.0, 0.0),
            fire: false,
        });
        assert!(left.ship.agent.velocity().x < right.ship.agent.velocity().x);
        let velocities = |horde: &Horde| -> Vec<Vec2> { horde.enemies.iter().map(|e| e.agent.velocity()).collect() };
        assert!(!left.enemies.is_empty());
        assert_eq!(velocities(&left), velocities(&right));
    }

    #[test]
    fn wandering_obstacles_move_with_the_horde() {
        let mut horde = Horde::new(bounds(), 3);
        let mut rng = SmallRng::seed_from_u64(4);
        horde
            .obstacles
            .moving
            .push(MovingObstacle::new(Vec2::new(500.0, 150.0), 20.0, &mut rng));
        let before = horde.obstacles.moving[0].agent.position();
        let _ = horde.tick(&ShipInput::default());
        assert_ne!(horde.obstacles.moving[0].agent.position(), before);
    }

    #[test]
    fn bombers_take_neighbours_with_them() {
        let mut horde = Horde::new(bounds(), 1);
        horde.enemies.clear();
        horde.ship.agent.kinematics.position = Vec2::new(900.0, 700.0);
        let mut rng = SmallRng::seed_from_u64(2);
        horde.enemies.push(HordeEnemy::spawn(Vec2::new(100.0, 100.0), EnemyKind::Bomber, 1, &mut rng));
        horde.enemies.push(HordeEnemy::spawn(Vec2::new(150.0, 100.0), EnemyKind::Normal, 1, &mut rng));
        let mut events = Vec::new();
        horde.detonate(vec![(0, 0)], &mut events);
        assert!(!horde.enemies[1].alive);
        assert!(events.iter().any(|e| matches!(e, HordeEvent::Blast { .. })));
    }
}
