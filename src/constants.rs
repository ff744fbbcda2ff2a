//! Steering and AI constants shared across behaviours.
//!
//! These values are calibrated against the fixed simulation tick (one call to
//! `integrate` per frame at roughly 60 Hz). Balancing data that varies per
//! agent lives on the agent structs and in [`crate::config`].

/// Radius inside which `arrive` scales the desired speed down linearly.
pub const SLOW_RADIUS: f32 = 100.0;
/// Ticks of target velocity used to predict a pursued or evaded position.
pub const PURSUIT_LOOKAHEAD: f32 = 10.0;

/// Ticks of velocity projected forward for the long obstacle probe.
pub const AVOID_LOOKAHEAD_TICKS: f32 = 30.0;
/// Minimum length of the long obstacle probe for a moving agent.
pub const AVOID_LOOKAHEAD_FLOOR: f32 = 20.0;

/// Default top speed of a freshly built agent.
pub const DEFAULT_MAX_SPEED: f32 = 4.0;
/// Default steering force ceiling of a freshly built agent.
pub const DEFAULT_MAX_FORCE: f32 = 0.2;
/// Default forward offset of the wander circle.
pub const DEFAULT_WANDER_DISTANCE: f32 = 200.0;
/// Default wander circle radius.
pub const DEFAULT_WANDER_RADIUS: f32 = 80.0;
/// Default per-tick wander angle jitter.
pub const DEFAULT_WANDER_DISPLACE: f32 = 0.3;

/// Chain spacing as a multiple of the segment size.
pub const SEGMENT_SPACING_FACTOR: f32 = 1.2;
/// Multiplier applied to the arrive force of a lagging segment.
pub const SEGMENT_CATCH_UP: f32 = 1.5;
/// Inset used when clamping a snake head to the world.
pub const HEAD_CLAMP_INSET: f32 = 5.0;
/// Inset used when clamping body segments to the world.
pub const SEGMENT_CLAMP_INSET: f32 = 2.0;
/// Fraction of the segment size used for head-to-body contact.
pub const BODY_CONTACT_FACTOR: f32 = 0.8;
/// First body index considered for self collision.
pub const SELF_COLLISION_SKIP: usize = 6;

/// Hunting starts above this chain length (head included) and ends below it.
pub const MIN_HUNT_LENGTH: usize = 5;
/// Hunting is abandoned once the target is this many hunt radii away.
pub const HUNT_HYSTERESIS: f32 = 1.5;
/// Ticks before a hunt gives up.
pub const HUNT_TIMEOUT: u32 = 300;
/// Ticks before fleeing gives up.
pub const FLEE_TIMEOUT: u32 = 240;
/// Distance at which a fleeing rival considers itself safe.
pub const FLEE_RELEASE_DISTANCE: f32 = 350.0;
/// Distance under which a smaller target counts as close enough to attack.
pub const HUNT_CLOSE_DISTANCE: f32 = 180.0;
/// Length advantage beyond which a target counts as dominated.
pub const DOMINANCE_MARGIN: usize = 2;
/// Ticks of target velocity used for the path-cutting intercept point.
pub const INTERCEPT_LOOKAHEAD: f32 = 15.0;
/// Sideways offset of the path-cutting intercept point.
pub const INTERCEPT_OFFSET: f32 = 35.0;
/// Distance under which a hunter may dash for the kill.
pub const DASH_STRIKE_DISTANCE: f32 = 80.0;
/// Top speed multiplier applied while fleeing.
pub const FLEE_SPEED_BOOST: f32 = 1.3;
/// Minimum body segments required before a head may dash.
pub const DASH_MIN_SEGMENTS: usize = 4;
/// Body segments a dash never sheds below.
pub const DASH_FLOOR_SEGMENTS: usize = 2;

/// Ticks a shield power-up lasts.
pub const SHIELD_TICKS: u32 = 300;
/// Ticks a speed boost power-up lasts.
pub const SPEED_BOOST_TICKS: u32 = 300;
/// Ticks a score multiplier lasts.
pub const MULTIPLIER_TICKS: u32 = 480;
/// Ticks a power-up pickup survives on the field.
pub const POWER_UP_LIFETIME: u32 = 600;
