//! Temporary top-speed override for snake heads.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::chain::{Chain, DroppedSegment};
use crate::constants::DASH_FLOOR_SEGMENTS;

/// Extra top speed granted to body segments while dashing.
const DASH_SEGMENT_BONUS: f32 = 2.0;

/// Dash state machine: idle, dashing, cooling down.
///
/// A dash costs body mass: one tail segment is shed every `shed_interval`
/// ticks. It stops after `max_duration` ticks or when the body is down to
/// [`DASH_FLOOR_SEGMENTS`], then a cooldown runs before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dash {
    /// Head top speed while dashing.
    pub speed: f32,
    /// Longest dash in ticks.
    pub max_duration: u32,
    /// Cooldown restarted when a dash ends.
    pub cooldown_max: u32,
    /// Ticks between shed segments.
    pub shed_interval: u32,
    active: bool,
    elapsed: u32,
    cooldown: u32,
    shed_timer: u32,
}

impl Dash {
    /// Idle dash with the given tuning.
    #[must_use]
    pub const fn new(speed: f32, max_duration: u32, cooldown_max: u32, shed_interval: u32) -> Self {
        Self {
            speed,
            max_duration,
            cooldown_max,
            shed_interval,
            active: false,
            elapsed: 0,
            cooldown: 0,
            shed_timer: 0,
        }
    }

    /// Whether a dash is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Remaining cooldown ticks.
    #[must_use]
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Whether a new dash could start right now with `body_len` segments.
    #[must_use]
    pub const fn ready(&self, body_len: usize) -> bool {
        !self.active && self.cooldown == 0 && body_len > DASH_FLOOR_SEGMENTS
    }

    /// Starts a dash if ready. Returns whether it started.
    pub fn start(&mut self, body_len: usize) -> bool {
        if !self.ready(body_len) {
            return false;
        }
        self.active = true;
        self.elapsed = 0;
        self.shed_timer = 0;
        debug!("dash started at {} segments", body_len);
        true
    }

    /// Ends a running dash and restarts the cooldown.
    pub fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.cooldown = self.cooldown_max;
            debug!("dash stopped after {} ticks", self.elapsed);
        }
    }

    /// Advances timers by one tick, shedding from `body` when due.
    pub fn tick(&mut self, body: &mut Chain) -> Option<DroppedSegment> {
        self.cooldown = self.cooldown.saturating_sub(1);
        if !self.active {
            return None;
        }
        if body.len() <= DASH_FLOOR_SEGMENTS {
            self.stop();
            return None;
        }
        self.elapsed += 1;
        self.shed_timer += 1;
        let mut dropped = None;
        if self.shed_timer >= self.shed_interval {
            self.shed_timer = 0;
            dropped = body.pop_tail();
        }
        if self.elapsed >= self.max_duration || body.len() <= DASH_FLOOR_SEGMENTS {
            self.stop();
        }
        dropped
    }

    /// Head top speed for this tick.
    #[must_use]
    pub fn head_speed(&self, cruising: f32) -> f32 {
        if self.active {
            self.speed
        } else {
            cruising
        }
    }

    /// Body segment top speed for this tick.
    #[must_use]
    pub fn segment_speed(&self, cruising: f32) -> f32 {
        if self.active {
            self.speed + DASH_SEGMENT_BONUS
        } else {
            cruising
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainStyle;
    use crate::world::Rgb;
    use glam::Vec2;
    use rstest::{fixture, rstest};

    #[fixture]
    fn body() -> Chain {
        let style = ChainStyle {
            seg_size: 12.0,
            max_speed: 9.0,
            max_force: 0.5,
            body_colour: Rgb::new(0, 204, 102),
            fade_colour: Rgb::new(17, 17, 17),
            fade_length: 50,
        };
        Chain::new(Vec2::ZERO, 10, style)
    }

    #[rstest]
    fn dash_sheds_on_interval_and_times_out(mut body: Chain) {
        let mut dash = Dash::new(14.0, 30, 90, 10);
        assert!(dash.start(body.len()));
        let mut shed = 0;
        for _ in 0..30 {
            shed += usize::from(dash.tick(&mut body).is_some());
        }
        assert_eq!(shed, 3);
        assert_eq!(body.len(), 7);
        assert!(!dash.is_active());
        assert_eq!(dash.cooldown(), 90);
        assert!(!dash.start(body.len()));
    }

    #[rstest]
    fn dash_stops_at_the_segment_floor(mut body: Chain) {
        let _ = body.shrink(7, 0);
        let mut dash = Dash::new(14.0, 600, 90, 1);
        assert!(dash.start(body.len()));
        let _ = dash.tick(&mut body);
        assert_eq!(body.len(), 2);
        assert!(!dash.is_active());
    }

    #[test]
    fn short_bodies_cannot_dash() {
        let dash = Dash::new(10.0, 30, 90, 8);
        assert!(!dash.ready(2));
        assert!(dash.ready(3));
    }

    #[rstest]
    fn cooldown_counts_down(mut body: Chain) {
        let mut dash = Dash::new(10.0, 1, 3, 8);
        assert!(dash.start(body.len()));
        let _ = dash.tick(&mut body);
        assert_eq!(dash.cooldown(), 3);
        for _ in 0..3 {
            let _ = dash.tick(&mut body);
        }
        assert!(dash.ready(body.len()));
        assert!((dash.head_speed(4.0) - 4.0).abs() < f32::EPSILON);
    }
}
