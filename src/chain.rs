//! Leader-following snake bodies.
//!
//! Segment `i` follows segment `i - 1`; segment 0 follows the head, which is
//! driven from outside the chain. A lagging segment arrives at its leader with
//! a catch-up multiplier. Inside the desired spacing it brakes instead of
//! coasting so a chain behind a stationary head settles.
use glam::Vec2;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::agent::SteeringAgent;
use crate::constants::{SEGMENT_CATCH_UP, SEGMENT_CLAMP_INSET, SEGMENT_SPACING_FACTOR};
use crate::kind::AgentKind;
use crate::numeric::{map_range, usize_to_f32};
use crate::steering;
use crate::vector_math::VecExt;
use crate::world::{Bounds, Rgb};

/// Position and tint of a segment that left a chain.
///
/// The world turns these into food pellets or particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroppedSegment {
    /// Last known position of the segment.
    pub position: Vec2,
    /// Segment colour.
    pub colour: Rgb,
}

/// Result of planning one agent's tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepPlan {
    /// Force to apply at commit time.
    pub force: Vec2,
    /// Segments shed while planning (dash).
    pub dropped: Vec<DroppedSegment>,
}

impl StepPlan {
    /// Plan with a force and nothing shed.
    #[must_use]
    pub const fn force(force: Vec2) -> Self {
        Self {
            force,
            dropped: Vec::new(),
        }
    }
}

/// A trailing body segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Kinematics of the segment.
    pub agent: SteeringAgent,
    /// Tint, darkening towards the tail.
    pub colour: Rgb,
}

/// Segment tuning and palette of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainStyle {
    /// Segment radius.
    pub seg_size: f32,
    /// Segment top speed outside a dash.
    pub max_speed: f32,
    /// Segment force ceiling.
    pub max_force: f32,
    /// Colour of the first segment.
    pub body_colour: Rgb,
    /// Colour approached by long tails.
    pub fade_colour: Rgb,
    /// Length at which the fade colour is fully reached.
    pub fade_length: usize,
}

/// Force keeping one segment `spacing` behind its leader.
///
/// A lagging segment arrives at the leader with the catch-up multiplier; a
/// segment already inside the spacing brakes toward rest.
///
/// With no force inside the spacing a segment keeps its velocity and carries
/// on past it: behind a head that stops dead, an 11-unit chain coasts until
/// the first gap reads 15.50415 against a desired spacing of 13.200001, and
/// the tail never settles. Braking holds every gap within half a unit of the
/// spacing once the head is still (`chain_settles_behind_a_stationary_head`).
#[must_use]
pub fn segment_force(agent: &SteeringAgent, leader: Vec2, spacing: f32) -> Vec2 {
    if agent.position().distance(leader) > spacing {
        steering::arrive(agent, leader) * SEGMENT_CATCH_UP
    } else {
        (-agent.velocity()).limit(agent.max_force())
    }
}

/// Ordered body segments behind an externally driven head.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    segments: Vec<Segment>,
    /// Tuning shared by every segment.
    pub style: ChainStyle,
}

impl Chain {
    /// Lays `length` segments out to the left of `head`, one `seg_size` apart.
    #[must_use]
    pub fn new(head: Vec2, length: usize, style: ChainStyle) -> Self {
        let mut chain = Self {
            segments: Vec::with_capacity(length),
            style,
        };
        for i in 0..length {
            let offset = Vec2::new(usize_to_f32(i + 1) * style.seg_size, 0.0);
            let colour = chain.colour_at(i);
            chain.segments.push(chain.make_segment(head - offset, colour));
        }
        chain
    }

    fn make_segment(&self, position: Vec2, colour: Rgb) -> Segment {
        let agent = SteeringAgent::new(position)
            .with_limits(self.style.max_speed, self.style.max_force)
            .with_radius(self.style.seg_size);
        Segment { agent, colour }
    }

    fn colour_at(&self, index: usize) -> Rgb {
        let fade = usize_to_f32(self.style.fade_length.max(1));
        let t = map_range(usize_to_f32(index), 0.0, fade, 0.0, 1.0);
        self.style.body_colour.lerp(self.style.fade_colour, t)
    }

    /// Distance each segment tries to keep from its leader.
    #[must_use]
    pub fn desired_spacing(&self) -> f32 {
        self.style.seg_size * SEGMENT_SPACING_FACTOR
    }

    /// Number of body segments (the head is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether only the head is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Body segments, head side first.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segment positions, head side first.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.segments.iter().map(|segment| segment.agent.position())
    }

    /// Advances every segment one tick behind `head`.
    ///
    /// Segments are processed head to tail, each following the freshly
    /// moved position of its leader. `segment_speed` overrides the top speed
    /// (dashing bodies stretch faster).
    pub fn follow(&mut self, head: Vec2, segment_speed: f32, bounds: &Bounds) {
        let spacing = self.desired_spacing();
        let mut leader = head;
        for segment in &mut self.segments {
            let agent = &mut segment.agent;
            agent.set_max_speed(segment_speed);
            let force = AgentKind::BodySegment {
                agent: &*agent,
                leader,
                spacing,
            }
            .direct_force(&[])
            .unwrap_or(Vec2::ZERO);
            agent.apply_force(force);
            agent.integrate();
            let clamped = bounds.clamp_inset(agent.position(), SEGMENT_CLAMP_INSET);
            agent.kinematics.position = clamped;
            leader = agent.position();
        }
    }

    /// Appends a segment at the tail (or at `head` for a bare head).
    pub fn grow(&mut self, head: Vec2) {
        let at = self.segments.last().map_or(head, |tail| tail.agent.position());
        let colour = self.colour_at(self.segments.len());
        let segment = self.make_segment(at, colour);
        self.segments.push(segment);
        trace!("chain grew to {} segments", self.segments.len());
    }

    /// Removes the tail segment and reports where it was.
    pub fn pop_tail(&mut self) -> Option<DroppedSegment> {
        self.segments.pop().map(|segment| DroppedSegment {
            position: segment.agent.position(),
            colour: segment.colour,
        })
    }

    /// Removes up to `count` tail segments while more than `keep` remain.
    pub fn shrink(&mut self, count: usize, keep: usize) -> Vec<DroppedSegment> {
        let mut dropped = Vec::new();
        for _ in 0..count {
            if self.segments.len() <= keep {
                break;
            }
            dropped.extend(self.pop_tail());
        }
        dropped
    }

    /// Every segment as a drop, for when the owner dies. The chain itself is
    /// left untouched so the corpse can still be drawn this frame.
    #[must_use]
    pub fn scatter(&self) -> Vec<DroppedSegment> {
        self.segments
            .iter()
            .map(|segment| DroppedSegment {
                position: segment.agent.position(),
                colour: segment.colour,
            })
            .collect()
    }
}
