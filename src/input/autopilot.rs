//! Synthetic tracking driver for demos and headless runs
//!
//! Produces the same `TrackingFrame`s a camera pipeline would: each hand's
//! fingertip is steered onto the next note it owns, with a small vertical
//! swipe so cuts carry speed, and a standing body pose that briefly strikes
//! a spell gesture at scripted song times.

use std::f32::consts::TAU;

use glam::Vec3;

use super::landmarks::*;
use crate::sim::{GameState, Hand, Spell};
use crate::{lane_x, layer_y};

/// Swipe amplitude (world units) and rate (Hz)
const SWIPE_AMPLITUDE: f32 = 0.3;
const SWIPE_HZ: f32 = 2.0;
/// Notes this far past their time are no longer targeted (seconds)
const TARGET_GRACE: f32 = 0.1;

const REST_SHOULDER_Y: f32 = 0.4;
const REST_HIP_Y: f32 = 0.7;
const REST_CENTER_X: f32 = 0.5;

/// Deterministic stand-in for a tracked player
#[derive(Debug, Clone)]
pub struct Autopilot {
    mirror: bool,
    /// (song time, spell) pairs, sorted by time
    script: Vec<(f32, Spell)>,
    next_cast: usize,
}

impl Autopilot {
    pub fn new(mirror: bool) -> Self {
        Self {
            mirror,
            script: Vec::new(),
            next_cast: 0,
        }
    }

    /// Strike the gesture for `spell` once the song reaches `at`
    pub fn with_cast(mut self, at: f32, spell: Spell) -> Self {
        self.script.push((at, spell));
        self.script.sort_by(|a, b| a.0.total_cmp(&b.0));
        self
    }

    pub fn reset(&mut self) {
        self.next_cast = 0;
    }

    /// Build the tracking frame for this instant
    pub fn frame(&mut self, state: &GameState, song_time: f32, timestamp_ms: f64) -> TrackingFrame {
        let swipe = (song_time * SWIPE_HZ * TAU).sin() * SWIPE_AMPLITUDE;
        let hands = [Hand::Left, Hand::Right]
            .into_iter()
            .map(|hand| {
                let target = self.target_for(state, hand, song_time) + Vec3::new(0.0, swipe, 0.0);
                HandDetection::from_fingertip(hand, world_to_hand(target, self.mirror))
            })
            .collect();

        let pose = match self.script.get(self.next_cast) {
            Some(&(at, spell)) if song_time >= at => {
                self.next_cast += 1;
                log::debug!("Autopilot strikes {} pose at {:.2}s", spell.as_str(), song_time);
                gesture_pose(spell)
            }
            _ => standing_pose(REST_CENTER_X),
        };

        TrackingFrame {
            timestamp_ms,
            hands,
            pose: Some(pose),
        }
    }

    /// Where `hand` should be: on its next pending note, or at rest
    fn target_for(&self, state: &GameState, hand: Hand, t: f32) -> Vec3 {
        let next = state
            .chart
            .iter()
            .filter(|n| n.hand == hand && n.is_pending() && n.time + TARGET_GRACE >= t)
            .min_by(|a, b| a.time.total_cmp(&b.time));
        match next {
            Some(note) => Vec3::new(lane_x(note.lane), layer_y(note.layer), 0.0),
            None => {
                let lane = match hand {
                    Hand::Left => 1,
                    Hand::Right => 2,
                };
                Vec3::new(lane_x(lane), layer_y(1), 0.0)
            }
        }
    }
}

/// Upright pose with arms hanging down
pub fn standing_pose(center_x: f32) -> PoseDetection {
    let (sy, hy) = (REST_SHOULDER_Y, REST_HIP_Y);
    PoseDetection::empty()
        .with(LEFT_SHOULDER, Landmark::new(center_x + 0.1, sy))
        .with(RIGHT_SHOULDER, Landmark::new(center_x - 0.1, sy))
        .with(LEFT_HIP, Landmark::new(center_x + 0.08, hy))
        .with(RIGHT_HIP, Landmark::new(center_x - 0.08, hy))
        .with(LEFT_ELBOW, Landmark::new(center_x + 0.15, sy + 0.15))
        .with(RIGHT_ELBOW, Landmark::new(center_x - 0.15, sy + 0.15))
        .with(LEFT_WRIST, Landmark::new(center_x + 0.15, sy + 0.3))
        .with(RIGHT_WRIST, Landmark::new(center_x - 0.15, sy + 0.3))
}

/// One-frame pose that trips the classifier for `spell` against a standing
/// baseline. The spin needs a full shoulder history behind it.
pub fn gesture_pose(spell: Spell) -> PoseDetection {
    let cx = REST_CENTER_X;
    match spell {
        Spell::Lightning => {
            let up = REST_SHOULDER_Y - 0.12;
            standing_pose(cx)
                .with(LEFT_SHOULDER, Landmark::new(cx + 0.1, up))
                .with(RIGHT_SHOULDER, Landmark::new(cx - 0.1, up))
        }
        Spell::Shield => {
            let down = REST_HIP_Y + 0.15;
            standing_pose(cx)
                .with(LEFT_HIP, Landmark::new(cx + 0.08, down))
                .with(RIGHT_HIP, Landmark::new(cx - 0.08, down))
        }
        Spell::Tornado => standing_pose(cx + 0.35),
        Spell::Freeze => standing_pose(cx)
            .with(RIGHT_WRIST, Landmark::new(cx + 0.08, REST_SHOULDER_Y + 0.01))
            .with(LEFT_ELBOW, Landmark::new(cx + 0.05, REST_SHOULDER_Y))
            .with(LEFT_WRIST, Landmark::new(cx - 0.15, REST_SHOULDER_Y)),
    }
}
