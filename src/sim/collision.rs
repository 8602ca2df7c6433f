//! Note positioning and hit detection
//!
//! Notes never store their position: depth is recomputed from the audio clock
//! every frame, so the same `t` always yields the same answer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::note::{CutDirection, CutQuality, Hand};
use crate::consts::*;
use crate::player_anchor;

/// Smoothed hand position and velocity for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandSample {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Both hands for one frame; `None` means not tracked (never zero-filled)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandsView {
    pub left: Option<HandSample>,
    pub right: Option<HandSample>,
}

impl HandsView {
    pub fn get(&self, hand: Hand) -> Option<&HandSample> {
        match hand {
            Hand::Left => self.left.as_ref(),
            Hand::Right => self.right.as_ref(),
        }
    }
}

/// Collision thresholds (scaled by the difficulty preset)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionTuning {
    pub hand_radius: f32,
    pub good_cut_speed: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            hand_radius: HAND_COLLISION_RADIUS,
            good_cut_speed: GOOD_CUT_SPEED,
        }
    }
}

/// Depth of a note scheduled at `scheduled` when the audio clock reads `t`
#[inline]
pub fn note_depth(scheduled: f32, t: f32) -> f32 {
    PLAYER_Z - (scheduled - t) * NOTE_SPEED
}

/// Note has travelled past the miss plane
#[inline]
pub fn is_past_miss_plane(depth: f32) -> bool {
    depth > MISS_Z
}

/// Note is close enough to the player for hand collision
#[inline]
pub fn in_hit_window(depth: f32) -> bool {
    depth > PLAYER_Z + HIT_WINDOW_NEAR && depth < PLAYER_Z + HIT_WINDOW_FAR
}

/// Note lies in the band the tornado sweeps
#[inline]
pub fn in_tornado_band(depth: f32) -> bool {
    depth > PLAYER_Z + TORNADO_BAND_NEAR && depth < PLAYER_Z + TORNADO_BAND_FAR
}

/// Tornado captures a note in its band and within radius of the player anchor
pub fn tornado_captures(note_pos: Vec3) -> bool {
    in_tornado_band(note_pos.z) && player_anchor().distance(note_pos) < TORNADO_RADIUS
}

/// Grade a cut from the hand velocity
///
/// Good requires enough speed and, for directional notes, a velocity that
/// points along the required direction.
pub fn cut_quality(velocity: Vec3, cut: CutDirection, min_speed: f32) -> CutQuality {
    if velocity.length() < min_speed {
        return CutQuality::Ok;
    }
    match cut.vector() {
        Some(required) => {
            let alignment = velocity.normalize_or_zero().dot(required);
            if alignment < GOOD_CUT_ALIGNMENT {
                CutQuality::Ok
            } else {
                CutQuality::Good
            }
        }
        None => CutQuality::Good,
    }
}

/// Test a tracked hand against a note position
///
/// Returns the cut quality on contact, `None` otherwise. Callers pass `None`
/// for an untracked hand, which never collides.
pub fn hand_contact(
    note_pos: Vec3,
    hand: Option<&HandSample>,
    cut: CutDirection,
    tuning: &CollisionTuning,
) -> Option<CutQuality> {
    let hand = hand?;
    if !in_hit_window(note_pos.z) {
        return None;
    }
    if hand.position.distance(note_pos) >= tuning.hand_radius {
        return None;
    }
    Some(cut_quality(hand.velocity, cut, tuning.good_cut_speed))
}
