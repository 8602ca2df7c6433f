//! Note entities and their one-way resolution state

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{lane_x, layer_y};

/// Which hand a note (or tracked hand) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

/// Direction the hand must be travelling for a good cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CutDirection {
    Up,
    Down,
    Left,
    Right,
    #[default]
    Any,
}

impl CutDirection {
    /// Unit vector for the required direction (`None` for `Any`)
    pub fn vector(self) -> Option<Vec3> {
        match self {
            CutDirection::Up => Some(Vec3::Y),
            CutDirection::Down => Some(Vec3::NEG_Y),
            CutDirection::Left => Some(Vec3::NEG_X),
            CutDirection::Right => Some(Vec3::X),
            CutDirection::Any => None,
        }
    }
}

/// How cleanly a note was cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutQuality {
    Good,
    Ok,
}

impl CutQuality {
    pub fn is_good(self) -> bool {
        self == CutQuality::Good
    }
}

/// Resolution state of a note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoteState {
    Pending,
    Hit { at: f32, quality: CutQuality },
    Missed,
}

/// A single timed target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: u32,
    /// Scheduled time (seconds on the audio clock)
    pub time: f32,
    /// Horizontal slot (0..4)
    pub lane: u8,
    /// Vertical slot (0..3)
    pub layer: u8,
    pub hand: Hand,
    pub cut: CutDirection,
    state: NoteState,
}

impl Note {
    pub fn new(id: u32, time: f32, lane: u8, layer: u8, hand: Hand) -> Self {
        Self {
            id,
            time,
            lane: lane.min(LANE_COUNT - 1),
            layer: layer.min(LAYER_COUNT - 1),
            hand,
            cut: CutDirection::Any,
            state: NoteState::Pending,
        }
    }

    pub fn with_cut(mut self, cut: CutDirection) -> Self {
        self.cut = cut;
        self
    }

    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, NoteState::Pending)
    }

    pub fn hit_time(&self) -> Option<f32> {
        match self.state {
            NoteState::Hit { at, .. } => Some(at),
            _ => None,
        }
    }

    /// Mark the note hit. Returns false if it was already resolved.
    pub fn resolve_hit(&mut self, at: f32, quality: CutQuality) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state = NoteState::Hit { at, quality };
        true
    }

    /// Mark the note missed. Returns false if it was already resolved.
    pub fn resolve_miss(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state = NoteState::Missed;
        true
    }

    /// Depth along the track at audio time `t`
    #[inline]
    pub fn depth_at(&self, t: f32) -> f32 {
        super::collision::note_depth(self.time, t)
    }

    /// World position at audio time `t`
    pub fn world_position(&self, t: f32) -> Vec3 {
        Vec3::new(lane_x(self.lane), layer_y(self.layer), self.depth_at(t))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note-{}", self.id)
    }
}
