//! Hand smoothing and velocity estimation

use glam::Vec3;

use super::landmarks::{HandDetection, hand_to_world};
use crate::sim::{Hand, HandSample, HandsView};

/// Weight of the new sample when blending with the previous position
pub const HAND_LERP: f32 = 0.6;
/// Frames closer together than this (seconds) keep the previous velocity
pub const MIN_VELOCITY_DT: f32 = 0.001;

/// Smoothed state of one tracked hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandState {
    pub position: Vec3,
    pub previous: Vec3,
    pub velocity: Vec3,
}

impl HandState {
    fn acquire(position: Vec3) -> Self {
        Self {
            position,
            previous: position,
            velocity: Vec3::ZERO,
        }
    }

    fn follow(&self, raw: Vec3, dt: f32) -> Self {
        let position = self.position.lerp(raw, HAND_LERP);
        let velocity = if dt > MIN_VELOCITY_DT {
            (position - self.position) / dt
        } else {
            self.velocity
        };
        Self {
            position,
            previous: self.position,
            velocity,
        }
    }

    pub fn sample(&self) -> HandSample {
        HandSample {
            position: self.position,
            velocity: self.velocity,
        }
    }
}

/// Per-hand smoothing over the tracking stream
///
/// A hand missing from a frame becomes `None` immediately; it is never
/// extrapolated.
#[derive(Debug, Clone, Default)]
pub struct HandTracker {
    left: Option<HandState>,
    right: Option<HandState>,
    last_timestamp_ms: Option<f64>,
    mirror: bool,
}

impl HandTracker {
    pub fn new(mirror: bool) -> Self {
        Self {
            mirror,
            ..Default::default()
        }
    }

    /// Fold one processed frame's detections in
    pub fn update(&mut self, detections: &[HandDetection], timestamp_ms: f64) {
        let dt = match self.last_timestamp_ms {
            Some(last) => ((timestamp_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_timestamp_ms = Some(timestamp_ms);

        // Later detections of the same hand win
        let mut raw_left = None;
        let mut raw_right = None;
        for detection in detections {
            let Some(tip) = detection.fingertip() else {
                continue;
            };
            let world = hand_to_world(tip, self.mirror);
            match detection.hand {
                Hand::Left => raw_left = Some(world),
                Hand::Right => raw_right = Some(world),
            }
        }

        self.left = Self::advance(self.left, raw_left, dt);
        self.right = Self::advance(self.right, raw_right, dt);
    }

    fn advance(current: Option<HandState>, raw: Option<Vec3>, dt: f32) -> Option<HandState> {
        let raw = raw?;
        Some(match current {
            Some(state) => state.follow(raw, dt),
            None => HandState::acquire(raw),
        })
    }

    pub fn get(&self, hand: Hand) -> Option<&HandState> {
        match hand {
            Hand::Left => self.left.as_ref(),
            Hand::Right => self.right.as_ref(),
        }
    }

    pub fn view(&self) -> HandsView {
        HandsView {
            left: self.left.map(|s| s.sample()),
            right: self.right.map(|s| s.sample()),
        }
    }

    pub fn reset(&mut self) {
        self.left = None;
        self.right = None;
        self.last_timestamp_ms = None;
    }
}
