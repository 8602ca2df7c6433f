//! Body-gesture → spell classifier
//!
//! Four independent checks run on every pose frame outside cooldown. They are
//! not short-circuited: when two fire in the same frame the later one
//! overwrites the single pending slot.

use std::collections::VecDeque;

use super::landmarks::*;
use crate::sim::Spell;

/// Shoulder rise (normalized image Y) that counts as a jump
pub const JUMP_THRESHOLD: f32 = 0.08;
/// Hip drop that counts as a squat
pub const SQUAT_THRESHOLD: f32 = 0.1;
/// Shoulder-X samples kept for spin detection
pub const SPIN_WINDOW: usize = 15;
/// Lateral shoulder travel across the window that counts as a spin
pub const SPIN_THRESHOLD: f32 = 0.3;
/// Wrist-to-opposite-shoulder distance for the cross-body pose
pub const CROSS_REACH: f32 = 0.15;
/// How far past its elbow the free arm must point
pub const ARM_EXTENSION: f32 = 0.1;

pub const LIGHTNING_COOLDOWN: u32 = 20;
pub const SHIELD_COOLDOWN: u32 = 30;
pub const TORNADO_COOLDOWN: u32 = 40;
pub const FREEZE_COOLDOWN: u32 = 30;

/// Undelivered gesture plus the cooldown still running behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureSlot {
    pub spell: Spell,
    pub cooldown: u32,
}

impl GestureSlot {
    /// Detected recently enough to be delivered
    pub fn is_fresh(&self) -> bool {
        self.cooldown > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    shoulder_x_history: VecDeque<f32>,
    last_shoulder_y: Option<f32>,
    last_hip_y: Option<f32>,
    pending: Option<Spell>,
    cooldown: u32,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Pending slot, if any
    pub fn peek(&self) -> Option<GestureSlot> {
        self.pending.map(|spell| GestureSlot {
            spell,
            cooldown: self.cooldown,
        })
    }

    /// Read-then-clear the pending slot
    pub fn take(&mut self) -> Option<Spell> {
        self.pending.take()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Process one pose frame. Returns the spell detected this frame, if any.
    ///
    /// During cooldown the frame only decrements the counter; the
    /// edge-detection baselines keep their pre-cooldown values.
    pub fn process(&mut self, pose: &PoseDetection) -> Option<Spell> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }

        let (Some(l_shoulder), Some(r_shoulder), Some(l_hip), Some(r_hip)) = (
            pose.get(LEFT_SHOULDER),
            pose.get(RIGHT_SHOULDER),
            pose.get(LEFT_HIP),
            pose.get(RIGHT_HIP),
        ) else {
            return None;
        };

        let shoulder_y = (l_shoulder.y + r_shoulder.y) / 2.0;
        let shoulder_x = (l_shoulder.x + r_shoulder.x) / 2.0;
        let hip_y = (l_hip.y + r_hip.y) / 2.0;
        let mut detected = None;

        // Jump: shoulders rise (image Y shrinks)
        if self.last_shoulder_y.is_some_and(|last| last - shoulder_y > JUMP_THRESHOLD) {
            detected = Some(self.fire(Spell::Lightning, LIGHTNING_COOLDOWN));
        }

        // Squat: hips drop
        if self.last_hip_y.is_some_and(|last| hip_y - last > SQUAT_THRESHOLD) {
            detected = Some(self.fire(Spell::Shield, SHIELD_COOLDOWN));
        }

        // Spin: lateral shoulder travel across the window
        self.shoulder_x_history.push_back(shoulder_x);
        if self.shoulder_x_history.len() > SPIN_WINDOW {
            self.shoulder_x_history.pop_front();
        }
        if self.shoulder_x_history.len() == SPIN_WINDOW && self.spin_travel() > SPIN_THRESHOLD {
            self.shoulder_x_history.clear();
            detected = Some(self.fire(Spell::Tornado, TORNADO_COOLDOWN));
        }

        // Cross-body: one wrist on the opposite shoulder, other arm out
        if let (Some(l_wrist), Some(r_wrist), Some(l_elbow), Some(r_elbow)) = (
            pose.get(LEFT_WRIST),
            pose.get(RIGHT_WRIST),
            pose.get(LEFT_ELBOW),
            pose.get(RIGHT_ELBOW),
        ) {
            let left_out = l_wrist.x < l_elbow.x - ARM_EXTENSION;
            if r_wrist.distance(&l_shoulder) < CROSS_REACH && left_out {
                detected = Some(self.fire(Spell::Freeze, FREEZE_COOLDOWN));
            }
            let right_out = r_wrist.x > r_elbow.x + ARM_EXTENSION;
            if l_wrist.distance(&r_shoulder) < CROSS_REACH && right_out {
                detected = Some(self.fire(Spell::Freeze, FREEZE_COOLDOWN));
            }
        }

        self.last_shoulder_y = Some(shoulder_y);
        self.last_hip_y = Some(hip_y);
        detected
    }

    /// Lateral travel between the oldest and newest shoulder-X samples
    fn spin_travel(&self) -> f32 {
        match (self.shoulder_x_history.front(), self.shoulder_x_history.back()) {
            (Some(first), Some(last)) => (last - first).abs(),
            _ => 0.0,
        }
    }

    fn fire(&mut self, spell: Spell, cooldown: u32) -> Spell {
        log::debug!("Gesture detected: {}", spell.as_str());
        self.pending = Some(spell);
        self.cooldown = cooldown;
        spell
    }
}
