//! Raw tracking frames and the camera → world mapping

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::Hand;

/// Index fingertip in a hand landmark set
pub const FINGERTIP: usize = 8;
/// Landmarks in a full hand set
pub const HAND_LANDMARK_COUNT: usize = 21;
/// Landmarks in a full body set
pub const POSE_LANDMARK_COUNT: usize = 33;

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;

/// Hand → world mapping extents
const WORLD_X_RANGE: f32 = 5.0;
const WORLD_Y_RANGE: f32 = 3.5;
const WORLD_Y_OFFSET: f32 = 0.8;
const WORLD_Y_FLOOR: f32 = 0.1;
const WORLD_Z_TILT: f32 = 0.2;

/// Normalized image point (0..1 on both axes, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    pub hand: Hand,
    pub landmarks: Vec<Landmark>,
}

impl HandDetection {
    /// Detection carrying only a meaningful fingertip
    pub fn from_fingertip(hand: Hand, tip: Landmark) -> Self {
        let mut landmarks = vec![Landmark::default(); HAND_LANDMARK_COUNT];
        landmarks[FINGERTIP] = tip;
        Self { hand, landmarks }
    }

    pub fn fingertip(&self) -> Option<Landmark> {
        self.landmarks.get(FINGERTIP).copied()
    }
}

/// One detected body (first person only)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseDetection {
    /// Indexed joints; `None` where the model gave nothing
    pub landmarks: Vec<Option<Landmark>>,
}

impl PoseDetection {
    pub fn empty() -> Self {
        Self {
            landmarks: vec![None; POSE_LANDMARK_COUNT],
        }
    }

    pub fn with(mut self, idx: usize, landmark: Landmark) -> Self {
        if idx >= self.landmarks.len() {
            self.landmarks.resize(idx + 1, None);
        }
        self.landmarks[idx] = Some(landmark);
        self
    }

    pub fn get(&self, idx: usize) -> Option<Landmark> {
        self.landmarks.get(idx).copied().flatten()
    }
}

/// Everything one tracking inference produced
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingFrame {
    /// Wall-clock time the frame was processed (ms)
    pub timestamp_ms: f64,
    pub hands: Vec<HandDetection>,
    pub pose: Option<PoseDetection>,
}

/// Map a normalized fingertip to game world space
///
/// With `mirror` on (selfie camera) the image X axis is flipped so moving a
/// hand right moves it right in the world.
pub fn hand_to_world(tip: Landmark, mirror: bool) -> Vec3 {
    let x = (0.5 - tip.x) * WORLD_X_RANGE;
    let x = if mirror { x } else { -x };
    let y = (1.0 - tip.y) * WORLD_Y_RANGE - WORLD_Y_RANGE / 2.0 + WORLD_Y_OFFSET;
    let z = -(y * WORLD_Z_TILT).max(0.0);
    Vec3::new(x, y.max(WORLD_Y_FLOOR), z)
}

/// Inverse of [`hand_to_world`] for X/Y, clamped to the image
pub fn world_to_hand(world: Vec3, mirror: bool) -> Landmark {
    let x = if mirror { world.x } else { -world.x };
    let nx = 0.5 - x / WORLD_X_RANGE;
    let ny = 1.0 - (world.y - WORLD_Y_OFFSET + WORLD_Y_RANGE / 2.0) / WORLD_Y_RANGE;
    Landmark::new(nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_maps_to_origin_column() {
        let p = hand_to_world(Landmark::new(0.5, 0.5), true);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 0.8).abs() < 1e-6);
        assert!((p.z + 0.16).abs() < 1e-6);
    }

    #[test]
    fn test_mirror_flips_x() {
        let left_of_image = Landmark::new(0.1, 0.5);
        assert!(hand_to_world(left_of_image, true).x > 0.0);
        assert!(hand_to_world(left_of_image, false).x < 0.0);
    }

    #[test]
    fn test_low_hand_clamped_to_floor() {
        let p = hand_to_world(Landmark::new(0.5, 1.0), true);
        assert_eq!(p.y, 0.1);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_world_to_hand_inverts_mapping() {
        for mirror in [true, false] {
            let tip = Landmark::new(0.3, 0.4);
            let back = world_to_hand(hand_to_world(tip, mirror), mirror);
            assert!((back.x - tip.x).abs() < 1e-5);
            assert!((back.y - tip.y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_pose_lookup() {
        let pose = PoseDetection::empty().with(LEFT_HIP, Landmark::new(0.4, 0.7));
        assert_eq!(pose.get(LEFT_HIP), Some(Landmark::new(0.4, 0.7)));
        assert_eq!(pose.get(RIGHT_HIP), None);
        assert_eq!(pose.get(99), None);
    }
}
