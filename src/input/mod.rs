//! Input fusion: tracking frames → smoothed hands and spell gestures
//!
//! The tracking producer publishes into a [`TrackingBridge`]; the session
//! reads it through [`InputSource`] once per render frame (hands) and once
//! per countdown tick (gesture slot).

pub mod autopilot;
pub mod bridge;
pub mod gesture;
pub mod hands;
pub mod landmarks;

pub use autopilot::Autopilot;
pub use bridge::TrackingBridge;
pub use gesture::{GestureClassifier, GestureSlot};
pub use hands::{HandState, HandTracker};
pub use landmarks::{HandDetection, Landmark, PoseDetection, TrackingFrame, hand_to_world};

use crate::sim::HandsView;

/// Read side of the input fusion, as seen by the session
pub trait InputSource {
    /// Smoothed hands for this frame (`None` per hand when untracked)
    fn hands(&self) -> HandsView;

    /// Undelivered gesture, if any
    fn pending_gesture(&self) -> Option<GestureSlot>;

    /// Drop the pending gesture after reading it
    fn clear_gesture(&self);
}
