//! Shared hand/gesture state between the tracking producer and the render tick
//!
//! The tracking side runs at inference rate and publishes whole frames; the
//! session reads hands and the gesture slot opportunistically. After
//! `shutdown` any late inference result is dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::gesture::{GestureClassifier, GestureSlot};
use super::hands::HandTracker;
use super::landmarks::TrackingFrame;
use super::InputSource;
use crate::error::{GameError, Result};
use crate::sim::HandsView;

#[derive(Debug)]
struct Fusion {
    hands: HandTracker,
    gestures: GestureClassifier,
}

/// Cloneable handle; clones share the same state and liveness flag
#[derive(Clone)]
pub struct TrackingBridge {
    shared: Arc<Mutex<Fusion>>,
    alive: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
}

impl TrackingBridge {
    pub fn new(mirror: bool) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Fusion {
                hands: HandTracker::new(mirror),
                gestures: GestureClassifier::new(),
            })),
            alive: Arc::new(AtomicBool::new(true)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish one inference result. Returns true when the frame was applied.
    ///
    /// A failed inference is logged and skipped; the previous smoothed state
    /// stays as it was.
    pub fn publish(&self, frame: Result<TrackingFrame>) -> bool {
        if !self.is_alive() {
            return false;
        }
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Detection failed this frame: {}", err);
                return false;
            }
        };
        let mut fusion = match self.lock() {
            Ok(fusion) => fusion,
            Err(err) => {
                log::warn!("{}", err);
                return false;
            }
        };
        fusion.hands.update(&frame.hands, frame.timestamp_ms);
        if let Some(pose) = &frame.pose {
            fusion.gestures.process(pose);
        }
        true
    }

    /// Stop accepting frames; in-flight results become no-ops
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Inference failures seen so far
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Forget hand history and any pending gesture (new session)
    pub fn reset(&self) {
        if let Ok(mut fusion) = self.lock() {
            fusion.hands.reset();
            fusion.gestures.reset();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Fusion>> {
        self.shared
            .lock()
            .map_err(|_| GameError::Tracking("tracking state has been poisoned".into()))
    }
}

impl InputSource for TrackingBridge {
    fn hands(&self) -> HandsView {
        self.lock().map(|f| f.hands.view()).unwrap_or_default()
    }

    fn pending_gesture(&self) -> Option<GestureSlot> {
        self.lock().ok().and_then(|f| f.gestures.peek())
    }

    fn clear_gesture(&self) {
        if let Ok(mut fusion) = self.lock() {
            fusion.gestures.clear();
        }
    }
}

impl std::fmt::Debug for TrackingBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingBridge")
            .field("alive", &self.is_alive())
            .field("dropped", &self.dropped_frames())
            .finish()
    }
}
