//! Platform collaborators
//!
//! The core never talks to audio or vibration hardware directly:
//! - `AudioClock`: authoritative song position and transport
//! - `HapticSink`: best-effort vibration
//!
//! `SimulatedClock` drives headless runs and tests.

use crate::error::{GameError, Result};

/// Vibration patterns (ms on/off)
pub const HAPTIC_GOOD_HIT: &[u32] = &[40];
pub const HAPTIC_OK_HIT: &[u32] = &[20];
pub const HAPTIC_SHIELD_ABSORB: &[u32] = &[100];
pub const HAPTIC_SPELL_CAST: &[u32] = &[50, 30, 50];

/// Audio playback clock
pub trait AudioClock {
    /// Playback position in seconds
    fn position(&self) -> f32;

    /// Start or resume playback. May be refused (autoplay policy).
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn seek(&mut self, seconds: f32);

    /// Playback reached the end of the track
    fn has_ended(&self) -> bool;
}

/// Fire-and-forget vibration output
pub trait HapticSink {
    fn vibrate(&mut self, pattern: &[u32]);
}

/// Haptics for devices without a motor
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHaptics;

impl HapticSink for NullHaptics {
    fn vibrate(&mut self, _pattern: &[u32]) {}
}

/// Keeps every pattern it was asked to play
#[derive(Debug, Clone, Default)]
pub struct RecordingHaptics {
    pub patterns: Vec<Vec<u32>>,
}

impl HapticSink for RecordingHaptics {
    fn vibrate(&mut self, pattern: &[u32]) {
        self.patterns.push(pattern.to_vec());
    }
}

/// Manually advanced clock standing in for an audio element
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    position: f32,
    duration: f32,
    playing: bool,
    /// Refuse `play` as a browser would before a user gesture
    pub blocked: bool,
}

impl SimulatedClock {
    pub fn new(duration: f32) -> Self {
        Self {
            position: 0.0,
            duration,
            playing: false,
            blocked: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Advance playback by `dt` seconds (no-op while paused)
    pub fn advance(&mut self, dt: f32) {
        if self.playing {
            self.position = (self.position + dt).min(self.duration);
        }
    }
}

impl AudioClock for SimulatedClock {
    fn position(&self) -> f32 {
        self.position
    }

    fn play(&mut self) -> Result<()> {
        if self.blocked {
            return Err(GameError::PlaybackBlocked(
                "play() refused until user interaction".into(),
            ));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, seconds: f32) {
        self.position = seconds.clamp(0.0, self.duration);
    }

    fn has_ended(&self) -> bool {
        self.position >= self.duration
    }
}
