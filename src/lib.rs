//! Spell Slinger - motion-controlled rhythm spell-casting core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (chart, note lifecycle, collisions, scoring, power-ups)
//! - `input`: Hand/pose tracking fusion and gesture classification
//! - `platform`: Audio clock and haptics collaborators
//! - `session`: Session controller tying the clock, input and simulation together
//! - `progression`: Player progression record and its storage
//! - `settings`: Player preferences and difficulty presets

pub mod error;
pub mod input;
pub mod platform;
pub mod progression;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result};
pub use session::{Session, SessionSummary, Tick};
pub use settings::{Difficulty, Settings};

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Depth where notes appear
    pub const SPAWN_Z: f32 = -30.0;
    /// Depth of the player plane
    pub const PLAYER_Z: f32 = 0.0;
    /// Notes further than this past the player are missed
    pub const MISS_Z: f32 = 5.0;
    /// Note travel speed (units/s)
    pub const NOTE_SPEED: f32 = 10.0;

    /// Seconds of silence before the first note
    pub const LEAD_IN_SECS: f32 = 4.0;

    /// Lane/layer grid
    pub const LANE_WIDTH: f32 = 0.8;
    pub const LANE_COUNT: u8 = 4;
    pub const LAYER_COUNT: u8 = 3;
    pub const LANE_X_POSITIONS: [f32; 4] = [
        -1.5 * LANE_WIDTH,
        -0.5 * LANE_WIDTH,
        0.5 * LANE_WIDTH,
        1.5 * LANE_WIDTH,
    ];
    pub const LAYER_Y_POSITIONS: [f32; 3] = [0.8, 1.6, 2.4]; // Low, Mid, High

    /// Hand collision window (relative to the player plane)
    pub const HIT_WINDOW_NEAR: f32 = -1.5;
    pub const HIT_WINDOW_FAR: f32 = 1.0;
    pub const HAND_COLLISION_RADIUS: f32 = 0.8;
    /// Minimum hand speed for a "good" cut (units/s)
    pub const GOOD_CUT_SPEED: f32 = 1.5;
    /// Minimum alignment with the required cut direction
    pub const GOOD_CUT_ALIGNMENT: f32 = 0.3;

    /// Tornado auto-resolve band and radius around the player anchor
    pub const TORNADO_BAND_NEAR: f32 = -2.0;
    pub const TORNADO_BAND_FAR: f32 = 0.5;
    pub const TORNADO_RADIUS: f32 = 2.5;
    pub const PLAYER_ANCHOR_Y: f32 = 1.5;

    /// Scoring
    pub const BASE_HIT_POINTS: u64 = 100;
    pub const GOOD_CUT_BONUS: u64 = 50;
    pub const HIT_HEAL: u32 = 2;
    pub const MISS_DAMAGE: u32 = 15;
    pub const MAX_HEALTH: u32 = 100;
    pub const LIGHTNING_BONUS: u64 = 500;
    pub const FREEZE_BONUS: u64 = 200;

    /// Power-up durations (seconds)
    pub const LIGHTNING_DURATION: f32 = 1.0;
    pub const SHIELD_DURATION: f32 = 5.0;
    pub const TORNADO_DURATION: f32 = 5.0;
    pub const FREEZE_DURATION: f32 = 8.0;
    pub const SHIELD_CHARGES: u8 = 3;

    /// Power-up countdown cadence
    pub const POWER_UP_TICK_MS: f64 = 100.0;
    pub const POWER_UP_STEP: f32 = 0.1;
    /// Minimum spacing between two delivered spells
    pub const SPELL_RETRIGGER_MS: f64 = 500.0;

    /// Camera used for screen projection
    pub const CAMERA_POS: [f32; 3] = [0.0, 1.8, 4.0];
    pub const CAMERA_FOV_Y_DEG: f32 = 60.0;
}

/// Seconds a note needs to travel from the spawn plane to the player
#[inline]
pub fn spawn_lead_time() -> f32 {
    (consts::SPAWN_Z - consts::PLAYER_Z).abs() / consts::NOTE_SPEED
}

/// World X of a lane (clamped to the last lane)
#[inline]
pub fn lane_x(lane: u8) -> f32 {
    let idx = (lane as usize).min(consts::LANE_X_POSITIONS.len() - 1);
    consts::LANE_X_POSITIONS[idx]
}

/// World Y of a layer (clamped to the top layer)
#[inline]
pub fn layer_y(layer: u8) -> f32 {
    let idx = (layer as usize).min(consts::LAYER_Y_POSITIONS.len() - 1);
    consts::LAYER_Y_POSITIONS[idx]
}

/// Fixed point the tornado spins around
#[inline]
pub fn player_anchor() -> Vec3 {
    Vec3::new(0.0, consts::PLAYER_ANCHOR_Y, consts::PLAYER_Z)
}

/// Project a world position to normalized device coordinates ([-1, 1] on screen)
///
/// Returns `None` for points at or behind the camera plane.
pub fn project_to_screen(world: Vec3, aspect: f32) -> Option<Vec2> {
    let cam = Vec3::from_array(consts::CAMERA_POS);
    let rel = world - cam;
    let depth = -rel.z;
    if depth <= 1e-4 {
        return None;
    }
    let focal = 1.0 / (consts::CAMERA_FOV_Y_DEG.to_radians() * 0.5).tan();
    let aspect = if aspect > 0.0 { aspect } else { 1.0 };
    Some(Vec2::new(
        rel.x * focal / (depth * aspect),
        rel.y * focal / depth,
    ))
}
