//! Game settings and preferences
//!
//! Persisted separately from player progression as a small JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{GOOD_CUT_SPEED, HAND_COLLISION_RADIUS};
use crate::error::Result;
use crate::sim::CollisionTuning;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Assist,
    #[default]
    Normal,
    Expert,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Assist => "Assist",
            Difficulty::Normal => "Normal",
            Difficulty::Expert => "Expert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "assist" | "easy" => Some(Difficulty::Assist),
            "normal" | "norm" => Some(Difficulty::Normal),
            "expert" | "hard" => Some(Difficulty::Expert),
            _ => None,
        }
    }

    /// Hand collision radius multiplier
    pub fn collision_scale(&self) -> f32 {
        match self {
            Difficulty::Assist => 1.25,
            Difficulty::Normal => 1.0,
            Difficulty::Expert => 0.85,
        }
    }

    /// Good-cut speed threshold multiplier
    pub fn cut_speed_scale(&self) -> f32 {
        match self {
            Difficulty::Assist => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Expert => 1.2,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Collision tuning preset
    pub difficulty: Difficulty,

    // === Feedback ===
    /// Vibrate on hits, absorbs and casts
    pub haptics: bool,
    /// Camera shake on hits and full clears
    pub camera_shake: bool,

    // === Audio ===
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Tracking ===
    /// Selfie-style camera (flip image X)
    pub mirror_camera: bool,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,

    // === Debug ===
    /// Fixed chart seed; `None` draws one per attempt
    pub chart_seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            haptics: true,
            camera_shake: true,

            music_volume: 0.7,

            mirror_camera: true,

            reduced_motion: false,

            chart_seed: None,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Effective camera shake (respects reduced_motion)
    pub fn effective_camera_shake(&self) -> bool {
        self.camera_shake && !self.reduced_motion
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
    }

    /// Collision thresholds for the chosen difficulty
    pub fn tuning(&self) -> CollisionTuning {
        CollisionTuning {
            hand_radius: HAND_COLLISION_RADIUS * self.difficulty.collision_scale(),
            good_cut_speed: GOOD_CUT_SPEED * self.difficulty.cut_speed_scale(),
        }
    }

    /// Load settings from a JSON file; missing or unreadable files give defaults
    pub fn load(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("Using default settings");
                return Self::default();
            }
        };
        match serde_json::from_str::<Settings>(&json) {
            Ok(mut settings) => {
                settings.music_volume = settings.music_volume.clamp(0.0, 1.0);
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Ignoring corrupt settings file {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("spell-slinger-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_preset_scales_tuning() {
        let normal = Settings::default().tuning();
        assert_eq!(normal, CollisionTuning::default());

        let assist = Settings::from_preset(Difficulty::Assist).tuning();
        assert!((assist.hand_radius - 1.0).abs() < 1e-6);
        assert!(assist.good_cut_speed < normal.good_cut_speed);

        let expert = Settings::from_preset(Difficulty::Expert).tuning();
        assert!((expert.hand_radius - 0.68).abs() < 1e-6);
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut settings = Settings::default();
        assert!(settings.effective_camera_shake());
        settings.reduced_motion = true;
        assert!(!settings.effective_camera_shake());
    }

    #[test]
    fn test_volume_clamped() {
        let mut settings = Settings::default();
        settings.set_music_volume(3.0);
        assert_eq!(settings.music_volume, 1.0);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("settings.json");
        let settings = Settings {
            difficulty: Difficulty::Expert,
            chart_seed: Some(42),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_and_corrupt_fall_back_to_defaults() {
        assert_eq!(Settings::load(&temp_path("missing.json")), Settings::default());

        let path = temp_path("corrupt.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = temp_path("partial.json");
        fs::write(&path, r#"{ "haptics": false }"#).unwrap();
        let settings = Settings::load(&path);
        assert!(!settings.haptics);
        assert_eq!(settings.difficulty, Difficulty::Normal);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_difficulty_names() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Expert));
        assert_eq!(Difficulty::from_str(Difficulty::Assist.as_str()), Some(Difficulty::Assist));
        assert_eq!(Difficulty::from_str("insane"), None);
    }
}
