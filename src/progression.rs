//! Player progression: ranks, stars, unlocks and the level catalogue
//!
//! The core only produces `SessionSummary` values; this module folds them
//! into a `PlayerData` record and persists it through a `ProgressStore`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::session::SessionSummary;
use crate::sim::{LevelConfig, SpellCounts};

/// A wizard rank and the lifetime score it takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardRank {
    pub id: u32,
    pub name: &'static str,
    pub min_score: u64,
}

pub static WIZARD_RANKS: [WizardRank; 7] = [
    WizardRank { id: 0, name: "Novice", min_score: 0 },
    WizardRank { id: 1, name: "Apprentice", min_score: 1_000 },
    WizardRank { id: 2, name: "Adept", min_score: 5_000 },
    WizardRank { id: 3, name: "Magus", min_score: 15_000 },
    WizardRank { id: 4, name: "Master Wizard", min_score: 35_000 },
    WizardRank { id: 5, name: "Grandmaster", min_score: 75_000 },
    WizardRank { id: 6, name: "Archmage", min_score: 150_000 },
];

/// Built-in Year 1 levels
pub fn levels() -> Vec<LevelConfig> {
    [
        (1, "Welcome to the Academy", 120.0, 60.0, 40, "Learn the basics of spell-slinging"),
        (2, "Hand Spell Basics", 125.0, 65.0, 50, "Master your hand movements"),
        (3, "Lightning Lesson", 130.0, 70.0, 55, "Harness the power of lightning"),
        (4, "Shield Training", 130.0, 70.0, 60, "Learn to protect yourself"),
        (5, "First Year Exam", 135.0, 75.0, 70, "Prove your mastery of Year 1"),
    ]
    .into_iter()
    .map(|(id, name, bpm, duration, target_notes, description)| LevelConfig {
        id,
        year: 1,
        name: name.to_string(),
        bpm,
        duration,
        target_notes,
        description: description.to_string(),
    })
    .collect()
}

pub fn level_by_id(id: u32) -> Result<LevelConfig> {
    levels()
        .into_iter()
        .find(|l| l.id == id)
        .ok_or(GameError::UnknownLevel(id))
}

/// Stars for a finished level (0..=3)
pub fn calculate_stars(accuracy: f32, max_combo: u32, spells_cast: u32) -> u8 {
    let mut stars = 0;
    if accuracy >= 0.5 {
        stars = 1;
    }
    if accuracy >= 0.75 && max_combo >= 20 {
        stars = 2;
    }
    if accuracy >= 0.9 && max_combo >= 40 && spells_cast >= 2 {
        stars = 3;
    }
    stars
}

/// Index into [`WIZARD_RANKS`] for a lifetime score
pub fn current_rank(total_score: u64) -> usize {
    WIZARD_RANKS
        .iter()
        .rposition(|r| total_score >= r.min_score)
        .unwrap_or(0)
}

/// Fraction of the way to the next rank (1.0 at the top rank)
pub fn progress_to_next_rank(total_score: u64) -> f32 {
    let rank = current_rank(total_score);
    let Some(next) = WIZARD_RANKS.get(rank + 1) else {
        return 1.0;
    };
    let floor = WIZARD_RANKS[rank].min_score;
    let progress = (total_score - floor) as f32 / (next.min_score - floor) as f32;
    progress.clamp(0.0, 1.0)
}

/// Aggregate lifetime stats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    /// Seconds
    pub total_play_time: f32,
    pub total_creatures_defeated: u64,
    pub total_spells_cast: SpellCounts,
    pub best_combo: u32,
}

/// Persisted progression record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerData {
    pub total_score: u64,
    pub current_rank: usize,
    pub current_level: u32,
    pub levels_completed: Vec<u32>,
    pub level_stars: BTreeMap<u32, u8>,
    pub level_best_scores: BTreeMap<u32, u64>,
    pub level_accuracy: BTreeMap<u32, f32>,
    pub stats: PlayerStats,
    /// Unix timestamp (ms)
    pub last_played: f64,
    pub tutorial_completed: bool,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            total_score: 0,
            current_rank: 0,
            current_level: 1,
            levels_completed: Vec::new(),
            level_stars: BTreeMap::new(),
            level_best_scores: BTreeMap::new(),
            level_accuracy: BTreeMap::new(),
            stats: PlayerStats::default(),
            last_played: 0.0,
            tutorial_completed: false,
        }
    }
}

impl PlayerData {
    pub fn rank(&self) -> &'static WizardRank {
        &WIZARD_RANKS[self.current_rank.min(WIZARD_RANKS.len() - 1)]
    }

    pub fn total_stars(&self) -> u32 {
        self.level_stars.values().map(|&s| s as u32).sum()
    }

    /// Level 1 is always open; later levels need a star on the previous one
    pub fn is_level_unlocked(&self, level_id: u32) -> bool {
        if level_id <= 1 {
            return true;
        }
        self.level_stars
            .get(&(level_id - 1))
            .is_some_and(|&stars| stars > 0)
    }

    /// Fold a finished session in. Returns the stars earned (0 on defeat).
    ///
    /// Every attempt counts toward score, rank and stats; best score,
    /// accuracy and stars only move up, and only victories earn stars.
    pub fn record_session(&mut self, summary: &SessionSummary, now_ms: f64) -> u8 {
        let id = summary.level_id;

        self.total_score += summary.score;
        self.current_rank = current_rank(self.total_score);
        self.stats.total_play_time += summary.play_time;
        self.stats.total_creatures_defeated += summary.defeated as u64;
        self.stats.total_spells_cast.merge(&summary.spells_cast);
        self.stats.best_combo = self.stats.best_combo.max(summary.max_combo);
        self.last_played = now_ms;

        let best = self.level_best_scores.entry(id).or_insert(0);
        *best = (*best).max(summary.score);

        if !summary.victory {
            return 0;
        }

        let stars = calculate_stars(summary.accuracy, summary.max_combo, summary.total_spells());
        let prev = self.level_stars.entry(id).or_insert(0);
        *prev = (*prev).max(stars);
        let acc = self.level_accuracy.entry(id).or_insert(0.0);
        *acc = acc.max(summary.accuracy);

        if !self.levels_completed.contains(&id) {
            self.levels_completed.push(id);
            self.levels_completed.sort_unstable();
        }
        let last_level = levels().len() as u32;
        self.current_level = self.current_level.max((id + 1).min(last_level));

        log::info!(
            "Level {} cleared with {} star(s); total score {} ({})",
            id,
            stars,
            self.total_score,
            self.rank().name
        );
        stars
    }
}

/// Load/save collaborator for the progression record
pub trait ProgressStore {
    fn load(&self) -> Result<PlayerData>;
    fn save(&mut self, data: &PlayerData) -> Result<()>;
}

/// JSON file in a single slot
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    /// Missing file → fresh record; unknown/missing fields take defaults.
    /// A corrupt file is reported and replaced by defaults.
    fn load(&self) -> Result<PlayerData> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No progression found, starting fresh");
                return Ok(PlayerData::default());
            }
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str::<PlayerData>(&json) {
            Ok(data) => {
                log::info!(
                    "Loaded progression: {} points, {} level(s) completed",
                    data.total_score,
                    data.levels_completed.len()
                );
                Ok(data)
            }
            Err(err) => {
                log::warn!("Failed to parse {}: {}", self.path.display(), err);
                Ok(PlayerData::default())
            }
        }
    }

    fn save(&mut self, data: &PlayerData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        // Write then rename so a crash never leaves half a record
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| GameError::Storage(format!("{}: {}", self.path.display(), e)))?;
        log::info!("Progression saved to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Option<PlayerData>,
    pub saves: usize,
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<PlayerData> {
        Ok(self.data.clone().unwrap_or_default())
    }

    fn save(&mut self, data: &PlayerData) -> Result<()> {
        self.data = Some(data.clone());
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(level_id: u32, victory: bool, score: u64, accuracy: f32, max_combo: u32) -> SessionSummary {
        SessionSummary {
            level_id,
            victory,
            score,
            accuracy,
            max_combo,
            defeated: 30,
            missed: 10,
            spells_cast: SpellCounts {
                lightning: 1,
                shield: 1,
                ..Default::default()
            },
            play_time: 60.0,
        }
    }

    #[test]
    fn test_stars() {
        assert_eq!(calculate_stars(0.4, 100, 5), 0);
        assert_eq!(calculate_stars(0.5, 0, 0), 1);
        assert_eq!(calculate_stars(0.8, 19, 0), 1);
        assert_eq!(calculate_stars(0.8, 20, 0), 2);
        assert_eq!(calculate_stars(0.95, 40, 1), 2);
        assert_eq!(calculate_stars(0.95, 40, 2), 3);
    }

    #[test]
    fn test_ranks() {
        assert_eq!(current_rank(0), 0);
        assert_eq!(current_rank(999), 0);
        assert_eq!(current_rank(1_000), 1);
        assert_eq!(current_rank(200_000), 6);
        assert!((progress_to_next_rank(3_000) - 0.5).abs() < 1e-6);
        assert_eq!(progress_to_next_rank(150_000), 1.0);
        assert_eq!(progress_to_next_rank(0), 0.0);
    }

    #[test]
    fn test_unlocks() {
        let mut data = PlayerData::default();
        assert!(data.is_level_unlocked(1));
        assert!(!data.is_level_unlocked(2));
        data.level_stars.insert(1, 0);
        assert!(!data.is_level_unlocked(2));
        data.level_stars.insert(1, 2);
        assert!(data.is_level_unlocked(2));
        assert!(!data.is_level_unlocked(3));
    }

    #[test]
    fn test_record_victory() {
        let mut data = PlayerData::default();
        let stars = data.record_session(&summary(1, true, 6_000, 0.8, 25), 1.0);
        assert_eq!(stars, 2);
        assert_eq!(data.total_score, 6_000);
        assert_eq!(data.rank().name, "Adept");
        assert_eq!(data.levels_completed, vec![1]);
        assert_eq!(data.current_level, 2);
        assert_eq!(data.total_stars(), 2);
        assert_eq!(data.stats.total_spells_cast.total(), 2);
        assert!(data.is_level_unlocked(2));

        // Worse replay keeps the bests
        data.record_session(&summary(1, true, 1_000, 0.55, 3), 2.0);
        assert_eq!(data.level_stars[&1], 2);
        assert_eq!(data.level_best_scores[&1], 6_000);
        assert!((data.level_accuracy[&1] - 0.8).abs() < 1e-6);
        assert_eq!(data.levels_completed, vec![1]);
        assert_eq!(data.total_score, 7_000);
        assert_eq!(data.stats.best_combo, 25);
    }

    #[test]
    fn test_record_defeat_earns_no_stars() {
        let mut data = PlayerData::default();
        assert_eq!(data.record_session(&summary(1, false, 800, 0.9, 45), 1.0), 0);
        assert!(data.level_stars.is_empty());
        assert!(data.levels_completed.is_empty());
        assert_eq!(data.total_score, 800);
        assert_eq!(data.current_level, 1);
    }

    #[test]
    fn test_catalogue() {
        let all = levels();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|l| l.validate().is_ok()));
        assert_eq!(level_by_id(3).unwrap().name, "Lightning Lesson");
        assert!(matches!(level_by_id(9), Err(GameError::UnknownLevel(9))));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        assert_eq!(store.load().unwrap(), PlayerData::default());
        let mut data = PlayerData::default();
        data.tutorial_completed = true;
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), data);
        assert_eq!(store.saves, 1);
    }

    #[test]
    fn test_json_store_round_trip_and_partial() {
        let dir = std::env::temp_dir().join(format!("spell-slinger-progress-{}", std::process::id()));
        let mut store = JsonFileStore::new(dir.join("progress.json"));
        assert_eq!(store.load().unwrap(), PlayerData::default());

        let mut data = PlayerData::default();
        data.record_session(&summary(2, true, 2_500, 0.92, 41), 5.0);
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), data);

        // Older records without newer fields still load
        fs::write(store.path(), r#"{ "total_score": 42 }"#).unwrap();
        let partial = store.load().unwrap();
        assert_eq!(partial.total_score, 42);
        assert_eq!(partial.current_level, 1);

        fs::write(store.path(), "garbage").unwrap();
        assert_eq!(store.load().unwrap(), PlayerData::default());

        let _ = fs::remove_dir_all(&dir);
    }
}
