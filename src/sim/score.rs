//! Score ledger: score, combo, multiplier and health

use serde::{Deserialize, Serialize};

use super::note::CutQuality;
use super::powerup::SpellCounts;
use crate::consts::*;

/// Multiplier earned by a combo
pub fn multiplier_for_combo(combo: u32) -> u32 {
    match combo {
        c if c > 30 => 8,
        c if c > 20 => 4,
        c if c > 10 => 2,
        _ => 1,
    }
}

/// Cumulative per-session scoring state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreLedger {
    pub score: u64,
    pub combo: u32,
    pub multiplier: u32,
    pub max_combo: u32,
    /// 0..=100
    pub health: u32,
    /// Notes hit (any path)
    pub defeated: u32,
    /// Notes that reached the miss plane (absorbed or not)
    pub missed: u32,
    /// Spells delivered this session
    pub spells_cast: SpellCounts,
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self {
            score: 0,
            combo: 0,
            multiplier: 1,
            max_combo: 0,
            health: MAX_HEALTH,
            defeated: 0,
            missed: 0,
            spells_cast: SpellCounts::default(),
        }
    }
}

impl ScoreLedger {
    /// Apply a hit. Returns the points awarded.
    ///
    /// Points use the multiplier standing before the hit; the combo step
    /// then recomputes it for the next one.
    pub fn record_hit(&mut self, quality: CutQuality) -> u64 {
        let base = if quality.is_good() {
            BASE_HIT_POINTS + GOOD_CUT_BONUS
        } else {
            BASE_HIT_POINTS
        };
        let points = base * self.multiplier as u64;
        self.score += points;

        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.multiplier = multiplier_for_combo(self.combo);
        self.health = (self.health + HIT_HEAL).min(MAX_HEALTH);
        self.defeated += 1;
        points
    }

    /// Apply an unabsorbed miss. Returns true when health ran out.
    pub fn record_miss(&mut self) -> bool {
        self.missed += 1;
        self.combo = 0;
        self.multiplier = 1;
        self.health = self.health.saturating_sub(MISS_DAMAGE);
        self.health == 0
    }

    /// Count a miss the shield soaked up (no penalty)
    pub fn record_absorbed_miss(&mut self) {
        self.missed += 1;
    }

    pub fn add_bonus(&mut self, points: u64) {
        self.score += points;
    }

    /// Stacked freezes saturate instead of wrapping
    pub fn double_multiplier(&mut self) {
        self.multiplier = self.multiplier.saturating_mul(2);
    }

    /// Undo a doubling (never below 1)
    pub fn halve_multiplier(&mut self) {
        self.multiplier = (self.multiplier / 2).max(1);
    }

    /// Hits over resolved notes (0 when nothing resolved)
    pub fn accuracy(&self) -> f32 {
        let resolved = self.defeated + self.missed;
        if resolved == 0 {
            0.0
        } else {
            self.defeated as f32 / resolved as f32
        }
    }
}
