//! Procedural chart generation
//!
//! A chart is generated once per level attempt from the level configuration
//! and a seeded RNG, so the same seed always yields the same notes.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::note::{Hand, Note};
use crate::consts::LEAD_IN_SECS;
use crate::error::{GameError, Result};

/// Level definition consumed by the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    pub year: u32,
    pub name: String,
    pub bpm: f32,
    /// Song length in seconds
    pub duration: f32,
    /// Number of creatures (notes) the level should throw at the player
    pub target_notes: u32,
    pub description: String,
}

impl LevelConfig {
    /// Seconds per beat
    pub fn beat_duration(&self) -> f32 {
        60.0 / self.bpm
    }

    /// Difficulty tier 1..=5, one step every five levels
    pub fn difficulty(&self) -> u32 {
        (self.id.saturating_sub(1) / 5 + 1).min(5)
    }

    /// Chance of a dual (both hands) step
    pub fn dual_chance(&self) -> f32 {
        (self.difficulty() as f32 * 0.06).min(0.3)
    }

    /// Chance of a fast two-note stream step
    pub fn stream_chance(&self) -> f32 {
        ((self.difficulty() as f32 - 1.0) * 0.05).min(0.2)
    }

    /// Reject configurations that would produce a malformed chart
    pub fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(GameError::invalid_level(format!(
                "level {} has non-positive bpm {}",
                self.id, self.bpm
            )));
        }
        if !self.duration.is_finite() || self.duration <= LEAD_IN_SECS {
            return Err(GameError::invalid_level(format!(
                "level {} duration {}s does not exceed the {}s lead-in",
                self.id, self.duration, LEAD_IN_SECS
            )));
        }
        if self.target_notes == 0 {
            return Err(GameError::invalid_level(format!(
                "level {} has no target notes",
                self.id
            )));
        }
        Ok(())
    }
}

/// Shape of one generation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepShape {
    Dual,
    Stream,
    Single,
}

/// Ordered notes for one level attempt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chart {
    notes: Vec<Note>,
}

impl Chart {
    /// Build a chart from arbitrary notes (sorted by time)
    pub fn from_notes(mut notes: Vec<Note>) -> Self {
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Note> {
        self.notes.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Note> {
        self.notes.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    /// Scheduled time of the last note
    pub fn last_time(&self) -> Option<f32> {
        self.notes.last().map(|n| n.time)
    }
}

/// Generate a chart with a seeded RNG
pub fn generate_chart_seeded(config: &LevelConfig, seed: u64) -> Result<Chart> {
    let mut rng = Pcg32::seed_from_u64(seed);
    generate_chart(config, &mut rng)
}

/// Generate the chart for a level
pub fn generate_chart<R: Rng>(config: &LevelConfig, rng: &mut R) -> Result<Chart> {
    config.validate()?;

    let beat = config.beat_duration();
    let spacing = (config.duration - LEAD_IN_SECS) / config.target_notes as f32;
    let dual_chance = config.dual_chance();
    let stream_chance = config.stream_chance();

    let mut notes = Vec::with_capacity(config.target_notes as usize + 1);
    let mut next_id = 0u32;
    let mut alloc_id = || {
        let id = next_id;
        next_id += 1;
        id
    };

    let mut shape_counts = [0u32; 3];
    let mut current_time = LEAD_IN_SECS;
    let mut step = 0u32;

    while step < config.target_notes {
        let roll: f32 = rng.random();
        let shape = if roll < dual_chance {
            StepShape::Dual
        } else if roll < dual_chance + stream_chance {
            StepShape::Stream
        } else {
            StepShape::Single
        };

        match shape {
            StepShape::Dual => {
                let layer = rng.random_range(0..3u8);
                notes.push(Note::new(alloc_id(), current_time, 0, layer, Hand::Left));
                notes.push(Note::new(alloc_id(), current_time, 3, layer, Hand::Right));
                // Two creatures in one step
                step += 1;
                shape_counts[0] += 1;
            }
            StepShape::Stream => {
                let layer = rng.random_range(0..2u8);
                notes.push(Note::new(alloc_id(), current_time, 1, layer, Hand::Left));
                notes.push(Note::new(
                    alloc_id(),
                    current_time + beat * 0.5,
                    2,
                    layer,
                    Hand::Right,
                ));
                step += 1;
                shape_counts[1] += 1;
            }
            StepShape::Single => {
                let hand = if step % 2 == 0 { Hand::Left } else { Hand::Right };
                let inner = rng.random_bool(0.5);
                let lane = match (hand, inner) {
                    (Hand::Left, false) => 0,
                    (Hand::Left, true) => 1,
                    (Hand::Right, true) => 2,
                    (Hand::Right, false) => 3,
                };
                let layer = rng.random_range(0..3u8);
                notes.push(Note::new(alloc_id(), current_time, lane, layer, hand));
                shape_counts[2] += 1;
            }
        }

        step += 1;
        current_time += spacing * beat;
    }

    // Stream notes land half a beat late and can interleave with the next step
    let chart = Chart::from_notes(notes);

    log::info!(
        "Level {} chart: {} notes (dual={}, stream={}, single={}), last at {:.2}s",
        config.id,
        chart.len(),
        shape_counts[0],
        shape_counts[1],
        shape_counts[2],
        chart.last_time().unwrap_or(0.0)
    );

    Ok(chart)
}
