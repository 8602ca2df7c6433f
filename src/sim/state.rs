//! Session simulation state
//!
//! Everything the render tick and the power-up countdown mutate lives in one
//! `GameState`, updated only through `tick`, `countdown_tick` and `cast_spell`.

use serde::{Deserialize, Serialize};

use super::chart::{Chart, LevelConfig};
use super::collision::CollisionTuning;
use super::note::{CutQuality, Hand};
use super::powerup::{MissOutcome, PowerUpState, Spell};
use super::score::ScoreLedger;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for tracking to come up
    Loading,
    /// Tracking ready, no level running
    Idle,
    /// Song playing, notes advancing
    Playing,
    /// Song finished with health left
    Victory,
    /// Health ran out
    GameOver,
}

impl GamePhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, GamePhase::Victory | GamePhase::GameOver)
    }
}

/// What resolved a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitSource {
    Hand,
    Tornado,
    Lightning,
}

/// Events produced by the simulation for the renderer/haptics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    NoteHit {
        note_id: u32,
        hand: Hand,
        quality: CutQuality,
        source: HitSource,
        points: u64,
    },
    NoteMissed {
        note_id: u32,
        /// Shield soaked it up
        absorbed: bool,
    },
    SpellCast(Spell),
    SpellExpired(Spell),
    ShieldBroken,
    SongEnded,
    Defeated,
}

/// Complete simulation state for one level attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub level: Option<LevelConfig>,
    pub chart: Chart,
    /// First chart index not yet spawned
    next_note: usize,
    /// Chart indices of spawned, unresolved notes (chart order)
    active: Vec<usize>,
    pub ledger: ScoreLedger,
    pub power: PowerUpState,
    pub tuning: CollisionTuning,
    /// Audio time of the last processed frame
    pub song_time: f32,
    /// Power-up activation count already handled by the frame tick
    pub(crate) seen_activations: u32,
    /// Pending events (drained by the session)
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: GamePhase::Loading,
            level: None,
            chart: Chart::default(),
            next_note: 0,
            active: Vec::new(),
            ledger: ScoreLedger::default(),
            power: PowerUpState::default(),
            tuning: CollisionTuning::default(),
            song_time: 0.0,
            seen_activations: 0,
            events: Vec::new(),
        }
    }
}

impl GameState {
    /// Fresh state for a level with its generated chart
    pub fn new(level: LevelConfig, chart: Chart, tuning: CollisionTuning) -> Self {
        Self {
            phase: GamePhase::Idle,
            level: Some(level),
            chart,
            tuning,
            ..Default::default()
        }
    }

    /// Chart indices of active notes
    pub fn active_indices(&self) -> &[usize] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Notes not yet spawned
    pub fn remaining_to_spawn(&self) -> usize {
        self.chart.len() - self.next_note
    }

    pub(crate) fn next_note(&self) -> usize {
        self.next_note
    }

    pub(crate) fn set_next_note(&mut self, next: usize) {
        self.next_note = next;
    }

    pub(crate) fn take_active(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.active)
    }

    pub(crate) fn set_active(&mut self, active: Vec<usize>) {
        self.active = active;
    }

    pub(crate) fn push_active(&mut self, idx: usize) {
        self.active.push(idx);
    }

    /// Resolve a note as hit and score it. Returns false if it was not pending.
    pub(crate) fn register_hit(
        &mut self,
        idx: usize,
        quality: CutQuality,
        source: HitSource,
        at: f32,
    ) -> bool {
        let Some(note) = self.chart.get_mut(idx) else {
            return false;
        };
        if !note.resolve_hit(at, quality) {
            return false;
        }
        let (note_id, hand) = (note.id, note.hand);
        let points = self.ledger.record_hit(quality);
        log::debug!(
            "note-{} hit ({:?}, {:?}) +{} combo {}",
            note_id,
            quality,
            source,
            points,
            self.ledger.combo
        );
        self.events.push(GameEvent::NoteHit {
            note_id,
            hand,
            quality,
            source,
            points,
        });
        true
    }

    /// Resolve a note as missed. Shield absorbs it if charged; otherwise the
    /// ledger takes the penalty and the phase moves to GameOver on zero health.
    pub(crate) fn register_miss(&mut self, idx: usize) -> bool {
        let Some(note) = self.chart.get_mut(idx) else {
            return false;
        };
        if !note.resolve_miss() {
            return false;
        }
        let note_id = note.id;

        match self.power.absorb_miss() {
            MissOutcome::Absorbed { broken } => {
                self.ledger.record_absorbed_miss();
                log::debug!(
                    "note-{} missed, shield absorbed ({} left)",
                    note_id,
                    self.power.shield_charges()
                );
                self.events.push(GameEvent::NoteMissed {
                    note_id,
                    absorbed: true,
                });
                if broken {
                    self.events.push(GameEvent::ShieldBroken);
                }
            }
            MissOutcome::Unshielded => {
                let dead = self.ledger.record_miss();
                log::debug!("note-{} missed, health {}", note_id, self.ledger.health);
                self.events.push(GameEvent::NoteMissed {
                    note_id,
                    absorbed: false,
                });
                if dead {
                    self.phase = GamePhase::GameOver;
                    self.events.push(GameEvent::Defeated);
                }
            }
        }
        true
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
