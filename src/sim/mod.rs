//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Positions derived from the audio clock only
//! - Seeded RNG only
//! - Stable iteration order (chart order)
//! - No rendering or platform dependencies

pub mod chart;
pub mod collision;
pub mod note;
pub mod powerup;
pub mod score;
pub mod state;
pub mod tick;

pub use chart::{Chart, LevelConfig, generate_chart, generate_chart_seeded};
pub use collision::{CollisionTuning, HandSample, HandsView, hand_contact, note_depth, tornado_captures};
pub use note::{CutDirection, CutQuality, Hand, Note, NoteState};
pub use powerup::{MissOutcome, PowerUpState, Spell, SpellCounts};
pub use score::{ScoreLedger, multiplier_for_combo};
pub use state::{GameEvent, GamePhase, GameState, HitSource};
pub use tick::{TickInput, cast_spell, countdown_tick, tick};
