//! Per-frame simulation tick and the power-up countdown
//!
//! Frame order: song end, lightning full clear (once per cast), spawn, then
//! per note: miss, tornado auto-resolve, hand collision. The first path that
//! resolves a note consumes it for the frame.

use super::collision::{HandsView, hand_contact, is_past_miss_plane, tornado_captures};
use super::note::CutQuality;
use super::powerup::Spell;
use super::state::{GameEvent, GamePhase, GameState, HitSource};
use crate::consts::POWER_UP_STEP;
use crate::spawn_lead_time;

/// Inputs for a single render frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Audio playback position (seconds)
    pub song_time: f32,
    /// Audio source reported end of playback
    pub song_ended: bool,
    /// Smoothed hands from the tracker
    pub hands: HandsView,
}

/// Advance the session by one render frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    if state.phase != GamePhase::Playing {
        return;
    }

    if input.song_ended {
        log::info!(
            "Song ended: score {} max combo {}",
            state.ledger.score,
            state.ledger.max_combo
        );
        state.phase = GamePhase::Victory;
        state.events.push(GameEvent::SongEnded);
        return;
    }

    let t = input.song_time;
    state.song_time = t;

    // Lightning clears the board on the first frame after each cast
    let activations = state.power.activations();
    if activations != state.seen_activations {
        state.seen_activations = activations;
        if state.power.is_active(Spell::Lightning) {
            full_clear(state, t);
        }
    }

    spawn_notes(state, t);
    resolve_notes(state, input, t);
}

/// Move notes whose look-ahead window has opened into the active set
fn spawn_notes(state: &mut GameState, t: f32) {
    let lead = spawn_lead_time();
    let mut next = state.next_note();
    while let Some(note) = state.chart.get(next) {
        if note.time - lead > t {
            break;
        }
        state.push_active(next);
        next += 1;
    }
    state.set_next_note(next);
}

/// Force every active note to a good hit
fn full_clear(state: &mut GameState, t: f32) {
    let active = state.take_active();
    log::info!("Lightning clears {} creatures", active.len());
    for idx in active {
        state.register_hit(idx, CutQuality::Good, HitSource::Lightning, t);
    }
}

fn resolve_notes(state: &mut GameState, input: &TickInput, t: f32) {
    let tornado = state.power.is_active(Spell::Tornado);
    let active = state.take_active();
    let mut survivors = Vec::with_capacity(active.len());

    for (i, &idx) in active.iter().enumerate() {
        // A miss may have ended the session mid-frame; freeze the rest
        if state.phase != GamePhase::Playing {
            survivors.extend_from_slice(&active[i..]);
            break;
        }

        let Some(note) = state.chart.get(idx) else {
            continue;
        };
        if !note.is_pending() {
            continue;
        }
        let pos = note.world_position(t);
        let (hand, cut) = (note.hand, note.cut);

        if is_past_miss_plane(pos.z) {
            state.register_miss(idx);
            continue;
        }

        if tornado && tornado_captures(pos) {
            state.register_hit(idx, CutQuality::Good, HitSource::Tornado, t);
            continue;
        }

        if let Some(quality) = hand_contact(pos, input.hands.get(hand), cut, &state.tuning) {
            state.register_hit(idx, quality, HitSource::Hand, t);
            continue;
        }

        survivors.push(idx);
    }

    state.set_active(survivors);
}

/// Apply a delivered spell
pub fn cast_spell(state: &mut GameState, spell: Spell) {
    if state.phase != GamePhase::Playing {
        return;
    }
    state.power.activate(spell, &mut state.ledger);
    log::info!(
        "Spell cast: {} (score {}, multiplier x{})",
        spell.as_str(),
        state.ledger.score,
        state.ledger.multiplier
    );
    state.events.push(GameEvent::SpellCast(spell));
}

/// One fixed power-up countdown step (every ~100ms)
pub fn countdown_tick(state: &mut GameState) {
    if state.phase != GamePhase::Playing {
        return;
    }
    if let Some(spell) = state.power.countdown(POWER_UP_STEP, &mut state.ledger) {
        log::debug!("Spell expired: {}", spell.as_str());
        state.events.push(GameEvent::SpellExpired(spell));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::chart::{Chart, LevelConfig};
    use crate::sim::collision::{CollisionTuning, HandSample};
    use crate::sim::note::{CutDirection, Hand, Note, NoteState};
    use glam::Vec3;

    fn level() -> LevelConfig {
        LevelConfig {
            id: 1,
            year: 1,
            name: "Test".into(),
            bpm: 120.0,
            duration: 60.0,
            target_notes: 4,
            description: String::new(),
        }
    }

    fn playing(notes: Vec<Note>) -> GameState {
        let mut state = GameState::new(level(), Chart::from_notes(notes), CollisionTuning::default());
        state.phase = GamePhase::Playing;
        state
    }

    fn at(t: f32) -> TickInput {
        TickInput {
            song_time: t,
            ..Default::default()
        }
    }

    fn hits(events: &[GameEvent]) -> Vec<(u32, CutQuality, HitSource)> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::NoteHit {
                    note_id,
                    quality,
                    source,
                    ..
                } => Some((*note_id, *quality, *source)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_spawn_uses_look_ahead() {
        let mut state = playing(vec![Note::new(0, 10.0, 1, 1, Hand::Left)]);
        tick(&mut state, &at(6.9));
        assert_eq!(state.active_count(), 0);
        tick(&mut state, &at(7.0));
        assert_eq!(state.active_count(), 1);
        assert_eq!(state.remaining_to_spawn(), 0);
    }

    #[test]
    fn test_spawn_keeps_chart_order() {
        let mut state = playing(vec![
            Note::new(0, 10.0, 0, 0, Hand::Left),
            Note::new(1, 10.5, 3, 0, Hand::Right),
            Note::new(2, 20.0, 0, 0, Hand::Left),
        ]);
        tick(&mut state, &at(7.6));
        assert_eq!(state.active_indices(), &[0, 1]);
    }

    #[test]
    fn test_note_missed_past_miss_plane() {
        let mut state = playing(vec![Note::new(0, 10.0, 1, 1, Hand::Left)]);
        tick(&mut state, &at(8.0));
        tick(&mut state, &at(10.4));
        assert_eq!(state.active_count(), 1);
        tick(&mut state, &at(10.6));
        assert_eq!(state.active_count(), 0);
        assert_eq!(state.chart.notes()[0].state(), NoteState::Missed);
        assert_eq!(state.ledger.health, 85);
        assert!(state.events.contains(&GameEvent::NoteMissed {
            note_id: 0,
            absorbed: false
        }));
    }

    #[test]
    fn test_absent_hand_never_collides() {
        let mut state = playing(vec![Note::new(0, 10.0, 1, 1, Hand::Left)]);
        let mut input = at(10.0);
        // Right hand sits on the note but the note belongs to the left hand
        input.hands.right = Some(HandSample {
            position: state.chart.notes()[0].world_position(10.0),
            velocity: Vec3::ZERO,
        });
        tick(&mut state, &input);
        assert_eq!(state.active_count(), 1);
        assert!(state.chart.notes()[0].is_pending());
    }

    #[test]
    fn test_hand_hit_quality() {
        let mut state = playing(vec![
            Note::new(0, 10.0, 1, 1, Hand::Left),
            Note::new(1, 12.0, 2, 1, Hand::Right).with_cut(CutDirection::Down),
        ]);
        let slow_left = HandSample {
            position: state.chart.notes()[0].world_position(10.0),
            velocity: Vec3::new(0.5, 0.0, 0.0),
        };
        let mut input = at(10.0);
        input.hands.left = Some(slow_left);
        tick(&mut state, &input);

        let fast_down = HandSample {
            position: state.chart.notes()[1].world_position(12.0),
            velocity: Vec3::new(0.0, -3.0, 0.0),
        };
        let mut input = at(12.0);
        input.hands.right = Some(fast_down);
        tick(&mut state, &input);

        assert_eq!(
            hits(&state.events),
            vec![
                (0, CutQuality::Ok, HitSource::Hand),
                (1, CutQuality::Good, HitSource::Hand)
            ]
        );
        assert_eq!(state.ledger.score, 100 + 150);
        assert_eq!(state.ledger.combo, 2);
    }

    #[test]
    fn test_tornado_wins_over_hand() {
        let mut state = playing(vec![Note::new(0, 10.0, 1, 1, Hand::Left)]);
        cast_spell(&mut state, Spell::Tornado);
        let mut input = at(10.0);
        input.hands.left = Some(HandSample {
            position: state.chart.notes()[0].world_position(10.0),
            velocity: Vec3::ZERO,
        });
        tick(&mut state, &input);
        assert_eq!(
            hits(&state.events),
            vec![(0, CutQuality::Good, HitSource::Tornado)]
        );
    }

    #[test]
    fn test_miss_checked_before_tornado() {
        let mut state = playing(vec![Note::new(0, 10.0, 1, 1, Hand::Left)]);
        cast_spell(&mut state, Spell::Tornado);
        // First frame already past the miss plane
        tick(&mut state, &at(10.6));
        assert!(hits(&state.events).is_empty());
        assert_eq!(state.ledger.missed, 1);
    }

    #[test]
    fn test_lightning_full_clear_once_per_cast() {
        let notes = (0..5)
            .map(|i| Note::new(i, 10.0 + i as f32 * 0.1, (i % 4) as u8, 0, Hand::Left))
            .chain(std::iter::once(Note::new(5, 30.0, 0, 0, Hand::Left)))
            .collect();
        let mut state = playing(notes);
        tick(&mut state, &at(7.5));
        assert_eq!(state.active_count(), 5);

        cast_spell(&mut state, Spell::Lightning);
        state.events.clear();
        tick(&mut state, &at(7.6));

        let cleared = hits(&state.events);
        assert_eq!(cleared.len(), 5);
        assert!(
            cleared
                .iter()
                .all(|&(_, q, s)| q == CutQuality::Good && s == HitSource::Lightning)
        );
        assert_eq!(state.active_count(), 0);

        // Still the same cast: the next spawned note is not cleared
        assert!(state.power.is_active(Spell::Lightning));
        state.events.clear();
        tick(&mut state, &at(27.5));
        assert_eq!(state.active_count(), 1);
        assert!(hits(&state.events).is_empty());
    }

    #[test]
    fn test_shield_absorbs_three_misses_then_fourth_hurts() {
        let notes = (0..4)
            .map(|i| Note::new(i, 10.0 + i as f32, 0, 0, Hand::Left))
            .collect();
        let mut state = playing(notes);
        cast_spell(&mut state, Spell::Shield);

        for (i, t) in [10.6, 11.6, 12.6].into_iter().enumerate() {
            tick(&mut state, &at(t));
            assert_eq!(state.ledger.health, 100);
            assert_eq!(state.power.shield_charges() as usize, 2 - i);
        }
        assert!(!state.power.shield_active());
        assert!(state.events.contains(&GameEvent::ShieldBroken));

        tick(&mut state, &at(13.6));
        assert_eq!(state.ledger.health, 85);
    }

    #[test]
    fn test_lethal_miss_ends_session() {
        let mut state = playing(vec![
            Note::new(0, 10.0, 0, 0, Hand::Left),
            Note::new(1, 10.0, 3, 0, Hand::Right),
        ]);
        state.ledger.health = 10;
        tick(&mut state, &at(10.6));
        assert_eq!(state.ledger.health, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::Defeated));
        // The second note is frozen, not resolved
        assert!(state.chart.notes()[1].is_pending());

        // Finished sessions ignore further frames
        tick(&mut state, &at(11.0));
        assert_eq!(state.ledger.missed, 1);
    }

    #[test]
    fn test_song_end_checked_first() {
        let mut state = playing(vec![Note::new(0, 10.0, 0, 0, Hand::Left)]);
        tick(&mut state, &at(8.0));
        let input = TickInput {
            song_time: 11.0,
            song_ended: true,
            ..Default::default()
        };
        tick(&mut state, &input);
        assert_eq!(state.phase, GamePhase::Victory);
        assert_eq!(state.ledger.missed, 0);
    }

    #[test]
    fn test_countdown_only_while_playing() {
        let mut state = playing(vec![]);
        cast_spell(&mut state, Spell::Tornado);
        for _ in 0..50 {
            countdown_tick(&mut state);
        }
        assert_eq!(state.power.active(), None);
        assert!(state.events.contains(&GameEvent::SpellExpired(Spell::Tornado)));

        state.phase = GamePhase::Victory;
        cast_spell(&mut state, Spell::Freeze);
        assert_eq!(state.power.active(), None);
    }

    #[test]
    fn test_determinism() {
        let notes: Vec<Note> = (0..8)
            .map(|i| Note::new(i, 5.0 + i as f32 * 0.5, (i % 4) as u8, (i % 3) as u8, Hand::Left))
            .collect();
        let mut a = playing(notes.clone());
        let mut b = playing(notes);
        let hand = HandSample {
            position: Vec3::new(-0.4, 1.6, -0.3),
            velocity: Vec3::new(0.0, 2.0, 0.0),
        };
        for frame in 0..600 {
            let mut input = at(frame as f32 / 60.0);
            input.hands.left = Some(hand);
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.ledger, b.ledger);
        assert_eq!(a.active_indices(), b.active_indices());
        assert_eq!(a.events, b.events);
    }
}
