//! Session controller
//!
//! Owns the simulation state, the audio clock and the haptics sink, and is
//! the single entry point for both periodic sources (render frames and the
//! ~100ms power-up countdown). Callers serialize access by holding `&mut`.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::SPELL_RETRIGGER_MS;
use crate::error::{GameError, Result};
use crate::input::InputSource;
use crate::platform::*;
use crate::project_to_screen;
use crate::settings::Settings;
use crate::sim::*;

/// Hit notes stay in the view this long for hit effects (seconds)
pub const HIT_EFFECT_SECS: f32 = 0.5;

/// Camera shake intensities
pub const SHAKE_GOOD_HIT: f32 = 0.3;
pub const SHAKE_OK_HIT: f32 = 0.15;
pub const SHAKE_FULL_CLEAR: f32 = 1.0;
/// Exponential decay rate of the shake (per second)
const SHAKE_DECAY: f32 = 10.0;
const SHAKE_CUTOFF: f32 = 0.01;
/// Undrained renderer events kept; older ones are dropped first
pub const MAX_QUEUED_EVENTS: usize = 256;

/// One update from either periodic source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Display-synchronized frame; `dt` is wall time since the last frame
    Frame { dt: f32 },
    /// Fixed-rate power-up tick; `now_ms` is wall-clock time
    Countdown { now_ms: f64 },
}

/// Result of one level attempt, handed to the progression store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub level_id: u32,
    pub victory: bool,
    pub score: u64,
    /// Hits over resolved notes (0..=1)
    pub accuracy: f32,
    pub max_combo: u32,
    pub defeated: u32,
    pub missed: u32,
    pub spells_cast: SpellCounts,
    /// Seconds spent in PLAYING
    pub play_time: f32,
}

impl SessionSummary {
    pub fn total_spells(&self) -> u32 {
        self.spells_cast.total()
    }
}

/// A note as the renderer should draw it this frame
#[derive(Debug, Clone, PartialEq)]
pub struct NoteView {
    pub id: u32,
    pub hand: Hand,
    pub lane: u8,
    pub layer: u8,
    pub world: Vec3,
    /// Normalized device coordinates, `None` behind the camera
    pub screen: Option<Vec2>,
    /// Already hit (shown briefly for the hit effect)
    pub hit: bool,
}

/// Per-frame read model for the renderer/HUD
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub phase: GamePhase,
    pub song_time: f32,
    pub notes: Vec<NoteView>,
    pub score: u64,
    pub combo: u32,
    pub multiplier: u32,
    pub health: u32,
    pub power_up: Option<Spell>,
    pub power_up_remaining: f32,
    pub shield_active: bool,
    pub shield_charges: u8,
    /// 1 on the beat, decaying sharply until the next
    pub beat_pulse: f32,
    pub camera_shake: f32,
}

/// Lighting pulse for audio time `t`
pub fn beat_pulse(t: f32, beat: f32) -> f32 {
    if beat <= 0.0 {
        return 0.0;
    }
    let phase = t.rem_euclid(beat) / beat;
    (1.0 - phase).powi(4)
}

pub struct Session<C: AudioClock, H: HapticSink> {
    state: GameState,
    clock: C,
    haptics: H,
    settings: Settings,
    /// Wall-clock time of the last delivered spell
    last_cast_ms: Option<f64>,
    shake: f32,
    play_time: f32,
    events: Vec<GameEvent>,
}

impl<C: AudioClock, H: HapticSink> Session<C, H> {
    pub fn new(clock: C, haptics: H, settings: Settings) -> Self {
        Self {
            state: GameState::default(),
            clock,
            haptics,
            settings,
            last_cast_ms: None,
            shake: 0.0,
            play_time: 0.0,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn haptics(&self) -> &H {
        &self.haptics
    }

    /// Tracking came up; the session may now start levels
    pub fn mark_tracking_ready(&mut self) {
        if self.state.phase == GamePhase::Loading {
            log::info!("Tracking ready");
            self.state.phase = GamePhase::Idle;
        }
    }

    /// Reset all session state for `level` and begin playback
    ///
    /// `seed` overrides the settings seed; with neither, a fresh one is drawn.
    /// If the clock refuses to play the session stays out of PLAYING and the
    /// call can be retried.
    pub fn start(&mut self, level: &LevelConfig, seed: Option<u64>) -> Result<()> {
        if self.state.phase == GamePhase::Loading {
            return Err(GameError::TrackingNotReady);
        }

        let seed = seed
            .or(self.settings.chart_seed)
            .unwrap_or_else(rand::random);
        let chart = generate_chart_seeded(level, seed)?;

        self.clock.pause();
        self.clock.seek(0.0);
        if let Err(err) = self.clock.play() {
            log::warn!("Level {} could not start: {}", level.id, err);
            if self.state.phase == GamePhase::Playing {
                self.state.phase = GamePhase::Idle;
            }
            return Err(err);
        }

        self.state = GameState::new(level.clone(), chart, self.settings.tuning());
        self.state.phase = GamePhase::Playing;
        self.last_cast_ms = None;
        self.shake = 0.0;
        self.play_time = 0.0;
        self.events.clear();

        log::info!(
            "Level {} \"{}\" started with seed {} ({} notes)",
            level.id,
            level.name,
            seed,
            self.state.chart.len()
        );
        Ok(())
    }

    /// Freeze the session and stop the clock
    pub fn end(&mut self, victory: bool) {
        if self.state.phase != GamePhase::Playing {
            return;
        }
        self.state.phase = if victory {
            GamePhase::Victory
        } else {
            GamePhase::GameOver
        };
        self.finish();
    }

    fn finish(&mut self) {
        self.clock.pause();
        log::info!(
            "Session over ({:?}): score {}, max combo {}, accuracy {:.0}%",
            self.state.phase,
            self.state.ledger.score,
            self.state.ledger.max_combo,
            self.state.ledger.accuracy() * 100.0
        );
    }

    /// Single serialized update entry point
    pub fn update<I: InputSource + ?Sized>(&mut self, tick_kind: Tick, input: &I) {
        match tick_kind {
            Tick::Frame { dt } => self.frame(dt, input),
            Tick::Countdown { now_ms } => self.countdown(now_ms, input),
        }
    }

    fn frame<I: InputSource + ?Sized>(&mut self, dt: f32, input: &I) {
        self.decay_shake(dt);
        if self.state.phase != GamePhase::Playing {
            return;
        }

        let frame_input = TickInput {
            song_time: self.clock.position(),
            song_ended: self.clock.has_ended(),
            hands: input.hands(),
        };
        tick(&mut self.state, &frame_input);
        self.play_time += dt;
        self.dispatch_events();

        if self.state.phase.is_finished() {
            self.finish();
        }
    }

    fn countdown<I: InputSource + ?Sized>(&mut self, now_ms: f64, input: &I) {
        if self.state.phase != GamePhase::Playing {
            return;
        }

        if let Some(slot) = input.pending_gesture() {
            let spaced = self
                .last_cast_ms
                .is_none_or(|last| now_ms - last > SPELL_RETRIGGER_MS);
            if !slot.is_fresh() {
                // Cooldown ran out before delivery
                input.clear_gesture();
            } else if spaced {
                self.last_cast_ms = Some(now_ms);
                input.clear_gesture();
                cast_spell(&mut self.state, slot.spell);
            }
        }

        countdown_tick(&mut self.state);
        self.dispatch_events();
    }

    /// Turn simulation events into haptics and shake, then queue them
    fn dispatch_events(&mut self) {
        let shake_on = self.settings.effective_camera_shake();
        for event in self.state.drain_events() {
            let (pattern, shake) = match &event {
                GameEvent::NoteHit {
                    quality, source, ..
                } => {
                    let pattern = if quality.is_good() {
                        HAPTIC_GOOD_HIT
                    } else {
                        HAPTIC_OK_HIT
                    };
                    let shake = match (source, quality) {
                        (HitSource::Lightning, _) => SHAKE_FULL_CLEAR,
                        (_, CutQuality::Good) => SHAKE_GOOD_HIT,
                        (_, CutQuality::Ok) => SHAKE_OK_HIT,
                    };
                    (Some(pattern), Some(shake))
                }
                GameEvent::NoteMissed { absorbed: true, .. } => (Some(HAPTIC_SHIELD_ABSORB), None),
                GameEvent::SpellCast(_) => (Some(HAPTIC_SPELL_CAST), None),
                _ => (None, None),
            };
            if let (Some(pattern), true) = (pattern, self.settings.haptics) {
                self.haptics.vibrate(pattern);
            }
            if let (Some(shake), true) = (shake, shake_on) {
                self.shake = self.shake.max(shake);
            }
            self.events.push(event);
        }
        if self.events.len() > MAX_QUEUED_EVENTS {
            let excess = self.events.len() - MAX_QUEUED_EVENTS;
            self.events.drain(..excess);
        }
    }

    fn decay_shake(&mut self, dt: f32) {
        if self.shake <= 0.0 {
            return;
        }
        self.shake -= self.shake * (SHAKE_DECAY * dt).min(1.0);
        if self.shake < SHAKE_CUTOFF {
            self.shake = 0.0;
        }
    }

    /// Events since the last drain (renderer-side effects only)
    ///
    /// Embedders should drain once per frame; at most [`MAX_QUEUED_EVENTS`]
    /// are held, oldest dropped first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn camera_shake(&self) -> f32 {
        self.shake
    }

    pub fn summary(&self) -> SessionSummary {
        let ledger = &self.state.ledger;
        SessionSummary {
            level_id: self.state.level.as_ref().map_or(0, |l| l.id),
            victory: self.state.phase == GamePhase::Victory,
            score: ledger.score,
            accuracy: ledger.accuracy(),
            max_combo: ledger.max_combo,
            defeated: ledger.defeated,
            missed: ledger.missed,
            spells_cast: ledger.spells_cast,
            play_time: self.play_time,
        }
    }

    /// Snapshot for rendering at `aspect` (width / height)
    pub fn view(&self, aspect: f32) -> FrameView {
        let t = self.state.song_time;
        let mut notes: Vec<NoteView> = Vec::new();

        let recent_hits = self.state.chart.iter().filter(|n| {
            n.hit_time()
                .is_some_and(|at| t - at <= HIT_EFFECT_SECS)
        });
        let active = self
            .state
            .active_indices()
            .iter()
            .filter_map(|&idx| self.state.chart.get(idx));

        for note in recent_hits.chain(active) {
            let world = note.world_position(t);
            notes.push(NoteView {
                id: note.id,
                hand: note.hand,
                lane: note.lane,
                layer: note.layer,
                world,
                screen: project_to_screen(world, aspect),
                hit: !note.is_pending(),
            });
        }

        let beat = self
            .state
            .level
            .as_ref()
            .map_or(0.0, |l| l.beat_duration());
        let ledger = &self.state.ledger;
        let power = &self.state.power;

        FrameView {
            phase: self.state.phase,
            song_time: t,
            notes,
            score: ledger.score,
            combo: ledger.combo,
            multiplier: ledger.multiplier,
            health: ledger.health,
            power_up: power.active(),
            power_up_remaining: power.remaining(),
            shield_active: power.shield_active(),
            shield_charges: power.shield_charges(),
            beat_pulse: if self.state.phase == GamePhase::Playing {
                beat_pulse(t, beat)
            } else {
                0.0
            },
            camera_shake: self.shake,
        }
    }
}
