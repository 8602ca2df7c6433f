//! Spell Slinger headless runner
//!
//! Plays a level with a scripted autopilot in place of a camera, then folds
//! the result into the saved progression.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;

    use spell_slinger::input::{Autopilot, TrackingBridge};
    use spell_slinger::platform::{AudioClock, NullHaptics, SimulatedClock};
    use spell_slinger::progression::{JsonFileStore, ProgressStore, level_by_id};
    use spell_slinger::sim::Spell;
    use spell_slinger::{Difficulty, Result, Session, Settings, Tick};

    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Frames past the song end before the run is abandoned
    const OVERRUN_FRAMES: u32 = 600;

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Headless autopilot run of a Spell Slinger level", long_about = None)]
    struct Cli {
        /// Level to play
        #[arg(short, long, default_value_t = 1)]
        level: u32,

        /// Fixed chart seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Difficulty override (assist, normal, expert)
        #[arg(short, long)]
        difficulty: Option<String>,

        /// Settings file
        #[arg(long, default_value = "spell-slinger-settings.json")]
        settings: PathBuf,

        /// Progression save file
        #[arg(long, default_value = "spell-slinger-progress.json")]
        progress: PathBuf,

        /// Play without touching the progression file
        #[arg(long)]
        no_save: bool,
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let cli = Cli::parse();

        let mut settings = Settings::load(&cli.settings);
        if let Some(name) = cli.difficulty.as_deref() {
            match Difficulty::from_str(name) {
                Some(difficulty) => settings.difficulty = difficulty,
                None => log::warn!("Unknown difficulty '{}', keeping {}", name, settings.difficulty.as_str()),
            }
        }

        let mut store = JsonFileStore::new(&cli.progress);
        let mut player = store.load()?;
        if !player.is_level_unlocked(cli.level) {
            log::warn!("Level {} is still locked; playing it anyway", cli.level);
        }

        let level = level_by_id(cli.level)?;
        let duration = level.duration;
        let mut autopilot = Autopilot::new(settings.mirror_camera)
            .with_cast(duration * 0.3, Spell::Lightning)
            .with_cast(duration * 0.5, Spell::Shield)
            .with_cast(duration * 0.7, Spell::Tornado)
            .with_cast(duration * 0.85, Spell::Freeze);
        let bridge = TrackingBridge::new(settings.mirror_camera);
        let mut session = Session::new(SimulatedClock::new(duration), NullHaptics, settings);

        let mut now_ms = 0.0_f64;
        bridge.publish(Ok(autopilot.frame(session.state(), 0.0, now_ms)));
        session.mark_tracking_ready();
        session.start(&level, cli.seed)?;

        let max_frames = ((duration / FRAME_DT) as u32).saturating_add(OVERRUN_FRAMES);
        let mut countdown_acc = 0.0_f64;
        let mut frames = 0u32;
        while !session.phase().is_finished() {
            if frames >= max_frames {
                log::warn!("Song clock stalled; ending run");
                session.end(false);
                break;
            }
            frames += 1;

            session.clock_mut().advance(FRAME_DT);
            now_ms += FRAME_DT as f64 * 1000.0;
            let song_time = session.clock().position();
            bridge.publish(Ok(autopilot.frame(session.state(), song_time, now_ms)));

            session.update(Tick::Frame { dt: FRAME_DT }, &bridge);

            countdown_acc += FRAME_DT as f64 * 1000.0;
            while countdown_acc >= spell_slinger::consts::POWER_UP_TICK_MS {
                countdown_acc -= spell_slinger::consts::POWER_UP_TICK_MS;
                session.update(Tick::Countdown { now_ms }, &bridge);
            }

            for event in session.drain_events() {
                log::debug!("{:?}", event);
            }
        }
        bridge.shutdown();

        let summary = session.summary();
        println!(
            "{} \"{}\": {} | score {} | accuracy {:.1}% | max combo {} | defeated {} | missed {} | spells {}",
            if summary.victory { "VICTORY" } else { "DEFEAT" },
            level.name,
            level.description,
            summary.score,
            summary.accuracy * 100.0,
            summary.max_combo,
            summary.defeated,
            summary.missed,
            summary.total_spells()
        );

        if cli.no_save {
            return Ok(());
        }
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        let stars = player.record_session(&summary, now);
        store.save(&player)?;
        println!(
            "Stars: {} | total {} | rank {} ({:.0}% to next)",
            stars,
            player.total_score,
            player.rank().name,
            spell_slinger::progression::progress_to_next_rank(player.total_score) * 100.0
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> spell_slinger::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser shell drives `Session` directly
}
