//! Headless runner
//!
//! Plays one run with a scripted pilot and prints the final snapshot.
//!
//! Usage: `tank-arena [seed] [tuning.json] [save-dir]`

use std::path::Path;

use tank_arena::audio::LogAudio;
use tank_arena::consts::MS_PER_FRAME;
use tank_arena::persistence::{FileStorage, MemoryStorage, Storage};
use tank_arena::sim::{GameStatus, TickInput};
use tank_arena::{AudioSink, Session, Tuning};

/// Frames the demo runs before giving up (ten minutes of game time)
const MAX_FRAMES: u32 = 60 * 60 * 10;

/// Drive in a slow square while holding fire, using abilities when ready
fn scripted_input(frame: u32) -> TickInput {
    let leg = (frame / 90) % 4;
    TickInput {
        up: leg == 0,
        right: leg == 1,
        down: leg == 2,
        left: leg == 3,
        fire: true,
        ability: frame % 600 == 0,
        adrenaline: true,
    }
}

fn run<S: Storage, A: AudioSink>(mut session: Session<S, A>) {
    session.start();
    let mut frame = 0;
    while frame < MAX_FRAMES {
        let input = scripted_input(frame);
        let running = session.frame(MS_PER_FRAME, &input);

        if session.state().status == GameStatus::LevelUpPause {
            let choice = session.state().upgrade_choices.first().copied();
            if let Some(kind) = choice {
                session.select_upgrade(kind);
            }
        }
        if frame % 3600 == 0 && session.buy_shield() {
            log::info!("Scripted pilot bought a shield");
        }
        if !running {
            break;
        }
        frame += 1;
    }

    let snapshot = session.snapshot();
    log::info!(
        "Run finished after {:.1}s: score {}, difficulty {}, level {}",
        snapshot.time,
        snapshot.score,
        snapshot.difficulty,
        snapshot.level
    );
    match serde_json::to_string_pretty(snapshot) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Could not encode snapshot: {}", err),
    }
    if let Some(top) = session.high_scores().top_score() {
        println!("Best score: {top}");
    }
}

fn main() {
    env_logger::init();
    log::info!("Tank Arena (headless) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(12345);
    let tuning = args
        .next()
        .map(|path| Tuning::load_or_default(Path::new(&path)))
        .unwrap_or_default();
    let audio = LogAudio::new(0.8);

    match args.next() {
        Some(dir) => run(Session::with_tuning(FileStorage::new(dir), audio, seed, tuning)),
        None => run(Session::with_tuning(MemoryStorage::new(), audio, seed, tuning)),
    }
}
