//! Secret Pong entry point
//!
//! In the browser the library's start hook does the setup and the page
//! drives everything through the exported bindings. Natively this runs a
//! headless walkthrough: draw a 7, unlock, play a round and record the score.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use secret_pong::audio::{AudioEngine, DeviceKind, NullBackend};
    use secret_pong::gesture::shape::polyline;
    use secret_pong::gesture::{NoStyle, RawPointer, SurfaceRect};
    use secret_pong::highscores::LocalLeaderboard;
    use secret_pong::score::{Anonymous, ScoreFlow};
    use secret_pong::{GestureOutcome, GestureSurface, GameSession, Settings, UnlockOrchestrator};
    use std::cell::Cell;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Secret Pong (native) starting...");

    let settings = Settings::load();

    // Draw a "7" across a 400x400 surface
    let mut surface = GestureSurface::new(
        SurfaceRect::new(0.0, 0.0, 400.0, 400.0),
        NoStyle,
        settings.gesture,
    );
    let stroke = polyline(
        &[
            Vec2::new(160.0, 40.0),
            Vec2::new(360.0, 40.0),
            Vec2::new(74.0, 340.0),
        ],
        20,
        0.0,
        16.0,
    );
    let mouse = |x: f32, y: f32| RawPointer::Mouse { x, y };
    let Some((first, rest)) = stroke.split_first() else {
        return;
    };
    surface.pointer_down(&mouse(first.x, first.y), &[], first.t);
    for s in rest {
        surface.pointer_move(&mouse(s.x, s.y), s.t);
    }
    let outcome = surface.pointer_up();
    println!("Gesture: {:?}", outcome);

    let opened = Cell::new(false);
    let mut unlock = UnlockOrchestrator::new(|| opened.set(true), settings.unlock_cooldown_ms);
    if outcome == Some(GestureOutcome::Matched) {
        unlock.signal(1_000.0);
    }
    if !opened.get() {
        println!("Nothing unlocked");
        return;
    }

    let audio = AudioEngine::new(NullBackend::default(), DeviceKind::Desktop, &settings);
    let store = LocalLeaderboard::load(settings.leaderboard_size);
    let mut game = GameSession::new(42, &settings, audio, Box::new(Anonymous), Box::new(store));
    game.user_gesture();

    // Track the ball for a while, then look away
    let frame_dt = 1.0 / 60.0;
    let mut flow = None;
    for frame in 0..60 * 120 {
        let y = if frame < 60 * 20 {
            game.sim().ball.pos.y
        } else {
            0.0
        };
        game.pointer_y(y);
        flow = game.frame(frame_dt);
        if flow.is_some() {
            break;
        }
    }

    println!(
        "Round over: score {}, speed level {}",
        game.sim().score,
        game.sim().speed_level
    );
    match flow {
        Some(ScoreFlow::NamePrompt { score, rank }) => {
            println!("Score {} would place #{}", score, rank.unwrap_or_default());
            match game.submit_name("Demo") {
                Ok(result) => println!("Submission: {:?}", result),
                Err(e) => println!("Name rejected: {}", e),
            }
        }
        Some(other) => println!("Score flow: {:?}", other),
        None => println!("Round still running after two minutes"),
    }

    for entry in game.leaderboard() {
        println!("  #{:<2} {:<30} {}", entry.rank, entry.player_name, entry.score);
    }

    game.close();
    unlock.session_closed();
    log::info!("Done");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the library's start hook, this is just to satisfy the compiler
}
