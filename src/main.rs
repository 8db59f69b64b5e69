/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

use std::io;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};

use config::AppConfig;
use domain::message::Message;
use error::SetupError;
use sim::event::Lifecycle;
use sim::sequencer::Phase;
use sim::source;
use sim::stage::Stage;
use ui::gamepad::GamepadState;
use ui::input::{Command, InputState};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;
use ui::viewport::{Follow, Viewport};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> ExitCode {
    let config = AppConfig::load();
    logging::init(&config.log_file, &config.warnings);
    info!(version = env!("CARGO_PKG_VERSION"), "cipherscroll starting");

    let text = match source::from_config(config.message_file.as_ref()).load() {
        Ok(t) => t,
        Err(e) => return setup_failed(e),
    };
    let message = Message::new(text);

    let rng = match config.seed {
        Some(seed) => {
            info!(seed, "seeded run");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let mut stage = Stage::new(message, &config, rng);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        return setup_failed(SetupError::Terminal(e));
    }

    let mut sound = SoundEngine::new(config.audio.music_volume, config.audio.effects_volume);

    let result = frame_loop(&mut stage, &mut renderer, sound.as_mut(), &config);

    stage.teardown();
    if let Some(sfx) = sound.as_mut() {
        sfx.stop_music();
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => {
            info!("exit");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "frame loop failed");
            eprintln!("cipherscroll: {e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_failed(e: SetupError) -> ExitCode {
    error!(error = %e, "setup failed");
    eprintln!("cipherscroll: {e}");
    ExitCode::FAILURE
}

fn frame_loop(
    stage: &mut Stage,
    renderer: &mut Renderer,
    mut sound: Option<&mut SoundEngine>,
    config: &AppConfig,
) -> io::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_release_supported();
    let mut gp = GamepadState::new(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }
    let mut view = Viewport::new();
    let started = Instant::now();
    let mut last_frame = started;

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_requested() || gp.cancel_pressed() {
            info!(phase = ?stage.phase(), "quit requested");
            break;
        }

        let mut events = Vec::new();
        if kb.confirm_pressed() || gp.confirm_pressed() {
            events.extend(confirm(stage));
        }

        if !stage.scroll_locked() {
            for cmd in kb.commands() {
                if let Command::Scroll(s) = cmd {
                    view.scroll(*s);
                }
            }
            for s in gp.scrolls() {
                view.scroll(s);
            }
        }

        let now = Instant::now();
        events.extend(stage.pump(now - last_frame));
        last_frame = now;

        for event in &events {
            debug!(?event, "lifecycle");
        }
        process_sound_events(sound.as_deref_mut(), &events);
        process_view_events(&mut view, &events);

        renderer.render(stage, &mut view, started.elapsed())?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// One confirmation input: acknowledges the intro card, or asks to decrypt.
fn confirm(stage: &mut Stage) -> Vec<Lifecycle> {
    if stage.phase() == Phase::Idle {
        stage.start()
    } else {
        stage.activate()
    }
}

fn process_sound_events(sound: Option<&mut SoundEngine>, events: &[Lifecycle]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            Lifecycle::IntroFinished => sfx.start_music(),
            Lifecycle::TypingProgress { .. } => sfx.play_keystroke(),
            Lifecycle::DecryptionStarted => sfx.play_static(),
            Lifecycle::DecryptionComplete => sfx.play_chime(),
            _ => {}
        }
    }
}

fn process_view_events(view: &mut Viewport, events: &[Lifecycle]) {
    for event in events {
        match event {
            Lifecycle::TypingProgress { .. } => view.request(Follow::Tail),
            Lifecycle::DecryptionComplete
            | Lifecycle::EpilogueLine { .. }
            | Lifecycle::ClosingRevealed => {
                view.request(Follow::Bottom)
            }
            _ => {}
        }
    }
}
