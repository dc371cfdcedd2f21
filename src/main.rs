/// Entry point and game loop.

mod cli_options;
mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use log::{error, info};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level::load_level;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{
    InputState, KEYS_BACK, KEYS_CONFIRM, KEYS_PAUSE, KEYS_QUIT, KEYS_RESET, KEYS_SKIP,
};
use ui::renderer::Renderer;
use ui::sound::{Sfx, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let args = cli_options::parse();
    cli_options::init_logging(&args);

    let config = GameConfig::load(args.config.as_deref());

    if let Some(code) = cli_options::run_print(&args, &config) {
        std::process::exit(code);
    }

    let mut world = WorldState::new(config.clone(), args.seed);
    world.current_level = args.level_index();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Maze Explorer!");
    if world.coupons.is_empty() {
        println!("No coupons earned this time.");
    }
    for c in &world.coupons {
        println!("  {}  #{}", c.title, c.code_str());
        println!("    {}", c.description);
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, &gp) {
            break;
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            last_tick = Instant::now();
            world.anim_tick = world.anim_tick.wrapping_add(1);

            if world.phase == Phase::Playing && !world.paused {
                let input = FrameInput { movement: kb.movement().or_else(|| gp.movement()) };
                let dt_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                let events = step::step(world, input, dt_ms);
                process_sound_events(sound, &events);
            } else if world.message_timer > 0 {
                world.message_timer -= 1;
                if world.message_timer == 0 { world.message.clear(); }
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for event in events {
        match event {
            GameEvent::PowerPicked { kind, .. } => sfx.play(Sfx::pickup(*kind)),
            GameEvent::PowerExpired { .. } => sfx.play(Sfx::Expire),
            GameEvent::StartUnblocked => sfx.play(Sfx::Unblock),
            GameEvent::TooFast { .. } => sfx.play(Sfx::TooFast),
            GameEvent::LevelCleared { .. } => sfx.play(Sfx::Clear),
            GameEvent::TimeUp => sfx.play(Sfx::TimeUp),
            _ => {}
        }
    }
}

/// Back to the title screen. Coupons and the RNG stream survive.
fn return_to_title(world: &mut WorldState) {
    world.cancel_timers();
    world.paused = false;
    world.message.clear();
    world.message_timer = 0;
    world.phase = Phase::Title;
    if world.current_level >= world.total_levels {
        world.current_level = 0;
    }
}

/// Returns true to quit.
fn handle_meta(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let back = kb.any_pressed(KEYS_BACK) || gp.cancel_pressed();
    let reset = kb.any_pressed(KEYS_RESET) || gp.restart_pressed();
    let skip = kb.any_pressed(KEYS_SKIP) || gp.skip_pressed();

    // ── Pause (Playing only; simulation time freezes) ──
    if world.phase == Phase::Playing && kb.any_pressed(KEYS_PAUSE) {
        world.paused = !world.paused;
        info!("{}", if world.paused { "paused" } else { "resumed" });
        return false;
    }
    if world.paused {
        if back {
            return_to_title(world);
        }
        return false;
    }

    match world.phase {
        Phase::Title => {
            if confirm {
                load_level(world, world.current_level);
            } else if back || kb.any_pressed(KEYS_QUIT) {
                return true;
            }
        }

        Phase::LevelReady => {
            if back {
                return_to_title(world);
            } else if kb.anything_pressed() || gp.confirm_pressed() || gp.any_direction_pressed() {
                world.phase = Phase::Playing;
                world.message.clear();
                world.message_timer = 0;
            }
        }

        Phase::Playing => {
            if back {
                return_to_title(world);
            } else if reset {
                step::restart_level(world);
                world.set_message("New maze!", 30);
            } else if skip {
                step::skip_level(world);
            }
        }

        Phase::TooFast => {
            if confirm {
                step::regenerate_level(world);
                world.set_message("Take your time this round", 40);
            } else if back {
                return_to_title(world);
            }
        }

        Phase::LevelComplete => {
            if confirm {
                step::advance_level(world);
            } else if back {
                world.current_level += 1;
                return_to_title(world);
            }
        }

        Phase::TimeUp => {
            if reset || confirm {
                step::restart_level(world);
            } else if skip {
                step::skip_level(world);
            } else if back {
                return_to_title(world);
            }
        }

        Phase::GameComplete => {
            if confirm || back {
                world.current_level = 0;
                return_to_title(world);
            }
        }
    }

    false
}
