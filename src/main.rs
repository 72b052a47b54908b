/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level::load_level_def;
use sim::step;
use sim::view::FrameView;
use sim::world::WorldState;
use ui::assets::AssetCache;
use ui::input::TerminalControls;
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    logging::init(&config.log_file, config.log_level);
    for warning in &config.warnings {
        log::warn!("{warning}");
    }

    let level = load_level_def(&config);
    let mut world = WorldState::new(&level, &config);

    let mut assets = AssetCache::new(&config.assets_dir);
    assets.preload();

    let mut renderer = Renderer::new(config.screen.cell_width, config.screen.cell_height);
    let mut controls = TerminalControls::new(&config.controls, &config.gamepad);

    match renderer.init() {
        Ok(release_events) => controls.keys.honor_release = release_events,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    }

    let mut sound = SoundEngine::new(&config.sound);
    if let Some(sfx) = sound.as_mut() {
        sfx.play_background_music("background");
    }

    let result = game_loop(&mut world, &mut renderer, &mut controls, &assets, sound.as_mut(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = &result {
        log::error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }
    log::info!("quit after {} frames", world.tick);
    logging::flush();

    println!();
    println!("Thanks for playing Mage Knight!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    controls: &mut TerminalControls,
    assets: &AssetCache,
    mut sound: Option<&mut SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_secs_f64(1.0 / config.frame_rate as f64);
    let dt_ms = tick_rate.as_secs_f32() * 1000.0;
    let mut last_tick = Instant::now();

    loop {
        let meta = controls.poll();
        if meta.quit {
            break;
        }
        if meta.toggle_pause {
            world.paused = !world.paused;
            log::info!("{}", if world.paused { "paused" } else { "resumed" });
        }

        if last_tick.elapsed() >= tick_rate {
            // One snapshot per step: held-key timeouts must not change mid-step.
            let input = FrameInput::sample(&*controls);
            let events = step::step(world, &input, dt_ms);
            if let Some(sfx) = sound.as_deref_mut() {
                play_cues(sfx, &events);
            }
            last_tick = Instant::now();
        }

        // Viewport follows the terminal size.
        let (view_w, view_h) = renderer.sync_size()?;
        if (view_w, view_h) != (world.camera.view_w, world.camera.view_h) {
            world.camera.resize(view_w, view_h);
            world.camera.update(world.player.rect());
        }

        let view = FrameView::capture(world);
        renderer.render(&view, assets, &logging::recent_warnings())?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn play_cues(sfx: &mut SoundEngine, events: &[GameEvent]) {
    for event in events {
        if let Some((clip, channel)) = sound::cue_for(event) {
            sfx.play_audio_clip(&clip, channel);
        }
    }
}
