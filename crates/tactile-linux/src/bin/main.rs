//! Engine binary for embedded Linux panels.
//!
//! Device paths are fixed at build time (see `build.rs`). The engine config
//! is read from `TACTILE_CONFIG_PATH` when that file exists; the screen size
//! always comes from the framebuffer itself.

use std::process::ExitCode;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use log::{error, info, warn};

use tactile_core::config::{Backend, EngineConfig};
use tactile_core::engine::Engine;
use tactile_core::pages;
use tactile_core::render::{Renderer, SoftwareRenderer, SurfaceRenderer};
use tactile_linux::{ChannelInput, EvdevSource, FbBlitter, Framebuffer, TOUCH_CHANNEL, touch};

const TOUCH_DEVICE: &str = env!("TACTILE_TOUCH_DEVICE");
const FB_DEVICE: &str = env!("TACTILE_FB_DEVICE");
const CONFIG_PATH: &str = env!("TACTILE_CONFIG_PATH");

fn load_config() -> EngineConfig {
    let bytes = match std::fs::read(CONFIG_PATH) {
        Ok(bytes) => bytes,
        Err(e) => {
            info!("No config at {} ({}), using defaults", CONFIG_PATH, e);
            return EngineConfig::default();
        }
    };
    match EngineConfig::from_bytes(&bytes) {
        Ok(config) => {
            info!("Loaded config from {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            warn!("Ignoring config {}: {}", CONFIG_PATH, e);
            EngineConfig::default()
        }
    }
}

/// Register the demo scenes and run until a Quit event.
///
/// `after_present` pushes a freshly presented frame to the panel for
/// backends that do not write video memory themselves.
fn run<R, F>(mut engine: Engine<R>, mut after_present: F) -> ExitCode
where
    R: Renderer,
    F: FnMut(&mut R),
{
    pages::register_all(engine.scenes_mut());
    let failed = engine.preload_assets();
    if failed > 0 {
        warn!("{} assets failed to decode", failed);
    }
    let initial = engine.config().initial_scene;
    if let Err(e) = engine.set_active_scene(initial) {
        error!("Cannot start on scene {}: {}", initial, e);
        return ExitCode::FAILURE;
    }

    while engine.is_running() {
        match engine.iterate() {
            Ok(report) if report.presented => after_present(engine.renderer_mut()),
            Ok(_) => {}
            Err(e) => {
                error!("Engine iteration failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    info!("Exiting after {} frames", engine.frames());
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    env_logger::init();

    let mut config = load_config();
    let mut framebuffer = match Framebuffer::open(FB_DEVICE) {
        Ok(fb) => fb,
        Err(e) => {
            error!("Display unavailable: {}", e);
            return ExitCode::FAILURE;
        }
    };
    // Blank whatever the console left on screen before the first frame.
    let _ = framebuffer.clear(Rgb888::BLACK);
    let size = framebuffer.screen_size();
    config.width = size.width;
    config.height = size.height;
    info!(
        "Display {}×{}, {} page(s), {:?} backend",
        size.width,
        size.height,
        framebuffer.page_count(),
        config.backend
    );

    // Without touch the engine still renders; the scenes just never see input.
    let input = match EvdevSource::open(TOUCH_DEVICE) {
        Ok(source) => match touch::spawn(source, &TOUCH_CHANNEL) {
            Ok(_) => Some(ChannelInput::new(&TOUCH_CHANNEL)),
            Err(e) => {
                error!("Cannot start touch thread: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Touch unavailable: {}", e);
            None
        }
    };

    match config.backend {
        Backend::Software => {
            let mut engine = Engine::new(SoftwareRenderer::new(size), config, tactile_assets::ASSETS);
            if let Some(input) = input {
                engine = engine.with_input(input);
            }
            let mut framebuffer = framebuffer;
            // Whole frames go to the hidden page and are panned into view.
            run(engine, move |renderer: &mut SoftwareRenderer| {
                if let Err(e) = framebuffer.show_frame(renderer.front()) {
                    warn!("Cannot show frame: {}", e);
                }
            })
        }
        Backend::Surface => {
            let renderer = SurfaceRenderer::new(FbBlitter::new(framebuffer));
            let mut engine = Engine::new(renderer, config, tactile_assets::ASSETS);
            if let Some(input) = input {
                engine = engine.with_input(input);
            }
            run(engine, |_| {})
        }
    }
}
