//! Desktop simulator for the tactile rendering engine.
//!
//! Runs the engine and the demo scenes in an SDL2 window via
//! `embedded-graphics-simulator`. The left mouse button plays the finger:
//! clicks and drags are translated into the same multi-touch driver samples
//! a touch panel produces, so the whole input pipeline is exercised.
//!
//! # Key bindings
//!
//! | Key       | Action          |
//! |-----------|-----------------|
//! | 1         | Home scene      |
//! | 2         | Gallery scene   |
//! | Backspace | Back            |
//! | Q / Esc   | Quit            |
//!
//! Set `TACTILE_CONFIG` to a postcard-encoded engine config file to override
//! the defaults (screen size, swap mode, renderer backend).

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::{Keycode, MouseButton};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use log::{error, info, warn};

use tactile_core::config::{Backend, EngineConfig};
use tactile_core::engine::Engine;
use tactile_core::input::raw::{
    ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_TRACKING_ID, EV_ABS, TRACKING_RELEASED,
};
use tactile_core::input::{GfxEvent, InputReader, QueueSource, RawSample};
use tactile_core::pages::{self, GALLERY_SCENE, HOME_SCENE};
use tactile_core::render::{MemoryBlitter, Renderer, SoftwareRenderer, SurfaceRenderer};
use tactile_core::scene::Action;

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

const CONFIG_VAR: &str = "TACTILE_CONFIG";

// ---------------------------------------------------------------------------
// Mouse as a touch panel
// ---------------------------------------------------------------------------

/// Turns left-button mouse activity into driver sample frames.
struct MouseTouch {
    feed: Rc<RefCell<QueueSource>>,
    started: Instant,
    tracking: i32,
    down: bool,
}

impl MouseTouch {
    fn new(feed: Rc<RefCell<QueueSource>>) -> Self {
        Self {
            feed,
            started: Instant::now(),
            tracking: 0,
            down: false,
        }
    }

    fn frame(&self, samples: &[(u16, i32)]) {
        let time = self.started.elapsed();
        let mut feed = self.feed.borrow_mut();
        feed.extend(samples.iter().map(|&(code, value)| RawSample::new(time, EV_ABS, code, value)));
        feed.push(RawSample::report(time));
    }

    fn press(&mut self, point: Point) {
        self.down = true;
        self.tracking = self.tracking.wrapping_add(1) & 0xffff;
        self.frame(&[
            (ABS_MT_TRACKING_ID, self.tracking),
            (ABS_MT_POSITION_X, point.x),
            (ABS_MT_POSITION_Y, point.y),
        ]);
    }

    fn motion(&mut self, point: Point) {
        if self.down {
            self.frame(&[(ABS_MT_POSITION_X, point.x), (ABS_MT_POSITION_Y, point.y)]);
        }
    }

    fn release(&mut self, point: Point) {
        if !self.down {
            return;
        }
        self.down = false;
        self.frame(&[
            (ABS_MT_POSITION_X, point.x),
            (ABS_MT_POSITION_Y, point.y),
            (ABS_MT_TRACKING_ID, TRACKING_RELEASED),
        ]);
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Copies a presented frame into the SDL display.
trait Present: Renderer {
    fn present(&mut self, display: &mut SimulatorDisplay<Rgb888>);
}

impl Present for SoftwareRenderer {
    fn present(&mut self, display: &mut SimulatorDisplay<Rgb888>) {
        let _ = self.flush(display);
    }
}

impl Present for SurfaceRenderer<MemoryBlitter> {
    fn present(&mut self, display: &mut SimulatorDisplay<Rgb888>) {
        let _ = self.blitter().flush(display);
    }
}

fn load_config() -> EngineConfig {
    let Ok(path) = std::env::var(CONFIG_VAR) else {
        return EngineConfig::default();
    };
    match std::fs::read(&path).map(|bytes| EngineConfig::from_bytes(&bytes)) {
        Ok(Ok(config)) => {
            info!("Loaded config from {}", path);
            config
        }
        Ok(Err(e)) => {
            warn!("Ignoring config {}: {}", path, e);
            EngineConfig::default()
        }
        Err(e) => {
            warn!("Cannot read config {}: {}", path, e);
            EngineConfig::default()
        }
    }
}

fn keycode_to_action(keycode: Keycode) -> Option<Action> {
    match keycode {
        Keycode::Num1 | Keycode::Kp1 => Some(Action::SetActiveScene(HOME_SCENE)),
        Keycode::Num2 | Keycode::Kp2 => Some(Action::SetActiveScene(GALLERY_SCENE)),
        Keycode::Backspace => Some(Action::GoBack),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

fn run<R: Present>(renderer: R, config: EngineConfig) {
    let feed = Rc::new(RefCell::new(QueueSource::new()));
    let mut mouse = MouseTouch::new(Rc::clone(&feed));

    let mut engine = Engine::new(renderer, config, tactile_assets::ASSETS).with_input(InputReader::new(feed));
    pages::register_all(engine.scenes_mut());
    if engine.preload_assets() > 0 {
        warn!("Some assets failed to decode; their tiles show a placeholder");
    }
    if let Err(e) = engine.set_active_scene(config.initial_scene) {
        error!("Cannot start on scene {}: {}", config.initial_scene, e);
        return;
    }

    let mut display = SimulatorDisplay::<Rgb888>::new(config.screen_size());
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("tactile simulator", &output_settings);

    // The window must be updated once before events can be polled.
    let _ = display.clear(Rgb888::BLACK);
    window.update(&display);

    let events = engine.publisher();
    while engine.is_running() {
        let frame_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => events.publish(GfxEvent::Quit),
                SimulatorEvent::KeyDown { keycode, .. } => {
                    if keycode == Keycode::Q || keycode == Keycode::Escape {
                        events.publish(GfxEvent::Quit);
                    } else if let Some(action) = keycode_to_action(keycode) {
                        events.publish(GfxEvent::Action(action));
                    }
                }
                SimulatorEvent::MouseButtonDown {
                    mouse_btn: MouseButton::Left,
                    point,
                } => mouse.press(point),
                SimulatorEvent::MouseMove { point } => mouse.motion(point),
                SimulatorEvent::MouseButtonUp {
                    mouse_btn: MouseButton::Left,
                    point,
                } => mouse.release(point),
                _ => {}
            }
        }

        match engine.iterate() {
            Ok(report) if report.presented => engine.renderer_mut().present(&mut display),
            Ok(_) => {}
            Err(e) => {
                error!("Engine iteration failed: {}", e);
                break;
            }
        }
        window.update(&display);

        // The queue never blocks, so pace frames here.
        let elapsed = frame_start.elapsed();
        if elapsed < config.poll_timeout() {
            std::thread::sleep(config.poll_timeout() - elapsed);
        }
    }

    info!("Simulator exiting after {} frames", engine.frames());
}

fn main() {
    env_logger::init();
    let config = load_config();
    info!(
        "Display: {}×{} (scale {}×), {:?} backend",
        config.width, config.height, WINDOW_SCALE, config.backend
    );
    info!("Keys: 1=Home  2=Gallery  Backspace=Back  Q=Quit");

    let size = config.screen_size();
    match config.backend {
        Backend::Software => run(SoftwareRenderer::new(size), config),
        Backend::Surface => run(SurfaceRenderer::new(MemoryBlitter::new(size)), config),
    }
}
