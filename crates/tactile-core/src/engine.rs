//! The engine loop
//!
//! One [`Engine::iterate`] call:
//! - waits (bounded) for touch input and publishes the classified events,
//! - drains the event broker, which routes touches into the active scene,
//! - applies the actions controls emitted (navigation),
//! - repaints dirty controls and presents the frame if anything was painted.
//!
//! Only [`SwapOp::Copy`] leaves the last frame in the back buffer. With the
//! other swap ops a frame that changes anything is repainted in full.
//!
//! Everything runs on the caller's thread. A failing touch device is logged
//! and switched off; the engine keeps rendering without input.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::{debug, error, info, warn};

use crate::cache::AssetCache;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::geometry::Rect;
use crate::input::{EventBroker, GfxEvent, Publisher, Subscription, TouchEvent, TouchInput};
use crate::pixel_data::CompressedResource;
use crate::render::{Renderer, SwapOp};
use crate::scene::{Scene, SceneContext, SceneId, SceneManager};

/// State the event broker's subscribers work on.
pub struct EngineState {
    pub scenes: SceneManager,
    pub running: bool,
}

/// Summary of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Iteration {
    pub touches: usize,
    pub events: usize,
    pub painted: usize,
    pub presented: bool,
}

pub struct Engine<R: Renderer> {
    renderer: R,
    cache: AssetCache,
    state: EngineState,
    broker: EventBroker<EngineState>,
    config: EngineConfig,
    assets: &'static [CompressedResource],
    input: Option<Box<dyn TouchInput>>,
    touches: Vec<TouchEvent>,
    frames: u32,
    _dispatch: Subscription,
}

impl<R: Renderer> Engine<R> {
    pub fn new(renderer: R, config: EngineConfig, assets: &'static [CompressedResource]) -> Self {
        let mut broker = EventBroker::new();
        let dispatch = broker.subscribe(dispatch_event);
        info!(
            "Engine {}x{} with {} compiled-in assets",
            config.width,
            config.height,
            assets.len()
        );
        Self {
            renderer,
            cache: AssetCache::new(),
            state: EngineState {
                scenes: SceneManager::new(),
                running: true,
            },
            broker,
            config,
            assets,
            input: None,
            touches: Vec::new(),
            frames: 0,
            _dispatch: dispatch,
        }
    }

    pub fn with_input<I: TouchInput + 'static>(mut self, input: I) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut AssetCache {
        &mut self.cache
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.state.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.state.scenes
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe application handlers. They run after the built-in scene
    /// dispatcher and see only events it did not consume.
    pub fn broker_mut(&mut self) -> &mut EventBroker<EngineState> {
        &mut self.broker
    }

    pub fn publisher(&self) -> Publisher {
        self.broker.publisher()
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn register_scene<F>(&mut self, id: SceneId, factory: F)
    where
        F: Fn(Rect) -> Box<dyn Scene> + 'static,
    {
        self.state.scenes.register(id, factory);
    }

    /// Decode the whole asset table up front. Failures are logged per asset.
    pub fn preload_assets(&mut self) -> usize {
        let failed = self.cache.preload(self.assets);
        for (id, e) in &failed {
            error!("Asset {} unusable: {}", id, e);
        }
        failed.len()
    }

    pub fn set_active_scene(&mut self, id: SceneId) -> Result<()> {
        let before = self.state.scenes.active_id();
        let result = {
            let (scenes, mut ctx) = self.split();
            scenes.set_active_scene(id, &mut ctx)
        };
        self.reset_input_on_switch(before);
        result
    }

    /// Drop buffered input of a gesture that began in the previous scene.
    fn reset_input_on_switch(&mut self, before: Option<SceneId>) {
        if self.state.scenes.active_id() == before {
            return;
        }
        if let Some(input) = self.input.as_mut() {
            input.reset();
        }
    }

    fn split(&mut self) -> (&mut SceneManager, SceneContext<'_>) {
        let ctx = SceneContext {
            cache: &mut self.cache,
            textures: &mut self.renderer,
            screen: Rect::screen(self.config.screen_size()),
            assets: self.assets,
            thresholds: self.config.gestures,
            events: self.broker.publisher(),
        };
        (&mut self.state.scenes, ctx)
    }

    /// Run one iteration of the loop.
    pub fn iterate(&mut self) -> Result<Iteration> {
        let mut report = Iteration::default();

        self.touches.clear();
        if let Some(input) = self.input.as_mut() {
            if let Err(e) = input.poll(self.config.poll_timeout(), &mut self.touches) {
                error!("Touch input failed, continuing without it: {}", e);
                self.input = None;
            }
        }
        report.touches = self.touches.len();
        for touch in &self.touches {
            self.broker.publish(GfxEvent::Touch(*touch));
        }

        report.events = self.broker.process_events(&mut self.state);

        let before = self.state.scenes.active_id();
        let applied = {
            let (scenes, mut ctx) = self.split();
            scenes.apply_actions(&mut ctx)
        };
        self.reset_input_on_switch(before);
        applied?;
        self.state.scenes.update();

        if self.config.swap != SwapOp::Copy && self.state.scenes.is_dirty() {
            self.state.scenes.invalidate_all()?;
        }
        report.painted = self.state.scenes.render(&mut self.renderer)?;
        if report.painted > 0 {
            self.renderer.swap_buffer(self.config.swap, self.config.clear_color)?;
            self.frames += 1;
            report.presented = true;
        }
        Ok(report)
    }
}

/// Built-in first subscriber: touches go to the active scene, actions are
/// queued for the scene manager, Quit stops the loop.
fn dispatch_event(state: &mut EngineState, event: &GfxEvent) -> bool {
    match event {
        GfxEvent::Touch(touch) => match state.scenes.process_input(touch) {
            Ok(consumed) => consumed,
            Err(e) => {
                warn!("Touch not dispatched: {}", e);
                false
            }
        },
        GfxEvent::Action(action) => {
            state.scenes.queue_action(*action);
            true
        }
        GfxEvent::Quit => {
            debug!("Quit requested");
            state.running = false;
            true
        }
    }
}
