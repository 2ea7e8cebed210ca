//! Scene lifecycle and navigation.
//!
//! Exactly one scene is active at a time. Scenes are built on demand from
//! registered factories and dropped when replaced; a switch runs
//!
//! 1. `AboutToDestroy` observers, then `deinit` on the old scene, then drop;
//! 2. factory, `init` on the new scene, then `Created` observers.
//!
//! Asking for an unregistered id fails before step 1, so the current scene is
//! left exactly as it was.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

use log::{debug, info, warn};

use super::{Action, SceneGraph, SceneId};
use crate::cache::AssetCache;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::input::{GestureThresholds, Publisher, TouchEvent, TouchKind};
use crate::pixel_data::CompressedResource;
use crate::render::{Renderer, TextureFactory};

/// Depth of the back-navigation history.
pub const HISTORY_DEPTH: usize = 8;

/// Engine services handed to scenes while they are built and torn down.
pub struct SceneContext<'a> {
    pub cache: &'a mut AssetCache,
    pub textures: &'a mut dyn TextureFactory,
    pub screen: Rect,
    /// Compiled-in asset table.
    pub assets: &'static [CompressedResource],
    pub thresholds: GestureThresholds,
    /// Queue of the engine's event broker.
    pub events: Publisher,
}

/// A screen of the application.
///
/// Lifecycle: constructed by its factory, `init` once, any number of
/// `update`/render/input rounds, `deinit` once, dropped.
pub trait Scene {
    fn id(&self) -> SceneId;

    /// Build controls and load assets.
    fn init(&mut self, ctx: &mut SceneContext<'_>) -> Result<()>;

    /// Called before the scene is dropped, possibly in the middle of a
    /// gesture.
    fn deinit(&mut self) {}

    /// Advance per-iteration state.
    fn update(&mut self) {}

    fn graph(&self) -> &SceneGraph;

    fn graph_mut(&mut self) -> &mut SceneGraph;

    /// React to an action emitted by a control. Return `true` to stop the
    /// manager from handling it (navigation actions included).
    fn on_action(&mut self, _action: &Action, _ctx: &mut SceneContext<'_>) -> Result<bool> {
        Ok(false)
    }
}

/// Builds a scene for a screen rectangle.
pub type SceneFactory = Box<dyn Fn(Rect) -> Box<dyn Scene>>;

/// Scene lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    Created(SceneId),
    AboutToDestroy(SceneId),
}

type Observer = Box<dyn FnMut(SceneEvent)>;

#[derive(Default)]
pub struct SceneManager {
    factories: BTreeMap<SceneId, SceneFactory>,
    active: Option<Box<dyn Scene>>,
    history: heapless::Vec<SceneId, HISTORY_DEPTH>,
    observers: Vec<Observer>,
    pending: VecDeque<Action>,
    /// Set on a switch; touch events are dropped until the next Press.
    awaiting_press: bool,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `id`, replacing any previous one.
    pub fn register<F>(&mut self, id: SceneId, factory: F)
    where
        F: Fn(Rect) -> Box<dyn Scene> + 'static,
    {
        self.factories.insert(id, Box::new(factory));
    }

    pub fn is_registered(&self, id: SceneId) -> bool {
        self.factories.contains_key(&id)
    }

    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(SceneEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn active_id(&self) -> Option<SceneId> {
        self.active.as_ref().map(|scene| scene.id())
    }

    pub fn active(&self) -> Option<&dyn Scene> {
        self.active.as_deref()
    }

    pub fn active_mut(&mut self) -> Option<&mut (dyn Scene + 'static)> {
        self.active.as_deref_mut()
    }

    pub fn history(&self) -> &[SceneId] {
        &self.history
    }

    /// Activate scene `id`. Does nothing if it is already active.
    pub fn set_active_scene(&mut self, id: SceneId, ctx: &mut SceneContext<'_>) -> Result<()> {
        if self.active_id() == Some(id) {
            return Ok(());
        }
        self.switch_to(id, ctx, true)
    }

    fn remember(&mut self, id: SceneId) {
        if self.history.is_full() {
            self.history.remove(0);
        }
        self.history.push(id).ok();
    }

    /// Return to the previously active scene. Returns `false` when the
    /// history is empty.
    pub fn go_back(&mut self, ctx: &mut SceneContext<'_>) -> Result<bool> {
        let Some(id) = self.history.pop() else {
            return Ok(false);
        };
        if let Err(e) = self.switch_to(id, ctx, false) {
            if matches!(e, Error::SceneNotFound { .. }) {
                self.history.push(id).ok();
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Replace the active scene, pushing the replaced one to the history when
    /// `remember` is set.
    ///
    /// If the new scene's `init` fails the manager is left without an active
    /// scene. The replaced scene is then always pushed, so `go_back` can
    /// restore it.
    fn switch_to(&mut self, id: SceneId, ctx: &mut SceneContext<'_>, remember: bool) -> Result<()> {
        let factory = self.factories.get(&id).ok_or(Error::SceneNotFound { id })?;

        let previous = match self.active.take() {
            Some(mut old) => {
                let old_id = old.id();
                notify(&mut self.observers, SceneEvent::AboutToDestroy(old_id));
                old.deinit();
                debug!("Scene {} deinitialized", old_id);
                Some(old_id)
            }
            None => None,
        };

        let mut scene = factory(ctx.screen);
        scene.graph_mut().set_thresholds(ctx.thresholds);
        let init = scene.init(ctx);
        if let Some(previous) = previous {
            if remember || init.is_err() {
                self.remember(previous);
            }
        }
        self.awaiting_press = true;
        self.pending.clear();
        if let Err(e) = init {
            warn!("Scene {} failed to initialize: {}", id, e);
            return Err(e);
        }
        notify(&mut self.observers, SceneEvent::Created(id));
        self.active = Some(scene);
        info!("Scene {} active", id);
        Ok(())
    }

    /// Route a touch event into the active scene. Returns whether a control
    /// consumed it.
    pub fn process_input(&mut self, event: &TouchEvent) -> Result<bool> {
        let scene = self.active.as_mut().ok_or(Error::ActiveSceneNotSet)?;
        if self.awaiting_press {
            if event.kind != TouchKind::Press {
                debug!("Dropping {:?} of a gesture started before the scene switch", event.kind);
                return Ok(false);
            }
            self.awaiting_press = false;
        }
        let outcome = scene.graph_mut().process_input(event)?;
        if let Some(action) = outcome.action {
            self.pending.push_back(action);
        }
        Ok(outcome.consumed)
    }

    /// Queue an action for [`SceneManager::apply_actions`].
    pub fn queue_action(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    pub fn pending_actions(&self) -> usize {
        self.pending.len()
    }

    /// Handle queued actions: the active scene sees each first, navigation
    /// actions it leaves alone are applied here.
    pub fn apply_actions(&mut self, ctx: &mut SceneContext<'_>) -> Result<()> {
        while let Some(action) = self.pending.pop_front() {
            if let Some(scene) = self.active.as_mut() {
                if scene.on_action(&action, ctx)? {
                    continue;
                }
            }
            match action {
                Action::SetActiveScene(id) => self.set_active_scene(id, ctx)?,
                Action::GoBack => {
                    self.go_back(ctx)?;
                }
                Action::Custom(code) => debug!("Unhandled custom action {}", code),
            }
        }
        Ok(())
    }

    pub fn update(&mut self) {
        if let Some(scene) = self.active.as_mut() {
            scene.update();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.active.as_ref().is_some_and(|scene| scene.graph().is_dirty())
    }

    /// Mark the whole active scene for repainting.
    pub fn invalidate_all(&mut self) -> Result<()> {
        let scene = self.active.as_mut().ok_or(Error::ActiveSceneNotSet)?;
        scene.graph_mut().invalidate_all()
    }

    /// Repaint the dirty controls of the active scene.
    pub fn render<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> Result<usize> {
        let scene = self.active.as_mut().ok_or(Error::ActiveSceneNotSet)?;
        Ok(scene.graph_mut().render(renderer))
    }
}

fn notify(observers: &mut [Observer], event: SceneEvent) {
    for observer in observers.iter_mut() {
        observer(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::{Point, Size};
    use crate::render::SoftwareRenderer;
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use core::time::Duration;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    struct Probe {
        id: SceneId,
        graph: SceneGraph,
        log: Log,
        fail: bool,
    }

    impl Scene for Probe {
        fn id(&self) -> SceneId {
            self.id
        }

        fn init(&mut self, _ctx: &mut SceneContext<'_>) -> Result<()> {
            self.log.borrow_mut().push("init");
            if self.fail {
                return Err(Error::AssetNotFound { id: 99 });
            }
            Ok(())
        }

        fn deinit(&mut self) {
            self.log.borrow_mut().push("deinit");
        }

        fn graph(&self) -> &SceneGraph {
            &self.graph
        }

        fn graph_mut(&mut self) -> &mut SceneGraph {
            &mut self.graph
        }
    }

    fn manager(log: &Log) -> SceneManager {
        let mut manager = SceneManager::new();
        for id in [1, 2] {
            let log = Rc::clone(log);
            manager.register(id, move |screen| {
                Box::new(Probe {
                    id,
                    graph: SceneGraph::new(screen, Color::BLACK),
                    log: Rc::clone(&log),
                    fail: false,
                })
            });
        }
        manager
    }

    fn with_ctx<T>(f: impl FnOnce(&mut SceneContext<'_>) -> T) -> T {
        let mut cache = AssetCache::new();
        let mut renderer = SoftwareRenderer::new(Size::new(16, 16));
        let mut ctx = SceneContext {
            cache: &mut cache,
            textures: &mut renderer,
            screen: Rect::new(0, 0, 16, 16),
            assets: &[],
            thresholds: GestureThresholds::default(),
            events: Publisher::default(),
        };
        f(&mut ctx)
    }

    #[test]
    fn test_set_active_scene_twice_is_noop() {
        let log = Log::default();
        let mut manager = manager(&log);
        with_ctx(|ctx| {
            manager.set_active_scene(1, ctx).unwrap();
            manager.set_active_scene(1, ctx).unwrap();
        });
        assert_eq!(*log.borrow(), ["init"]);
        assert_eq!(manager.active_id(), Some(1));
    }

    #[test]
    fn test_unknown_scene_leaves_current_untouched() {
        let log = Log::default();
        let mut manager = manager(&log);
        with_ctx(|ctx| {
            manager.set_active_scene(1, ctx).unwrap();
            assert_eq!(manager.set_active_scene(9, ctx), Err(Error::SceneNotFound { id: 9 }));
        });
        assert_eq!(*log.borrow(), ["init"]);
        assert_eq!(manager.active_id(), Some(1));
    }

    #[test]
    fn test_switch_order_and_observers() {
        let log = Log::default();
        let mut manager = manager(&log);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        manager.add_observer(move |event| sink.borrow_mut().push(event));

        with_ctx(|ctx| {
            manager.set_active_scene(1, ctx).unwrap();
            manager.set_active_scene(2, ctx).unwrap();
            assert!(manager.go_back(ctx).unwrap());
            assert!(!manager.go_back(ctx).unwrap());
        });
        assert_eq!(*log.borrow(), ["init", "deinit", "init", "deinit", "init"]);
        assert_eq!(
            *seen.borrow(),
            [
                SceneEvent::Created(1),
                SceneEvent::AboutToDestroy(1),
                SceneEvent::Created(2),
                SceneEvent::AboutToDestroy(2),
                SceneEvent::Created(1),
            ]
        );
        assert_eq!(manager.active_id(), Some(1));
    }

    #[test]
    fn test_failed_init_leaves_a_way_back() {
        let log = Log::default();
        let mut manager = manager(&log);
        let failing_log = Rc::clone(&log);
        manager.register(3, move |screen| {
            Box::new(Probe {
                id: 3,
                graph: SceneGraph::new(screen, Color::BLACK),
                log: Rc::clone(&failing_log),
                fail: true,
            })
        });

        with_ctx(|ctx| {
            manager.set_active_scene(1, ctx).unwrap();
            assert_eq!(manager.set_active_scene(3, ctx), Err(Error::AssetNotFound { id: 99 }));
            assert_eq!(manager.active_id(), None);
            assert_eq!(manager.history(), &[1]);
            assert!(manager.go_back(ctx).unwrap());
        });
        assert_eq!(manager.active_id(), Some(1));
        assert_eq!(*log.borrow(), ["init", "deinit", "init", "init"]);
    }

    #[test]
    fn test_no_active_scene() {
        let mut manager = SceneManager::new();
        let mut r = SoftwareRenderer::new(Size::new(4, 4));
        assert_eq!(manager.render(&mut r), Err(Error::ActiveSceneNotSet));
        let press = TouchEvent::press(Duration::ZERO, Point::zero());
        assert_eq!(manager.process_input(&press), Err(Error::ActiveSceneNotSet));
    }

    #[test]
    fn test_gesture_interrupted_by_switch_is_dropped() {
        let log = Log::default();
        let mut manager = manager(&log);
        with_ctx(|ctx| manager.set_active_scene(1, ctx).unwrap());

        let mut drag = TouchEvent::press(Duration::ZERO, Point::new(1, 1));
        drag.kind = TouchKind::Drag;
        assert_eq!(manager.process_input(&drag), Ok(false));
        assert!(manager.awaiting_press);

        let press = TouchEvent::press(Duration::ZERO, Point::new(1, 1));
        manager.process_input(&press).unwrap();
        assert!(!manager.awaiting_press);
    }

    #[test]
    fn test_actions_navigate() {
        let log = Log::default();
        let mut manager = manager(&log);
        with_ctx(|ctx| {
            manager.set_active_scene(1, ctx).unwrap();
            manager.queue_action(Action::SetActiveScene(2));
            manager.queue_action(Action::Custom(3));
            manager.apply_actions(ctx).unwrap();
            assert_eq!(manager.active_id(), Some(2));

            manager.queue_action(Action::GoBack);
            manager.apply_actions(ctx).unwrap();
        });
        assert_eq!(manager.active_id(), Some(1));
        assert_eq!(manager.history(), &[] as &[SceneId]);
    }
}
