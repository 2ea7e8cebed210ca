use alloc::vec::Vec;

use log::debug;

use super::control::{Control, ControlId, ControlTree, TouchOutcome};
use super::style::Style;
use crate::color::Color;
use crate::error::Result;
use crate::geometry::Rect;
use crate::input::{GestureThresholds, TouchEvent, TouchKind};
use crate::render::Renderer;

/// Control tree of one scene plus its touch routing state.
///
/// Touch dispatch is exclusive and captured: a Press goes to the frontmost
/// touch-enabled control under the finger that consumes it, and that control
/// then receives the rest of the gesture wherever the finger moves.
#[derive(Debug)]
pub struct SceneGraph {
    tree: ControlTree,
    root: ControlId,
    touch_targets: Vec<ControlId>,
    captured: Option<ControlId>,
    thresholds: GestureThresholds,
}

impl SceneGraph {
    /// Graph whose root fills `screen` with `background`.
    pub fn new(screen: Rect, background: Color) -> Self {
        let mut tree = ControlTree::new();
        let root = tree.add_root(Control::panel(screen).with_style(Style::new().with_background(background)));
        Self {
            tree,
            root,
            touch_targets: Vec::new(),
            captured: None,
            thresholds: GestureThresholds::default(),
        }
    }

    pub fn root(&self) -> ControlId {
        self.root
    }

    pub fn tree(&self) -> &ControlTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ControlTree {
        &mut self.tree
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: GestureThresholds) {
        self.thresholds = thresholds;
    }

    /// Touch-enabled controls, in registration order.
    pub fn touch_targets(&self) -> &[ControlId] {
        &self.touch_targets
    }

    pub fn captured(&self) -> Option<ControlId> {
        self.captured
    }

    /// Add `control` under `parent`, registering it for touch if enabled.
    pub fn add(&mut self, parent: ControlId, control: Control) -> Result<ControlId> {
        let touch = control.is_touch_enabled();
        let id = self.tree.add(parent, control)?;
        if touch {
            self.touch_targets.push(id);
        }
        Ok(id)
    }

    /// Remove a control and its subtree. Removing the root clears the scene
    /// but keeps the root itself.
    pub fn remove(&mut self, id: ControlId) -> Result<()> {
        if id == self.root {
            let children = self
                .tree
                .get(self.root)
                .map(|root| root.children().to_vec())
                .unwrap_or_default();
            for child in children {
                self.remove(child)?;
            }
            return Ok(());
        }
        let released = self.tree.remove(id)?;
        self.touch_targets.retain(|t| !released.contains(t));
        if self.captured.is_some_and(|c| released.contains(&c)) {
            self.captured = None;
        }
        Ok(())
    }

    pub fn set_touch_enabled(&mut self, id: ControlId, enabled: bool) -> Result<()> {
        self.tree.set_touch_enabled(id, enabled)?;
        self.touch_targets.retain(|t| *t != id);
        if enabled {
            self.touch_targets.push(id);
        }
        Ok(())
    }

    /// Forget the control holding the current gesture.
    pub fn release_capture(&mut self) {
        self.captured = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.tree.is_dirty(self.root)
    }

    /// Force a full repaint on the next render.
    pub fn invalidate_all(&mut self) -> Result<()> {
        self.tree.invalidate(self.root)
    }

    pub fn render<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> usize {
        self.tree.render(self.root, renderer)
    }

    /// Route one touch event. At most one control sees it.
    pub fn process_input(&mut self, event: &TouchEvent) -> Result<TouchOutcome> {
        let outcome = match event.kind {
            TouchKind::Press => {
                self.captured = None;
                let targets = &self.touch_targets;
                let candidates = self.tree.hits(self.root, event.point, &|id, control: &Control| {
                    control.is_touch_enabled() && targets.contains(&id)
                });
                let mut outcome = TouchOutcome::default();
                for id in candidates {
                    outcome = self.deliver(id, event)?;
                    if outcome.consumed {
                        debug!("Control {} captured the touch", id.index());
                        self.captured = Some(id);
                        break;
                    }
                }
                outcome
            }
            TouchKind::Drag => match self.captured {
                Some(id) => self.deliver(id, event)?,
                None => TouchOutcome::default(),
            },
            TouchKind::Lift => match self.captured.take() {
                Some(id) => self.deliver(id, event)?,
                None => TouchOutcome::default(),
            },
        };
        Ok(outcome)
    }

    fn deliver(&mut self, id: ControlId, event: &TouchEvent) -> Result<TouchOutcome> {
        let thresholds = self.thresholds;
        let Some(control) = self.tree.get_mut(id) else {
            return Ok(TouchOutcome::default());
        };
        let outcome = control.handle_touch(event, &thresholds);
        if outcome.changed {
            self.tree.invalidate(id)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::render::SoftwareRenderer;
    use crate::scene::style::ControlState;
    use crate::scene::widget::Button;
    use crate::scene::Action;
    use core::time::Duration;

    fn touch(kind: TouchKind, ms: u64, x: i32, y: i32) -> TouchEvent {
        TouchEvent {
            timestamp: Duration::from_millis(ms),
            kind,
            point: Point::new(x, y),
            press_point: Point::new(10, 10),
            press_time: Duration::ZERO,
        }
    }

    fn graph_with_button() -> (SceneGraph, ControlId) {
        let mut graph = SceneGraph::new(Rect::new(0, 0, 64, 64), Color::BLACK);
        let root = graph.root();
        let button = graph
            .add(
                root,
                Control::button(Rect::new(0, 0, 32, 32), Button::new("Go", Some(Action::Custom(1))))
            )
            .unwrap();
        (graph, button)
    }

    #[test]
    fn test_tap_fires_action_and_repaints() {
        let (mut graph, button) = graph_with_button();
        let mut r = SoftwareRenderer::new(Size::new(64, 64));
        graph.render(&mut r);

        let press = graph.process_input(&touch(TouchKind::Press, 0, 10, 10)).unwrap();
        assert!(press.consumed && press.action.is_none());
        assert_eq!(graph.captured(), Some(button));
        assert_eq!(graph.tree().get(button).unwrap().state(), ControlState::Pressed);
        assert!(graph.is_dirty());
        assert_eq!(graph.render(&mut r), 1);

        let lift = graph.process_input(&touch(TouchKind::Lift, 50, 12, 11)).unwrap();
        assert_eq!(lift.action, Some(Action::Custom(1)));
        assert_eq!(graph.captured(), None);
    }

    #[test]
    fn test_drag_off_cancels() {
        let (mut graph, button) = graph_with_button();
        graph.process_input(&touch(TouchKind::Press, 0, 10, 10)).unwrap();
        graph.process_input(&touch(TouchKind::Drag, 10, 50, 50)).unwrap();
        assert_eq!(graph.tree().get(button).unwrap().state(), ControlState::Normal);
        let lift = graph.process_input(&touch(TouchKind::Lift, 20, 50, 50)).unwrap();
        assert!(lift.consumed);
        assert_eq!(lift.action, None);
    }

    #[test]
    fn test_press_outside_targets_is_ignored() {
        let (mut graph, _) = graph_with_button();
        let outcome = graph.process_input(&touch(TouchKind::Press, 0, 40, 40)).unwrap();
        assert!(!outcome.consumed);
        let lift = graph.process_input(&touch(TouchKind::Lift, 5, 10, 10)).unwrap();
        assert!(!lift.consumed);
    }

    #[test]
    fn test_removing_captured_control_releases_capture() {
        let (mut graph, button) = graph_with_button();
        graph.process_input(&touch(TouchKind::Press, 0, 10, 10)).unwrap();
        graph.remove(button).unwrap();
        assert_eq!(graph.captured(), None);
        assert!(graph.touch_targets().is_empty());
    }
}
