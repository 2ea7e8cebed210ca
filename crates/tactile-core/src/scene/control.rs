//! Control tree stored as an arena.
//!
//! Controls live in slots addressed by [`ControlId`], an index plus a
//! generation counter, so an id kept after its control was removed can never
//! reach whatever later reuses the slot. Parents hold child ids in z-order
//! (last child on top); children hold their parent's id.
//!
//! # Invalidation
//!
//! Each control has two flags. `dirty` means the control itself must be
//! repainted (and with it everything drawn on top of it, its subtree).
//! `subtree_dirty` means some descendant is dirty. [`ControlTree::invalidate`]
//! sets `dirty` on the control and `subtree_dirty` on every ancestor, so
//! [`ControlTree::render`] can walk down from the root and skip clean
//! branches. A control whose background is not opaque cannot repaint alone
//! without leaving stale pixels behind it, so the nearest opaque ancestor is
//! marked dirty as well.
//!
//! A repaint can cover later siblings that were drawn on top of it. Those
//! are painted again over the covered rectangle so z-order is preserved.

use alloc::vec::Vec;

use log::debug;

use super::Action;
use super::style::{ControlState, Style, Styles};
use super::widget::{Button, Image, Label, TextSize, Widget};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use crate::input::{Gesture, GestureThresholds, TouchEvent, TouchKind};
use crate::render::{Renderer, Texture};

/// Stable handle to a control in a [`ControlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId {
    index: u32,
    generation: u32,
}

impl ControlId {
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// What a control did with a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchOutcome {
    pub consumed: bool,
    /// The control's appearance changed and it needs repainting.
    pub changed: bool,
    pub action: Option<Action>,
}

impl TouchOutcome {
    const CONSUMED: TouchOutcome = TouchOutcome {
        consumed: true,
        changed: false,
        action: None,
    };
}

// ============================================================================
// Control
// ============================================================================

/// A node of the scene tree.
#[derive(Debug, Clone)]
pub struct Control {
    area: Rect,
    clip: Option<Rect>,
    dirty: bool,
    subtree_dirty: bool,
    touch_enabled: bool,
    visible: bool,
    parent: Option<ControlId>,
    children: Vec<ControlId>,
    state: ControlState,
    styles: Styles,
    widget: Widget,
}

impl Control {
    pub fn new(area: Rect, widget: Widget) -> Self {
        Self {
            area,
            clip: None,
            dirty: true,
            subtree_dirty: false,
            touch_enabled: false,
            visible: true,
            parent: None,
            children: Vec::new(),
            state: ControlState::Normal,
            styles: Styles::default(),
            widget,
        }
    }

    /// Plain container, optionally with a background.
    pub fn panel(area: Rect) -> Self {
        Self::new(area, Widget::Panel)
    }

    pub fn label(area: Rect, text: &str, size: TextSize) -> Self {
        Self::new(area, Widget::Label(Label::new(text, size)))
    }

    /// Touch-enabled button.
    pub fn button(area: Rect, button: Button) -> Self {
        Self::new(area, Widget::Button(button))
            .with_touch(true)
            .with_styles(Styles::interactive(
                Style::new().with_background(Color::rgb(0x2c, 0x5d, 0xa8)),
            ))
    }

    pub fn image(area: Rect, texture: Texture) -> Self {
        Self::new(area, Widget::Image(Image::new(texture)))
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.styles = Styles::uniform(style);
        self
    }

    pub fn with_styles(mut self, styles: Styles) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_touch(mut self, enabled: bool) -> Self {
        self.touch_enabled = enabled;
        self
    }

    /// Restrict the children's drawing to `clip` (screen coordinates)
    /// instead of this control's area.
    pub fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Rectangle the children are clipped to.
    pub fn clip(&self) -> Rect {
        self.clip.unwrap_or(self.area)
    }

    pub fn parent(&self) -> Option<ControlId> {
        self.parent
    }

    pub fn children(&self) -> &[ControlId] {
        &self.children
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn style(&self) -> &Style {
        self.styles.get(self.state)
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    /// Mutable widget access. Changes made here need an
    /// [`ControlTree::invalidate`] to show up; prefer [`ControlTree::update`].
    pub fn widget_mut(&mut self) -> &mut Widget {
        &mut self.widget
    }

    pub fn is_touch_enabled(&self) -> bool {
        self.touch_enabled
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether this control or anything below it needs repainting.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.subtree_dirty
    }

    fn content(&self) -> Rect {
        self.style().padding.apply(self.area)
    }

    fn paint<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        if self.widget.needs_refresh() {
            let content = self.content();
            self.widget.refresh(content);
        }
        let style = self.styles.get(self.state);
        renderer.fill_rect(self.area, style.background);
        let origin = self.area.origin();
        for texture in &style.textures {
            if let Err(e) = renderer.draw_texture(&texture.translated(origin)) {
                debug!("Style texture not drawn: {}", e);
            }
        }
        if !style.border.is_none() {
            renderer.draw_rectangle(self.area, style.border, false);
        }
        let content = style.padding.apply(self.area);
        self.widget.paint(content, style, renderer);
    }

    pub(crate) fn handle_touch(&mut self, event: &TouchEvent, thresholds: &GestureThresholds) -> TouchOutcome {
        let Widget::Button(button) = &self.widget else {
            // Touch-enabled panels, labels and images swallow input so that
            // nothing behind them reacts.
            return TouchOutcome::CONSUMED;
        };
        if self.state == ControlState::Disabled {
            return TouchOutcome::CONSUMED;
        }

        let previous = self.state;
        let mut action = None;
        match event.kind {
            TouchKind::Press => self.state = ControlState::Pressed,
            TouchKind::Drag => {
                self.state = if self.area.contains(event.point) {
                    ControlState::Pressed
                } else {
                    ControlState::Normal
                };
            }
            TouchKind::Lift => {
                if previous == ControlState::Pressed && self.area.contains(event.point) {
                    action = match event.gesture(thresholds) {
                        Some(Gesture::LongPress) => button.on_long_press(),
                        _ => button.on_tap(),
                    };
                }
                self.state = ControlState::Normal;
            }
        }
        TouchOutcome {
            consumed: true,
            changed: previous != self.state,
            action,
        }
    }
}

// ============================================================================
// ControlTree
// ============================================================================

#[derive(Debug)]
struct Slot {
    generation: u32,
    control: Option<Control>,
}

/// Arena owning every control of a scene.
#[derive(Debug, Default)]
pub struct ControlTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl ControlTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.control.as_ref())
    }

    pub fn get_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.control.as_mut())
    }

    fn control(&self, id: ControlId) -> Result<&Control> {
        self.get(id).ok_or(Error::ControlNotFound { index: id.index })
    }

    fn control_mut(&mut self, id: ControlId) -> Result<&mut Control> {
        self.get_mut(id).ok_or(Error::ControlNotFound { index: id.index })
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.get(id).is_some()
    }

    /// Insert a control without a parent.
    pub fn add_root(&mut self, control: Control) -> ControlId {
        let control = Control {
            parent: None,
            children: Vec::new(),
            ..control
        };
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.control = Some(control);
                ControlId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    control: Some(control),
                });
                ControlId {
                    index: self.slots.len() as u32 - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Insert `control` as the topmost child of `parent`.
    pub fn add(&mut self, parent: ControlId, control: Control) -> Result<ControlId> {
        self.control(parent)?;
        let id = self.add_root(control);
        if let Some(child) = self.get_mut(id) {
            child.parent = Some(parent);
        }
        self.control_mut(parent)?.children.push(id);
        self.invalidate(id)?;
        Ok(id)
    }

    /// Remove `id` and its whole subtree, children first. Returns the ids
    /// that were released.
    pub fn remove(&mut self, id: ControlId) -> Result<Vec<ControlId>> {
        let parent = self.control(id)?.parent;
        if let Some(parent) = parent {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
            // Uncover whatever the removed control was drawn over.
            self.invalidate(parent)?;
        }

        let mut released = Vec::new();
        self.release(id, &mut released);
        Ok(released)
    }

    fn release(&mut self, id: ControlId, released: &mut Vec<ControlId>) {
        let children = match self.get(id) {
            Some(control) => control.children.clone(),
            None => return,
        };
        for child in children {
            self.release(child, released);
        }
        let slot = &mut self.slots[id.index as usize];
        slot.control = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        released.push(id);
    }

    /// Ids of `id` and all its descendants, parents before children.
    pub fn descendants(&self, id: ControlId) -> Vec<ControlId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(next) = stack.pop() {
            if let Some(control) = self.get(next) {
                out.push(next);
                stack.extend(control.children.iter().rev());
            }
        }
        out
    }

    /// Mark `id` for repainting and flag the path up to the root.
    pub fn invalidate(&mut self, id: ControlId) -> Result<()> {
        let mut target = id;
        loop {
            let control = self.control(target)?;
            match control.parent {
                Some(parent) if !control.style().is_opaque() => target = parent,
                _ => break,
            }
        }
        self.control_mut(id)?.dirty = true;
        self.control_mut(target)?.dirty = true;

        let mut cursor = self.control(id)?.parent;
        while let Some(ancestor) = cursor {
            let control = self.control_mut(ancestor)?;
            if control.subtree_dirty {
                // Everything above is already flagged.
                break;
            }
            control.subtree_dirty = true;
            cursor = control.parent;
        }
        Ok(())
    }

    pub fn is_dirty(&self, id: ControlId) -> bool {
        self.get(id).is_some_and(Control::is_dirty)
    }

    /// Apply `f` to a control and invalidate it.
    pub fn update<F>(&mut self, id: ControlId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Control),
    {
        f(self.control_mut(id)?);
        self.invalidate(id)
    }

    /// Move or resize a control. The parent repaints to cover the old area.
    pub fn set_area(&mut self, id: ControlId, area: Rect) -> Result<()> {
        let control = self.control_mut(id)?;
        if control.area == area {
            return Ok(());
        }
        control.area = area;
        control.widget.mark_stale();
        if let Some(parent) = control.parent {
            self.invalidate(parent)?;
        }
        self.invalidate(id)
    }

    pub fn set_clip(&mut self, id: ControlId, clip: Option<Rect>) -> Result<()> {
        let control = self.control_mut(id)?;
        if control.clip != clip {
            control.clip = clip;
            self.invalidate(id)?;
        }
        Ok(())
    }

    pub fn set_state(&mut self, id: ControlId, state: ControlState) -> Result<()> {
        let control = self.control_mut(id)?;
        if control.state != state {
            control.state = state;
            self.invalidate(id)?;
        }
        Ok(())
    }

    pub fn set_visible(&mut self, id: ControlId, visible: bool) -> Result<()> {
        let control = self.control_mut(id)?;
        if control.visible == visible {
            return Ok(());
        }
        control.visible = visible;
        let parent = control.parent;
        match parent {
            Some(parent) => self.invalidate(parent),
            None => self.invalidate(id),
        }
    }

    pub fn set_touch_enabled(&mut self, id: ControlId, enabled: bool) -> Result<()> {
        self.control_mut(id)?.touch_enabled = enabled;
        Ok(())
    }

    /// Replace the text of a label, or the caption of a button.
    pub fn set_text(&mut self, id: ControlId, text: &str) -> Result<()> {
        let changed = match &mut self.control_mut(id)?.widget {
            Widget::Label(label) => label.set_text(text),
            Widget::Button(button) => button.set_caption(text),
            Widget::Panel | Widget::Image(_) => false,
        };
        if changed {
            self.invalidate(id)?;
        }
        Ok(())
    }

    /// Repaint the dirty parts of the tree below `root`.
    ///
    /// Returns the number of controls painted. All flags on the visited path
    /// are cleared, so an immediate second call paints nothing.
    pub fn render<R: Renderer + ?Sized>(&mut self, root: ControlId, renderer: &mut R) -> usize {
        let screen = Rect::screen(renderer.size());
        let mut damage = Rect::EMPTY;
        let painted = self.render_node(root, screen, false, renderer, &mut damage);
        renderer.reset_clip();
        if painted > 0 {
            debug!("Painted {} controls", painted);
        }
        painted
    }

    fn render_node<R: Renderer + ?Sized>(
        &mut self,
        id: ControlId,
        inherited: Rect,
        force: bool,
        renderer: &mut R,
        damage: &mut Rect,
    ) -> usize {
        let Some(control) = self.get_mut(id) else {
            return 0;
        };
        if !force && !control.dirty && !control.subtree_dirty {
            return 0;
        }
        let repaint = force || control.dirty;
        control.dirty = false;
        control.subtree_dirty = false;
        if !control.visible {
            return 0;
        }

        let mut painted = 0;
        let paint_area = inherited & control.area;
        if repaint && !paint_area.is_empty() {
            renderer.set_clip(paint_area);
            control.paint(renderer);
            painted += 1;
            *damage = damage.union(&paint_area);
        }

        let child_clip = inherited & control.clip();
        let children = control.children.clone();
        // Area repainted by the children visited so far.
        let mut covered = Rect::EMPTY;
        for child in children {
            if !repaint {
                let overlap = covered & child_clip;
                let stale = self
                    .get(child)
                    .is_some_and(|c| !c.dirty && !(overlap & c.area.union(&c.clip())).is_empty());
                if stale {
                    painted += self.repaint_over(child, overlap, renderer);
                }
            }
            painted += self.render_node(child, child_clip, repaint, renderer, &mut covered);
        }
        *damage = damage.union(&covered);
        painted
    }

    /// Paint `id` and its subtree inside `region` only, leaving flags alone.
    fn repaint_over<R: Renderer + ?Sized>(&mut self, id: ControlId, region: Rect, renderer: &mut R) -> usize {
        let Some(control) = self.get_mut(id) else {
            return 0;
        };
        if !control.visible {
            return 0;
        }
        let mut painted = 0;
        let area = region & control.area;
        if !area.is_empty() {
            renderer.set_clip(area);
            control.paint(renderer);
            painted += 1;
        }
        let child_region = region & control.clip();
        if child_region.is_empty() {
            return painted;
        }
        for child in control.children.clone() {
            painted += self.repaint_over(child, child_region, renderer);
        }
        painted
    }

    /// Topmost visible control under `point` accepted by `filter`, searching
    /// children before their parent and later siblings before earlier ones.
    pub fn hit_test<F>(&self, root: ControlId, point: Point, filter: F) -> Option<ControlId>
    where
        F: Fn(ControlId, &Control) -> bool,
    {
        self.hits(root, point, &filter).into_iter().next()
    }

    /// Every control under `point` accepted by `filter`, front to back.
    pub fn hits<F>(&self, root: ControlId, point: Point, filter: &F) -> Vec<ControlId>
    where
        F: Fn(ControlId, &Control) -> bool,
    {
        let mut out = Vec::new();
        let screen = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        self.collect_hits(root, point, screen, filter, &mut out);
        out
    }

    fn collect_hits<F>(&self, id: ControlId, point: Point, inherited: Rect, filter: &F, out: &mut Vec<ControlId>)
    where
        F: Fn(ControlId, &Control) -> bool,
    {
        let Some(control) = self.get(id) else {
            return;
        };
        if !control.visible || !inherited.contains(point) {
            return;
        }
        let child_clip = inherited & control.clip();
        for child in control.children.iter().rev() {
            self.collect_hits(*child, point, child_clip, filter, out);
        }
        if control.area.contains(point) && filter(id, control) {
            out.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::render::SoftwareRenderer;

    fn opaque(area: Rect, color: Color) -> Control {
        Control::panel(area).with_style(Style::new().with_background(color))
    }

    /// root (opaque) > middle (opaque) > leaf (opaque)
    fn chain() -> (ControlTree, ControlId, ControlId, ControlId) {
        let mut tree = ControlTree::new();
        let root = tree.add_root(opaque(Rect::new(0, 0, 32, 32), Color::BLACK));
        let middle = tree.add(root, opaque(Rect::new(4, 4, 28, 28), Color::BLUE)).unwrap();
        let leaf = tree.add(middle, opaque(Rect::new(8, 8, 12, 12), Color::RED)).unwrap();
        (tree, root, middle, leaf)
    }

    #[test]
    fn test_leaf_invalidation_marks_ancestors() {
        let (mut tree, root, middle, leaf) = chain();
        let mut r = SoftwareRenderer::new(Size::new(32, 32));
        assert_eq!(tree.render(root, &mut r), 3);
        assert!(!tree.is_dirty(root));

        tree.invalidate(leaf).unwrap();
        assert!(tree.is_dirty(leaf));
        assert!(tree.is_dirty(middle));
        assert!(tree.is_dirty(root));

        assert_eq!(tree.render(root, &mut r), 1);
        for id in [root, middle, leaf] {
            assert!(!tree.is_dirty(id));
        }
        assert_eq!(tree.render(root, &mut r), 0);
    }

    #[test]
    fn test_transparent_control_repaints_parent() {
        let (mut tree, root, middle, _) = chain();
        let label = tree
            .add(middle, Control::label(Rect::new(4, 20, 28, 28), "hi", TextSize::Small))
            .unwrap();
        let mut r = SoftwareRenderer::new(Size::new(32, 32));
        tree.render(root, &mut r);

        tree.set_text(label, "ho").unwrap();
        // middle and both of its children.
        assert_eq!(tree.render(root, &mut r), 3);
    }

    #[test]
    fn test_children_are_clipped_to_parent() {
        let mut tree = ControlTree::new();
        let root = tree.add_root(opaque(Rect::new(0, 0, 16, 16), Color::BLACK));
        let panel = tree.add(root, opaque(Rect::new(0, 0, 8, 8), Color::BLUE)).unwrap();
        tree.add(panel, opaque(Rect::new(4, 4, 12, 12), Color::RED)).unwrap();

        let mut r = SoftwareRenderer::new(Size::new(16, 16));
        tree.render(root, &mut r);
        assert_eq!(r.get_pixel(Point::new(6, 6)), Color::RED);
        assert_eq!(r.get_pixel(Point::new(10, 10)), Color::BLACK);
        assert_eq!(r.get_pixel(Point::new(2, 2)), Color::BLUE);
    }

    #[test]
    fn test_repaint_keeps_overlapping_sibling_on_top() {
        let mut tree = ControlTree::new();
        let root = tree.add_root(opaque(Rect::new(0, 0, 16, 16), Color::BLACK));
        let below = tree.add(root, opaque(Rect::new(0, 0, 10, 10), Color::RED)).unwrap();
        tree.add(root, opaque(Rect::new(5, 5, 15, 15), Color::BLUE)).unwrap();
        let aside = tree.add(root, opaque(Rect::new(12, 0, 16, 4), Color::GREEN)).unwrap();

        let mut r = SoftwareRenderer::new(Size::new(16, 16));
        tree.render(root, &mut r);
        tree.invalidate(below).unwrap();
        // `below`, then the covered part of the blue sibling; `aside` is untouched.
        assert_eq!(tree.render(root, &mut r), 2);
        assert_eq!(r.get_pixel(Point::new(6, 6)), Color::BLUE);
        assert_eq!(r.get_pixel(Point::new(2, 2)), Color::RED);
        assert!(!tree.is_dirty(aside));
        assert_eq!(tree.render(root, &mut r), 0);
    }

    #[test]
    fn test_remove_releases_subtree_and_stale_ids() {
        let (mut tree, root, middle, leaf) = chain();
        let released = tree.remove(middle).unwrap();
        assert_eq!(released, [leaf, middle]);
        assert_eq!(tree.len(), 1);
        assert!(tree.get(leaf).is_none());
        assert!(tree.get(root).unwrap().children().is_empty());

        // The freed slot is reused under a new generation.
        let fresh = tree.add(root, Control::panel(Rect::new(0, 0, 1, 1))).unwrap();
        assert!(tree.get(middle).is_none() && tree.get(leaf).is_none());
        assert!(tree.get(fresh).is_some());
        assert_eq!(
            tree.invalidate(middle),
            Err(Error::ControlNotFound { index: middle.index() })
        );
    }

    #[test]
    fn test_hit_test_is_front_to_back() {
        let mut tree = ControlTree::new();
        let root = tree.add_root(opaque(Rect::new(0, 0, 20, 20), Color::BLACK));
        let back = tree
            .add(root, Control::panel(Rect::new(0, 0, 10, 10)).with_touch(true))
            .unwrap();
        let front = tree
            .add(root, Control::panel(Rect::new(5, 5, 15, 15)).with_touch(true))
            .unwrap();
        let touchable = |_: ControlId, c: &Control| c.is_touch_enabled();

        assert_eq!(tree.hit_test(root, Point::new(6, 6), touchable), Some(front));
        assert_eq!(tree.hit_test(root, Point::new(2, 2), touchable), Some(back));
        assert_eq!(tree.hit_test(root, Point::new(18, 2), touchable), None);

        tree.set_visible(front, false).unwrap();
        assert_eq!(tree.hit_test(root, Point::new(6, 6), touchable), Some(back));
    }
}
