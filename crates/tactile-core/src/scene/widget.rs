//! Widget payloads carried by controls.
//!
//! Derived layout (label line breaks, image placement) is recomputed lazily:
//! setters only flag it stale, and [`Widget::refresh`] rebuilds it during the
//! next render of the control. Several updates between two frames cost a
//! single layout pass.

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_6X10, FONT_10X20};
use log::debug;

use super::Action;
use super::style::Style;
use crate::geometry::{Point, Rect, Size};
use crate::render::{Renderer, Texture, text_size};

/// Maximum characters in a label.
pub const LABEL_CAPACITY: usize = 128;
/// Maximum lines a label is broken into.
pub const LABEL_MAX_LINES: usize = 16;

/// Bytes in one laid-out line; wider labels wrap earlier.
const LINE_CAPACITY: usize = 64;

type Line = heapless::String<LINE_CAPACITY>;

/// Monospace font presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TextSize {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            TextSize::Small => &FONT_5X8,
            TextSize::Medium => &FONT_6X10,
            TextSize::Large => &FONT_10X20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

// ============================================================================
// Label
// ============================================================================

/// Word-wrapped text.
#[derive(Debug, Clone)]
pub struct Label {
    text: heapless::String<LABEL_CAPACITY>,
    size: TextSize,
    align: TextAlign,
    line_spacing: u32,
    lines: heapless::Vec<Line, LABEL_MAX_LINES>,
    stale: bool,
    refreshes: u32,
}

impl Label {
    pub fn new(text: &str, size: TextSize) -> Self {
        Self {
            text: truncated(text),
            size,
            align: TextAlign::Left,
            line_spacing: 2,
            lines: heapless::Vec::new(),
            stale: true,
            refreshes: 0,
        }
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. Returns whether it changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        let text = truncated(text);
        if text == self.text {
            return false;
        }
        self.text = text;
        self.stale = true;
        true
    }

    pub fn set_size(&mut self, size: TextSize) -> bool {
        if size == self.size {
            return false;
        }
        self.size = size;
        self.stale = true;
        true
    }

    /// Lines of the last layout.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_str())
    }

    /// Number of layout passes run so far.
    pub fn refresh_count(&self) -> u32 {
        self.refreshes
    }

    fn refresh(&mut self, content: Rect) {
        let font = self.size.font();
        let advance = font.character_size.width + font.character_spacing;
        let max_chars = ((content.width() + font.character_spacing) / advance.max(1)).max(1) as usize;
        let max_chars = max_chars.min(LINE_CAPACITY);

        self.lines.clear();
        for paragraph in self.text.split('\n') {
            let mut line = Line::new();
            for word in paragraph.split_whitespace() {
                let needed = if line.is_empty() { word.len() } else { line.len() + 1 + word.len() };
                if needed > max_chars && !line.is_empty() {
                    self.lines.push(core::mem::take(&mut line)).ok();
                }
                if !line.is_empty() {
                    line.push(' ').ok();
                }
                // Words longer than a line are hard-broken.
                for c in word.chars() {
                    if line.len() + c.len_utf8() > max_chars {
                        self.lines.push(core::mem::take(&mut line)).ok();
                    }
                    line.push(c).ok();
                }
            }
            self.lines.push(line).ok();
        }
        self.stale = false;
        self.refreshes += 1;
        debug!("Label laid out into {} lines", self.lines.len());
    }

    fn paint<R: Renderer + ?Sized>(&self, content: Rect, style: &Style, renderer: &mut R) {
        let font = self.size.font();
        let line_height = (font.character_size.height + self.line_spacing) as i32;
        let mut y = content.top();
        for line in &self.lines {
            if y >= content.bottom() {
                break;
            }
            let width = text_size(line, font).width as i32;
            let x = match self.align {
                TextAlign::Left => content.left(),
                TextAlign::Center => content.left() + (content.width() as i32 - width) / 2,
                TextAlign::Right => content.right() - width,
            };
            renderer.draw_text(line, Point::new(x, y), font, style.foreground);
            y += line_height;
        }
    }
}

fn truncated<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

// ============================================================================
// Button
// ============================================================================

/// Pressable control with a centered caption.
///
/// The pressed look comes from the control's `Pressed` style. A tap fires
/// `on_tap`; a long press fires `on_long_press` when set and `on_tap`
/// otherwise. Releasing outside the button cancels.
#[derive(Debug, Clone)]
pub struct Button {
    caption: heapless::String<32>,
    size: TextSize,
    on_tap: Option<Action>,
    on_long_press: Option<Action>,
}

impl Button {
    pub fn new(caption: &str, on_tap: Option<Action>) -> Self {
        Self {
            caption: truncated(caption),
            size: TextSize::Medium,
            on_tap,
            on_long_press: None,
        }
    }

    pub fn with_long_press(mut self, action: Action) -> Self {
        self.on_long_press = Some(action);
        self
    }

    pub fn with_size(mut self, size: TextSize) -> Self {
        self.size = size;
        self
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: &str) -> bool {
        let caption = truncated(caption);
        if caption == self.caption {
            return false;
        }
        self.caption = caption;
        true
    }

    pub fn on_tap(&self) -> Option<Action> {
        self.on_tap
    }

    pub fn on_long_press(&self) -> Option<Action> {
        self.on_long_press.or(self.on_tap)
    }

    /// Smallest area fitting the caption with standard padding, never below
    /// a comfortable touch target.
    pub fn preferred_size(&self) -> Size {
        const HORIZONTAL_PADDING: u32 = 20;
        const VERTICAL_PADDING: u32 = 12;
        const MIN_WIDTH: u32 = 100;
        const MIN_HEIGHT: u32 = 44;

        let text = text_size(&self.caption, self.size.font());
        Size::new(
            (text.width + 2 * HORIZONTAL_PADDING).max(MIN_WIDTH),
            (text.height + 2 * VERTICAL_PADDING).max(MIN_HEIGHT),
        )
    }

    fn paint<R: Renderer + ?Sized>(&self, content: Rect, style: &Style, renderer: &mut R) {
        let font = self.size.font();
        let text = text_size(&self.caption, font);
        let center = content.center();
        let origin = Point::new(
            center.x - text.width as i32 / 2,
            center.y - text.height as i32 / 2,
        );
        renderer.draw_text(&self.caption, origin, font, style.foreground);
    }
}

// ============================================================================
// Image
// ============================================================================

/// A section of a texture centered in the control.
#[derive(Debug, Clone)]
pub struct Image {
    texture: Texture,
    section: Rect,
    stale: bool,
}

impl Image {
    pub fn new(texture: Texture) -> Self {
        let section = texture.pixels().bounds();
        Self {
            texture,
            section,
            stale: true,
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Show only `section` of the pixel data.
    pub fn set_section(&mut self, section: Rect) -> bool {
        if section == self.section {
            return false;
        }
        self.section = section;
        self.stale = true;
        true
    }

    fn refresh(&mut self, content: Rect) {
        self.texture.set_source(self.section);
        let size = self.texture.source().size();
        let center = content.center();
        self.texture.set_offset(Point::new(
            center.x - size.width as i32 / 2,
            center.y - size.height as i32 / 2,
        ));
        self.stale = false;
    }

    fn paint<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        if let Err(e) = renderer.draw_texture(&self.texture) {
            debug!("Image texture not drawn: {}", e);
        }
        self.texture.mark_clean();
    }
}

// ============================================================================
// Widget
// ============================================================================

#[derive(Debug, Clone)]
pub enum Widget {
    Panel,
    Label(Label),
    Button(Button),
    Image(Image),
}

impl Widget {
    pub fn needs_refresh(&self) -> bool {
        match self {
            Widget::Label(label) => label.stale,
            Widget::Image(image) => image.stale,
            Widget::Panel | Widget::Button(_) => false,
        }
    }

    /// Mark derived layout stale, e.g. after the control was resized.
    pub fn mark_stale(&mut self) {
        match self {
            Widget::Label(label) => label.stale = true,
            Widget::Image(image) => image.stale = true,
            Widget::Panel | Widget::Button(_) => {}
        }
    }

    /// Recompute derived layout for the given content rectangle.
    pub fn refresh(&mut self, content: Rect) {
        match self {
            Widget::Label(label) => label.refresh(content),
            Widget::Image(image) => image.refresh(content),
            Widget::Panel | Widget::Button(_) => {}
        }
    }

    pub(crate) fn paint<R: Renderer + ?Sized>(&mut self, content: Rect, style: &Style, renderer: &mut R) {
        match self {
            Widget::Panel => {}
            Widget::Label(label) => label.paint(content, style, renderer),
            Widget::Button(button) => button.paint(content, style, renderer),
            Widget::Image(image) => image.paint(renderer),
        }
    }
}
