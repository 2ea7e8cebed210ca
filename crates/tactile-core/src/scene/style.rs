//! Per-state visual styles for controls.

use alloc::vec::Vec;

use crate::color::Color;
use crate::geometry::Rect;
use crate::render::Texture;

// ============================================================================
// ControlState
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Normal,
    Pressed,
    Disabled,
}

// ============================================================================
// Padding
// ============================================================================

/// Space between a control's edge and its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Padding {
    pub const fn all(value: u32) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    pub const fn symmetric(horizontal: u32, vertical: u32) -> Self {
        Self {
            left: horizontal,
            top: vertical,
            right: horizontal,
            bottom: vertical,
        }
    }

    /// `area` shrunk by the padding, collapsing to zero size if the padding
    /// is larger than the area.
    pub fn apply(&self, area: Rect) -> Rect {
        let left = area.left() + self.left as i32;
        let top = area.top() + self.top as i32;
        Rect::new(
            left,
            top,
            (area.right() - self.right as i32).max(left),
            (area.bottom() - self.bottom as i32).max(top),
        )
    }
}

// ============================================================================
// Style
// ============================================================================

/// Visual appearance of a control in one state.
///
/// Painted in order: background fill, textures (positioned relative to the
/// control's top-left corner), border, then the widget's own content in the
/// foreground color. [`Color::NONE`] disables the background or border.
#[derive(Debug, Clone)]
pub struct Style {
    pub foreground: Color,
    pub background: Color,
    pub border: Color,
    pub padding: Padding,
    pub textures: Vec<Texture>,
}

impl Default for Style {
    /// White foreground, transparent background, no border.
    fn default() -> Self {
        Self {
            foreground: Color::WHITE,
            background: Color::NONE,
            border: Color::NONE,
            padding: Padding::default(),
            textures: Vec::new(),
        }
    }
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = color;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn with_border(mut self, color: Color) -> Self {
        self.border = color;
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.textures.push(texture);
        self
    }

    /// Whether the background fully covers whatever is behind the control.
    pub fn is_opaque(&self) -> bool {
        !self.background.is_none() && self.background.a() == u8::MAX
    }
}

/// One [`Style`] per [`ControlState`].
#[derive(Debug, Clone, Default)]
pub struct Styles {
    pub normal: Style,
    pub pressed: Style,
    pub disabled: Style,
}

impl Styles {
    /// Same style in every state.
    pub fn uniform(style: Style) -> Self {
        Self {
            normal: style.clone(),
            pressed: style.clone(),
            disabled: style,
        }
    }

    /// Button-like styles: darker background while pressed, dimmed text while
    /// disabled.
    pub fn interactive(style: Style) -> Self {
        let pressed = Style {
            background: style.background.darken(48),
            ..style.clone()
        };
        let disabled = Style {
            foreground: style.foreground.darken(128),
            ..style.clone()
        };
        Self {
            normal: style,
            pressed,
            disabled,
        }
    }

    pub fn get(&self, state: ControlState) -> &Style {
        match state {
            ControlState::Normal => &self.normal,
            ControlState::Pressed => &self.pressed,
            ControlState::Disabled => &self.disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity() {
        assert!(!Style::new().is_opaque());
        assert!(Style::new().with_background(Color::BLUE).is_opaque());
        assert!(!Style::new().with_background(Color::BLUE.with_alpha(128)).is_opaque());
    }

    #[test]
    fn test_interactive_styles() {
        let styles = Styles::interactive(Style::new().with_background(Color::rgb(100, 100, 100)));
        assert_eq!(styles.get(ControlState::Pressed).background, Color::rgb(52, 52, 52));
        assert_eq!(styles.get(ControlState::Disabled).foreground, Color::rgb(127, 127, 127));
        assert_eq!(Padding::all(2).apply(Rect::new(0, 0, 10, 10)), Rect::new(2, 2, 8, 8));
    }
}
