//! Renderer interface shared by the software and hardware-surface backends.
//!
//! Backends only implement the primitive operations (rectangle fill, pixel
//! blend, pixel-data composition, buffer swap). Lines and text are rasterized
//! once through [`Canvas`], an embedded-graphics `DrawTarget` adapter, so the
//! same glyph and Bresenham pixels reach either backend and the output stays
//! bit-identical when backends are swapped.

mod canvas;
pub mod software;
pub mod surface;
pub mod texture;

use alloc::rc::Rc;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics::text::{Baseline, Text};
use serde::{Deserialize, Serialize};

pub use canvas::Canvas;
pub use software::SoftwareRenderer;
pub use surface::{Blitter, MemoryBlitter, SurfaceRenderer};
pub use texture::{SurfaceHandle, Texture};

use crate::color::{BlendOp, Color};
use crate::error::Result;
use crate::geometry::{Point, Rect, Size};
use crate::pixel_data::PixelData;

/// What happens to the back buffer when a frame is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwapOp {
    /// Present, then clear the new back buffer to the clear color.
    Clear,
    /// Present, then copy the presented frame into the new back buffer so
    /// the next frame only has to repaint what changed.
    #[default]
    Copy,
    /// Present without touching the new back buffer (overlay-style repaint).
    NoClear,
}

/// Creates backend-specific textures from decoded pixel data.
pub trait TextureFactory {
    fn create_texture(&mut self, pixels: Rc<PixelData>) -> Result<Texture>;
}

/// Drawing surface with a back buffer that becomes visible on [`swap_buffer`].
///
/// All drawing honors the current clip rectangle. Fills, pixel blends and
/// pixel-data composition use the current [`BlendOp`]; textures carry their
/// own.
///
/// [`swap_buffer`]: Renderer::swap_buffer
pub trait Renderer: TextureFactory {
    /// Screen size in pixels.
    fn size(&self) -> Size;

    /// Current clip rectangle.
    fn clip(&self) -> Rect;

    /// Restrict drawing to `clip` (intersected with the screen).
    fn set_clip(&mut self, clip: Rect);

    fn blend_op(&self) -> BlendOp;

    fn set_blend_op(&mut self, op: BlendOp);

    /// Fill `rect` with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Blend a single pixel.
    fn blend_pixel(&mut self, point: Point, color: Color);

    /// Read a back-buffer pixel; [`Color::NONE`] outside the screen.
    fn get_pixel(&self, point: Point) -> Color;

    /// Overwrite a back-buffer pixel without blending.
    fn set_pixel(&mut self, point: Point, color: Color);

    /// Composite the `source` section of `pixels` with its top-left corner at
    /// `dest`. Alpha and monochrome pixels are colored with `tint`.
    fn draw_pixel_data(&mut self, pixels: &PixelData, source: Rect, dest: Point, tint: Color);

    /// Present the back buffer and prepare the next one according to `op`.
    fn swap_buffer(&mut self, op: SwapOp, clear: Color) -> Result<()>;

    /// Draw a texture at its destination using its own blend operation.
    fn draw_texture(&mut self, texture: &Texture) -> Result<()> {
        let previous = self.blend_op();
        self.set_blend_op(texture.blend());
        self.draw_pixel_data(
            texture.pixels(),
            texture.source(),
            texture.destination().origin(),
            texture.tint(),
        );
        self.set_blend_op(previous);
        Ok(())
    }

    /// Clip to the whole screen again.
    fn reset_clip(&mut self) {
        let screen = Rect::screen(self.size());
        self.set_clip(screen);
    }

    /// Filled or one-pixel outlined rectangle.
    fn draw_rectangle(&mut self, rect: Rect, color: Color, filled: bool) {
        if filled || rect.width() <= 2 || rect.height() <= 2 {
            self.fill_rect(rect, color);
            return;
        }
        let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
        self.fill_rect(Rect::new(l, t, r, t + 1), color);
        self.fill_rect(Rect::new(l, b - 1, r, b), color);
        self.fill_rect(Rect::new(l, t + 1, l + 1, b - 1), color);
        self.fill_rect(Rect::new(r - 1, t + 1, r, b - 1), color);
    }

    /// One-pixel line from `from` to `to`, both ends inclusive.
    fn draw_line(&mut self, from: Point, to: Point, color: Color) {
        let mut canvas = Canvas::new(self);
        Line::new(from, to)
            .into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(&mut canvas)
            .ok();
    }

    /// Single line of monospace text with its top-left corner at `position`.
    fn draw_text(&mut self, text: &str, position: Point, font: &MonoFont<'_>, color: Color) {
        let mut canvas = Canvas::new(self);
        let style = MonoTextStyle::new(font, color);
        Text::with_baseline(text, position, style, Baseline::Top)
            .draw(&mut canvas)
            .ok();
    }
}

/// Size of `text` rendered in `font` on a single line.
pub fn text_size(text: &str, font: &MonoFont<'_>) -> Size {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return Size::new(0, font.character_size.height);
    }
    let width = chars * font.character_size.width + (chars - 1) * font.character_spacing;
    Size::new(width, font.character_size.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mono_font::ascii::FONT_6X10;

    #[test]
    fn test_text_size() {
        assert_eq!(text_size("", &FONT_6X10), Size::new(0, 10));
        assert_eq!(text_size("abc", &FONT_6X10), Size::new(18, 10));
    }

    #[test]
    fn test_outline_rectangle_leaves_interior() {
        let mut r = SoftwareRenderer::new(Size::new(8, 8));
        r.set_blend_op(BlendOp::None);
        r.draw_rectangle(Rect::new(1, 1, 6, 6), Color::RED, false);
        assert_eq!(r.get_pixel(Point::new(1, 1)), Color::RED);
        assert_eq!(r.get_pixel(Point::new(5, 5)), Color::RED);
        assert_eq!(r.get_pixel(Point::new(5, 3)), Color::RED);
        assert_eq!(r.get_pixel(Point::new(3, 3)), Color::BLACK);
        assert_eq!(r.get_pixel(Point::new(6, 6)), Color::BLACK);
    }

    #[test]
    fn test_line_is_inclusive() {
        let mut r = SoftwareRenderer::new(Size::new(8, 8));
        r.draw_line(Point::new(0, 0), Point::new(3, 3), Color::GREEN);
        for i in 0..4 {
            assert_eq!(r.get_pixel(Point::new(i, i)), Color::GREEN);
        }
        assert_eq!(r.get_pixel(Point::new(4, 4)), Color::BLACK);
    }

    #[test]
    fn test_text_respects_clip() {
        let mut r = SoftwareRenderer::new(Size::new(40, 20));
        r.set_clip(Rect::new(0, 0, 6, 20));
        r.draw_text("WW", Point::zero(), &FONT_6X10, Color::WHITE);
        let lit_outside = (6..40)
            .flat_map(|x| (0..20).map(move |y| Point::new(x, y)))
            .any(|p| r.get_pixel(p) != Color::BLACK);
        let lit_inside = Rect::new(0, 0, 6, 10).points().any(|p| r.get_pixel(p) == Color::WHITE);
        assert!(!lit_outside);
        assert!(lit_inside);
    }
}
