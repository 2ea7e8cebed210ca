//! Software rasterizer with front/back buffers and damage tracking.
//!
//! All drawing targets the back buffer. [`SoftwareRenderer::swap_buffer`]
//! makes it the front buffer, and [`SoftwareRenderer::flush`] sends only the
//! rectangular region of the front buffer that changed since the last flush
//! to the display in a single `fill_contiguous` call.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;

use embedded_graphics::prelude::{DrawTarget, PixelColor};
use embedded_graphics::primitives::Rectangle;
use log::debug;

use super::{Renderer, SwapOp, Texture, TextureFactory};
use crate::color::{BlendOp, Color};
use crate::error::Result;
use crate::geometry::{Point, Rect, Size};
use crate::pixel_data::PixelData;

/// Heap-allocated double-buffered framebuffer.
pub struct SoftwareRenderer {
    size: Size,
    front: Vec<Color>,
    back: Vec<Color>,
    clip: Rect,
    blend: BlendOp,
    /// Back-buffer pixels changed since the last swap.
    back_damage: Rect,
    /// Front-buffer pixels not yet flushed to the display.
    front_damage: Rect,
    frames: u32,
}

impl SoftwareRenderer {
    /// Allocate both buffers filled with black.
    pub fn new(size: Size) -> Self {
        let count = size.width as usize * size.height as usize;
        let screen = Rect::screen(size);
        Self {
            size,
            front: vec![Color::BLACK; count],
            back: vec![Color::BLACK; count],
            clip: screen,
            blend: BlendOp::SourceAlpha,
            back_damage: Rect::EMPTY,
            // The display content is unknown until the first flush.
            front_damage: screen,
            frames: 0,
        }
    }

    /// The presented frame.
    pub fn front(&self) -> &[Color] {
        &self.front
    }

    /// The frame being drawn.
    pub fn back(&self) -> &[Color] {
        &self.back
    }

    /// Number of frames presented so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Region of the front buffer waiting to be flushed.
    pub fn pending_flush(&self) -> Rect {
        self.front_damage
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.size.width as usize + x as usize
    }

    /// Write a back-buffer pixel, expanding the damage only if it changed.
    #[inline]
    fn store(&mut self, x: i32, y: i32, color: Color) {
        let idx = self.index(x, y);
        if self.back[idx] != color {
            self.back[idx] = color;
            self.back_damage = self.back_damage | Rect::new(x, y, x + 1, y + 1);
        }
    }

    /// Flush the damaged front-buffer region to a display, then reset the
    /// damage. If nothing changed this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> core::result::Result<(), D::Error>
    where
        D: DrawTarget,
        D::Color: PixelColor + From<Color>,
    {
        let damage = self.front_damage;
        if damage.is_empty() {
            return Ok(());
        }
        self.front_damage = Rect::EMPTY;

        debug!(
            "Flushing {}x{} damaged region at ({}, {})",
            damage.width(),
            damage.height(),
            damage.left(),
            damage.top()
        );

        let pixels = &self.front;
        let stride = self.size.width as usize;
        let (left, width) = (damage.left() as usize, damage.width() as usize);
        let colors = (damage.top() as usize..damage.bottom() as usize).flat_map(move |y| {
            let row = y * stride + left;
            pixels[row..row + width].iter().map(|&c| D::Color::from(c))
        });

        display.fill_contiguous(&Rectangle::from(damage), colors)
    }
}

impl TextureFactory for SoftwareRenderer {
    fn create_texture(&mut self, pixels: Rc<PixelData>) -> Result<Texture> {
        Ok(Texture::new(pixels))
    }
}

impl Renderer for SoftwareRenderer {
    fn size(&self) -> Size {
        self.size
    }

    fn clip(&self) -> Rect {
        self.clip
    }

    fn set_clip(&mut self, clip: Rect) {
        self.clip = clip & Rect::screen(self.size);
    }

    fn blend_op(&self) -> BlendOp {
        self.blend
    }

    fn set_blend_op(&mut self, op: BlendOp) {
        self.blend = op;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let area = rect & self.clip;
        if area.is_empty() || color.is_none() {
            return;
        }
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let dst = self.back[self.index(x, y)];
                self.store(x, y, color.blend(dst, self.blend));
            }
        }
    }

    fn blend_pixel(&mut self, point: Point, color: Color) {
        if self.clip.contains(point) {
            let dst = self.back[self.index(point.x, point.y)];
            self.store(point.x, point.y, color.blend(dst, self.blend));
        }
    }

    fn get_pixel(&self, point: Point) -> Color {
        if Rect::screen(self.size).contains(point) {
            self.back[self.index(point.x, point.y)]
        } else {
            Color::NONE
        }
    }

    fn set_pixel(&mut self, point: Point, color: Color) {
        if self.clip.contains(point) {
            self.store(point.x, point.y, color);
        }
    }

    fn draw_pixel_data(&mut self, pixels: &PixelData, source: Rect, dest: Point, tint: Color) {
        let section = source & pixels.bounds();
        let offset = dest - source.origin();
        let target = section.translate(offset) & self.clip;
        for y in target.top()..target.bottom() {
            for x in target.left()..target.right() {
                let src = pixels.color_at((x - offset.x) as u32, (y - offset.y) as u32, tint);
                let dst = self.back[self.index(x, y)];
                self.store(x, y, src.blend(dst, self.blend));
            }
        }
    }

    fn swap_buffer(&mut self, op: SwapOp, clear: Color) -> Result<()> {
        core::mem::swap(&mut self.front, &mut self.back);
        self.front_damage = self.front_damage | self.back_damage;
        self.frames += 1;

        let screen = Rect::screen(self.size);
        match op {
            SwapOp::Clear => {
                self.back.fill(clear);
                self.back_damage = screen;
            }
            SwapOp::Copy => {
                self.back.copy_from_slice(&self.front);
                self.back_damage = Rect::EMPTY;
            }
            SwapOp::NoClear => {
                self.back_damage = screen;
            }
        }
        debug!("Presented frame {} ({:?})", self.frames, op);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorDepth;

    fn renderer() -> SoftwareRenderer {
        SoftwareRenderer::new(Size::new(16, 8))
    }

    #[test]
    fn test_drawing_is_invisible_until_swap() {
        let mut r = renderer();
        r.fill_rect(Rect::new(0, 0, 4, 4), Color::RED);
        assert!(r.front().iter().all(|&c| c == Color::BLACK));

        r.swap_buffer(SwapOp::Copy, Color::BLACK).unwrap();
        assert_eq!(r.front()[0], Color::RED);
        assert_eq!(r.frames(), 1);
    }

    #[test]
    fn test_swap_policies() {
        let mut r = renderer();
        r.fill_rect(Rect::new(0, 0, 16, 8), Color::RED);
        r.swap_buffer(SwapOp::Copy, Color::BLACK).unwrap();
        assert_eq!(r.get_pixel(Point::new(3, 3)), Color::RED);

        r.swap_buffer(SwapOp::Clear, Color::BLUE).unwrap();
        assert_eq!(r.get_pixel(Point::new(3, 3)), Color::BLUE);
        assert_eq!(r.front()[0], Color::RED);

        // NoClear: the new back buffer is the previous front.
        r.swap_buffer(SwapOp::NoClear, Color::GREEN).unwrap();
        assert_eq!(r.front()[0], Color::BLUE);
        assert_eq!(r.get_pixel(Point::new(3, 3)), Color::RED);
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut r = renderer();
        r.set_clip(Rect::new(2, 2, 4, 4));
        r.fill_rect(Rect::new(0, 0, 16, 8), Color::WHITE);
        assert_eq!(r.get_pixel(Point::new(2, 2)), Color::WHITE);
        assert_eq!(r.get_pixel(Point::new(1, 2)), Color::BLACK);
        assert_eq!(r.get_pixel(Point::new(4, 3)), Color::BLACK);
        r.set_pixel(Point::new(0, 0), Color::RED);
        assert_eq!(r.get_pixel(Point::new(0, 0)), Color::BLACK);
    }

    #[test]
    fn test_pixel_data_section_and_tint() {
        let pixels = PixelData::new(5, 3, 1, ColorDepth::Alpha, alloc::vec![255, 0, 255]).unwrap();
        let mut r = renderer();
        r.draw_pixel_data(&pixels, Rect::new(1, 0, 3, 1), Point::new(5, 5), Color::GREEN);
        // Column 1 is transparent, column 2 lands at x = 6.
        assert_eq!(r.get_pixel(Point::new(5, 5)), Color::BLACK);
        assert_eq!(r.get_pixel(Point::new(6, 5)), Color::GREEN);
        assert_eq!(r.get_pixel(Point::new(7, 5)), Color::BLACK);
    }

    #[test]
    fn test_flush_sends_only_damage() {
        let mut display = RecordingDisplay::default();
        let mut r = renderer();
        r.flush(&mut display).unwrap();
        assert_eq!(display.areas.len(), 1);

        r.fill_rect(Rect::new(3, 2, 5, 6), Color::RED);
        r.swap_buffer(SwapOp::Copy, Color::BLACK).unwrap();
        r.flush(&mut display).unwrap();
        assert_eq!(display.areas[1], Rect::new(3, 2, 5, 6));
        assert_eq!(display.pixels, 16 * 8 + 2 * 4);

        r.flush(&mut display).unwrap();
        assert_eq!(display.areas.len(), 2);
    }

    #[derive(Default)]
    struct RecordingDisplay {
        areas: Vec<Rect>,
        pixels: usize,
    }

    impl embedded_graphics::prelude::OriginDimensions for RecordingDisplay {
        fn size(&self) -> Size {
            Size::new(16, 8)
        }
    }

    impl DrawTarget for RecordingDisplay {
        type Color = embedded_graphics::pixelcolor::Rgb888;
        type Error = core::convert::Infallible;

        fn draw_iter<I>(&mut self, _pixels: I) -> core::result::Result<(), Self::Error>
        where
            I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
        {
            Ok(())
        }

        fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> core::result::Result<(), Self::Error>
        where
            I: IntoIterator<Item = Self::Color>,
        {
            self.areas.push(Rect::from(*area));
            self.pixels += colors.into_iter().count();
            Ok(())
        }
    }
}
