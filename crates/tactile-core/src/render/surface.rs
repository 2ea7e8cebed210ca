//! Hardware-surface renderer backend.
//!
//! [`SurfaceRenderer`] exposes the same [`Renderer`] surface as the software
//! rasterizer but hands every operation to a [`Blitter`], the abstraction of
//! an accelerated 2D engine: rectangle fills, surface-to-screen blits and a
//! page flip. Clipping is resolved here, before the blitter sees a request,
//! so blitters only ever receive on-screen rectangles.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;

use embedded_graphics::prelude::{DrawTarget, PixelColor};
use embedded_graphics::primitives::Rectangle;
use log::{debug, info};

use super::{Renderer, SurfaceHandle, SwapOp, Texture, TextureFactory};
use crate::color::{BlendOp, Color};
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect, Size};
use crate::pixel_data::{AssetId, PixelData};

/// Accelerated 2D engine driving a double-buffered display.
///
/// Rectangles passed in are already clipped to the screen. Blending follows
/// [`Color::blend`] exactly.
pub trait Blitter {
    /// Screen size in pixels.
    fn size(&self) -> Size;

    /// Upload pixel data into a surface the engine can blit from.
    fn create_surface(&mut self, pixels: &PixelData) -> Result<SurfaceHandle>;

    /// Fill `rect` of the back buffer.
    fn fill(&mut self, rect: Rect, color: Color, op: BlendOp);

    /// Blit `section` of `surface` to the back buffer at `dest`.
    fn blit(
        &mut self,
        surface: SurfaceHandle,
        section: Rect,
        dest: Point,
        tint: Color,
        op: BlendOp,
    ) -> Result<()>;

    fn read_pixel(&self, point: Point) -> Color;

    fn write_pixel(&mut self, point: Point, color: Color);

    /// Make the back buffer visible and the old front buffer the new back.
    fn present(&mut self) -> Result<()>;

    /// Copy the visible buffer into the back buffer.
    fn copy_front_to_back(&mut self);
}

/// [`Renderer`] backend delegating to a [`Blitter`].
pub struct SurfaceRenderer<B: Blitter> {
    blitter: B,
    clip: Rect,
    blend: BlendOp,
    /// Surfaces uploaded so far, by asset id. The buffer is kept alongside
    /// because an id alone does not tell two buffers apart.
    uploads: BTreeMap<AssetId, (Rc<PixelData>, SurfaceHandle)>,
}

impl<B: Blitter> SurfaceRenderer<B> {
    pub fn new(blitter: B) -> Self {
        let clip = Rect::screen(blitter.size());
        Self {
            blitter,
            clip,
            blend: BlendOp::SourceAlpha,
            uploads: BTreeMap::new(),
        }
    }

    pub fn blitter(&self) -> &B {
        &self.blitter
    }

    pub fn blitter_mut(&mut self) -> &mut B {
        &mut self.blitter
    }

    /// Surface already holding exactly these pixels.
    fn uploaded(&self, pixels: &PixelData) -> Option<SurfaceHandle> {
        let (cached, handle) = self.uploads.get(&pixels.id())?;
        (core::ptr::eq(Rc::as_ptr(cached), pixels) || **cached == *pixels).then_some(*handle)
    }

    fn upload_shared(&mut self, pixels: &Rc<PixelData>) -> Result<SurfaceHandle> {
        if let Some(handle) = self.uploaded(pixels) {
            return Ok(handle);
        }
        let handle = self.blitter.create_surface(pixels)?;
        debug!("Uploaded asset {} as surface {:?}", pixels.id(), handle);
        self.uploads.insert(pixels.id(), (Rc::clone(pixels), handle));
        Ok(handle)
    }

    fn upload(&mut self, pixels: &PixelData) -> Result<SurfaceHandle> {
        match self.uploaded(pixels) {
            Some(handle) => Ok(handle),
            None => self.upload_shared(&Rc::new(pixels.clone())),
        }
    }

    /// Clip a blit and hand the visible part to the blitter.
    fn blit_clipped(
        &mut self,
        handle: SurfaceHandle,
        bounds: Rect,
        source: Rect,
        dest: Point,
        tint: Color,
        op: BlendOp,
    ) -> Result<()> {
        let section = source & bounds;
        let offset = dest - source.origin();
        let target = section.translate(offset) & self.clip;
        if target.is_empty() {
            return Ok(());
        }
        let visible = target.translate(Point::zero() - offset);
        self.blitter.blit(handle, visible, target.origin(), tint, op)
    }
}

impl<B: Blitter> TextureFactory for SurfaceRenderer<B> {
    fn create_texture(&mut self, pixels: Rc<PixelData>) -> Result<Texture> {
        let handle = self.upload_shared(&pixels)?;
        Ok(Texture::new(pixels).with_surface(handle))
    }
}

impl<B: Blitter> Renderer for SurfaceRenderer<B> {
    fn size(&self) -> Size {
        self.blitter.size()
    }

    fn clip(&self) -> Rect {
        self.clip
    }

    fn set_clip(&mut self, clip: Rect) {
        self.clip = clip & Rect::screen(self.blitter.size());
    }

    fn blend_op(&self) -> BlendOp {
        self.blend
    }

    fn set_blend_op(&mut self, op: BlendOp) {
        self.blend = op;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let area = rect & self.clip;
        if !area.is_empty() && !color.is_none() {
            self.blitter.fill(area, color, self.blend);
        }
    }

    fn blend_pixel(&mut self, point: Point, color: Color) {
        if self.clip.contains(point) && !color.is_none() {
            self.blitter
                .fill(Rect::new(point.x, point.y, point.x + 1, point.y + 1), color, self.blend);
        }
    }

    fn get_pixel(&self, point: Point) -> Color {
        if Rect::screen(self.blitter.size()).contains(point) {
            self.blitter.read_pixel(point)
        } else {
            Color::NONE
        }
    }

    fn set_pixel(&mut self, point: Point, color: Color) {
        if self.clip.contains(point) {
            self.blitter.write_pixel(point, color);
        }
    }

    fn draw_pixel_data(&mut self, pixels: &PixelData, source: Rect, dest: Point, tint: Color) {
        let op = self.blend;
        let result = self
            .upload(pixels)
            .and_then(|handle| self.blit_clipped(handle, pixels.bounds(), source, dest, tint, op));
        if let Err(e) = result {
            // The trait method is infallible; a failed upload draws nothing.
            debug!("Skipping pixel data {}: {}", pixels.id(), e);
        }
    }

    fn draw_texture(&mut self, texture: &Texture) -> Result<()> {
        let handle = match texture.surface() {
            Some(handle) => handle,
            None => self.upload(texture.pixels())?,
        };
        self.blit_clipped(
            handle,
            texture.pixels().bounds(),
            texture.source(),
            texture.destination().origin(),
            texture.tint(),
            texture.blend(),
        )
    }

    fn swap_buffer(&mut self, op: SwapOp, clear: Color) -> Result<()> {
        self.blitter.present()?;
        match op {
            SwapOp::Clear => {
                let screen = Rect::screen(self.blitter.size());
                self.blitter.fill(screen, clear, BlendOp::None);
            }
            SwapOp::Copy => self.blitter.copy_front_to_back(),
            SwapOp::NoClear => {}
        }
        Ok(())
    }
}

/// 2D engine emulated in RAM.
///
/// Stands in for real hardware in the simulator and in tests; uploads copy
/// the pixel data into engine-owned surfaces the way a driver would copy it
/// into video memory.
pub struct MemoryBlitter {
    size: Size,
    front: Vec<Color>,
    back: Vec<Color>,
    surfaces: Vec<PixelData>,
    frames: u32,
}

impl MemoryBlitter {
    pub fn new(size: Size) -> Self {
        let count = size.width as usize * size.height as usize;
        info!("Memory blitter {}x{}", size.width, size.height);
        Self {
            size,
            front: vec![Color::BLACK; count],
            back: vec![Color::BLACK; count],
            surfaces: Vec::new(),
            frames: 0,
        }
    }

    pub fn front(&self) -> &[Color] {
        &self.front
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    #[inline]
    fn index(&self, p: Point) -> usize {
        p.y as usize * self.size.width as usize + p.x as usize
    }

    /// Send the whole visible buffer to a display.
    pub fn flush<D>(&self, display: &mut D) -> core::result::Result<(), D::Error>
    where
        D: DrawTarget,
        D::Color: PixelColor + From<Color>,
    {
        let area = Rectangle::from(Rect::screen(self.size));
        display.fill_contiguous(&area, self.front.iter().map(|&c| D::Color::from(c)))
    }
}

impl Blitter for MemoryBlitter {
    fn size(&self) -> Size {
        self.size
    }

    fn create_surface(&mut self, pixels: &PixelData) -> Result<SurfaceHandle> {
        self.surfaces.push(pixels.clone());
        Ok(SurfaceHandle(self.surfaces.len() as u32 - 1))
    }

    fn fill(&mut self, rect: Rect, color: Color, op: BlendOp) {
        for p in rect.points() {
            let i = self.index(p);
            self.back[i] = color.blend(self.back[i], op);
        }
    }

    fn blit(
        &mut self,
        surface: SurfaceHandle,
        section: Rect,
        dest: Point,
        tint: Color,
        op: BlendOp,
    ) -> Result<()> {
        let Some(pixels) = self.surfaces.get(surface.0 as usize) else {
            return Err(Error::SurfaceNotFound { handle: surface.0 });
        };
        let offset = dest - section.origin();
        for p in section.points() {
            let src = pixels.color_at(p.x as u32, p.y as u32, tint);
            let i = (p.y + offset.y) as usize * self.size.width as usize + (p.x + offset.x) as usize;
            self.back[i] = src.blend(self.back[i], op);
        }
        Ok(())
    }

    fn read_pixel(&self, point: Point) -> Color {
        self.back[self.index(point)]
    }

    fn write_pixel(&mut self, point: Point, color: Color) {
        let i = self.index(point);
        self.back[i] = color;
    }

    fn present(&mut self) -> Result<()> {
        core::mem::swap(&mut self.front, &mut self.back);
        self.frames += 1;
        Ok(())
    }

    fn copy_front_to_back(&mut self) {
        self.back.copy_from_slice(&self.front);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorDepth;

    #[test]
    fn test_uploads_are_reused() {
        let pixels = PixelData::new(3, 2, 2, ColorDepth::Alpha, vec![255; 4]).unwrap();
        let mut r = SurfaceRenderer::new(MemoryBlitter::new(Size::new(8, 8)));
        r.draw_pixel_data(&pixels, pixels.bounds(), Point::zero(), Color::RED);
        r.draw_pixel_data(&pixels, pixels.bounds(), Point::new(4, 4), Color::RED);
        assert_eq!(r.blitter().surface_count(), 1);
        assert_eq!(r.get_pixel(Point::new(5, 5)), Color::RED);
    }

    #[test]
    fn test_buffers_sharing_an_id_get_their_own_surfaces() {
        let red = PixelData::from_colors(1, 2, 2, &[Color::RED; 4]).unwrap();
        let blue = PixelData::from_colors(1, 2, 2, &[Color::BLUE; 4]).unwrap();
        let mut r = SurfaceRenderer::new(MemoryBlitter::new(Size::new(8, 8)));
        r.draw_pixel_data(&red, red.bounds(), Point::zero(), Color::WHITE);
        r.draw_pixel_data(&blue, blue.bounds(), Point::new(4, 4), Color::WHITE);
        assert_eq!(r.get_pixel(Point::zero()), Color::RED);
        assert_eq!(r.get_pixel(Point::new(4, 4)), Color::BLUE);
        assert_eq!(r.blitter().surface_count(), 2);
    }

    #[test]
    fn test_unknown_surface_is_reported() {
        let mut blitter = MemoryBlitter::new(Size::new(4, 4));
        let section = Rect::new(0, 0, 1, 1);
        let result = blitter.blit(SurfaceHandle(3), section, Point::zero(), Color::WHITE, BlendOp::None);
        assert_eq!(result, Err(Error::SurfaceNotFound { handle: 3 }));
    }

    #[test]
    fn test_blit_is_clipped_before_reaching_blitter() {
        let pixels = PixelData::new(4, 4, 4, ColorDepth::Rgb, vec![200; 48]).unwrap();
        let mut r = SurfaceRenderer::new(MemoryBlitter::new(Size::new(8, 8)));
        r.set_clip(Rect::new(0, 0, 6, 6));
        // Partly off the left/top edge and partly outside the clip.
        r.draw_pixel_data(&pixels, pixels.bounds(), Point::new(-2, 4), Color::WHITE);
        assert_eq!(r.get_pixel(Point::new(0, 4)), Color::rgb(200, 200, 200));
        assert_eq!(r.get_pixel(Point::new(1, 5)), Color::rgb(200, 200, 200));
        assert_eq!(r.get_pixel(Point::new(1, 6)), Color::BLACK);
        assert_eq!(r.get_pixel(Point::new(2, 4)), Color::BLACK);
    }

    #[test]
    fn test_present_flips_buffers() {
        let mut r = SurfaceRenderer::new(MemoryBlitter::new(Size::new(4, 4)));
        r.fill_rect(Rect::new(0, 0, 4, 4), Color::BLUE);
        assert_eq!(r.blitter().front()[0], Color::BLACK);
        r.swap_buffer(SwapOp::Clear, Color::GREEN).unwrap();
        assert_eq!(r.blitter().front()[0], Color::BLUE);
        assert_eq!(r.get_pixel(Point::zero()), Color::GREEN);
        assert_eq!(r.blitter().frames(), 1);
    }
}
