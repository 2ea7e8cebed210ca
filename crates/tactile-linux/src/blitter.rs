//! Blitter for the surface backend on fbdev panels.
//!
//! fbdev exposes no 2D engine, so composition runs on the in-RAM engine and
//! presenting copies the finished frame into the hidden video page before
//! panning to it.

use tactile_core::error::Result;
use tactile_core::pixel_data::PixelData;
use tactile_core::render::{Blitter, MemoryBlitter, SurfaceHandle};
use tactile_core::{BlendOp, Color, Point, Rect, Size};

use crate::fbdev::Framebuffer;

pub struct FbBlitter {
    engine: MemoryBlitter,
    framebuffer: Framebuffer,
}

impl FbBlitter {
    pub fn new(framebuffer: Framebuffer) -> Self {
        Self {
            engine: MemoryBlitter::new(framebuffer.screen_size()),
            framebuffer,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }
}

impl Blitter for FbBlitter {
    fn size(&self) -> Size {
        self.engine.size()
    }

    fn create_surface(&mut self, pixels: &PixelData) -> Result<SurfaceHandle> {
        self.engine.create_surface(pixels)
    }

    fn fill(&mut self, rect: Rect, color: Color, op: BlendOp) {
        self.engine.fill(rect, color, op);
    }

    fn blit(&mut self, surface: SurfaceHandle, section: Rect, dest: Point, tint: Color, op: BlendOp) -> Result<()> {
        self.engine.blit(surface, section, dest, tint, op)
    }

    fn read_pixel(&self, point: Point) -> Color {
        self.engine.read_pixel(point)
    }

    fn write_pixel(&mut self, point: Point, color: Color) {
        self.engine.write_pixel(point, color);
    }

    fn present(&mut self) -> Result<()> {
        self.engine.present()?;
        self.framebuffer.show_frame(self.engine.front())?;
        Ok(())
    }

    fn copy_front_to_back(&mut self) {
        self.engine.copy_front_to_back();
    }
}
