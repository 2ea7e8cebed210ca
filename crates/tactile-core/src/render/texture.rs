//! Drawable textures.

use alloc::rc::Rc;

use crate::color::{BlendOp, Color};
use crate::geometry::{Point, Rect};
use crate::pixel_data::PixelData;

/// Handle of a surface uploaded to a hardware blitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u32);

/// A section of decoded pixel data placed somewhere on screen.
///
/// The pixel buffer is immutable and shared; everything else is per texture,
/// so cloning a texture gives an independent copy that can be moved,
/// re-sectioned or re-blended without affecting the original.
#[derive(Debug, Clone)]
pub struct Texture {
    pixels: Rc<PixelData>,
    surface: Option<SurfaceHandle>,
    source: Rect,
    destination: Rect,
    tint: Color,
    blend: BlendOp,
    dirty: bool,
}

impl Texture {
    /// Texture showing all of `pixels` at the origin.
    pub fn new(pixels: Rc<PixelData>) -> Self {
        let bounds = pixels.bounds();
        Self {
            pixels,
            surface: None,
            source: bounds,
            destination: bounds,
            tint: Color::WHITE,
            blend: BlendOp::SourceAlpha,
            dirty: true,
        }
    }

    /// Attach the backend surface holding an uploaded copy of the pixels.
    pub fn with_surface(mut self, surface: SurfaceHandle) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_blend(mut self, blend: BlendOp) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.set_offset(offset);
        self
    }

    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    pub fn shared_pixels(&self) -> &Rc<PixelData> {
        &self.pixels
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    /// Section of the pixel data that is drawn.
    pub fn source(&self) -> Rect {
        self.source
    }

    /// Where the section lands on screen.
    pub fn destination(&self) -> Rect {
        self.destination
    }

    pub fn tint(&self) -> Color {
        self.tint
    }

    pub fn blend(&self) -> BlendOp {
        self.blend
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Select the part of the pixel data to draw. The destination keeps its
    /// origin and takes the section's size.
    pub fn set_source(&mut self, source: Rect) {
        let source = source & self.pixels.bounds();
        if source != self.source {
            self.source = source;
            self.destination = Rect::from_origin_size(self.destination.origin(), source.size());
            self.dirty = true;
        }
    }

    /// Move the texture so its top-left corner is at `offset`.
    pub fn set_offset(&mut self, offset: Point) {
        if offset != self.destination.origin() {
            self.destination = Rect::from_origin_size(offset, self.source.size());
            self.dirty = true;
        }
    }

    pub fn set_blend(&mut self, blend: BlendOp) {
        if blend != self.blend {
            self.blend = blend;
            self.dirty = true;
        }
    }

    pub fn set_tint(&mut self, tint: Color) {
        if tint != self.tint {
            self.tint = tint;
            self.dirty = true;
        }
    }

    /// Copy of this texture translated by `offset`, used when a control
    /// paints its style textures relative to its own area.
    pub fn translated(&self, offset: Point) -> Self {
        let mut copy = self.clone();
        copy.destination = self.destination.translate(offset);
        copy
    }
}
