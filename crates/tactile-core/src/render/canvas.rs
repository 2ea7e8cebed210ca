use core::convert::Infallible;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::Renderer;
use crate::color::Color;
use crate::geometry::Rect;

/// embedded-graphics `DrawTarget` view of a [`Renderer`].
///
/// Pixels go through [`Renderer::blend_pixel`] and solid fills through
/// [`Renderer::fill_rect`], so clipping and blending stay the backend's job.
pub struct Canvas<'a, R: Renderer + ?Sized> {
    renderer: &'a mut R,
}

impl<'a, R: Renderer + ?Sized> Canvas<'a, R> {
    pub fn new(renderer: &'a mut R) -> Self {
        Self { renderer }
    }
}

impl<R: Renderer + ?Sized> OriginDimensions for Canvas<'_, R> {
    fn size(&self) -> Size {
        self.renderer.size()
    }
}

impl<R: Renderer + ?Sized> DrawTarget for Canvas<'_, R> {
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.renderer.blend_pixel(point, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.renderer.fill_rect(Rect::from(*area), color);
        Ok(())
    }
}
