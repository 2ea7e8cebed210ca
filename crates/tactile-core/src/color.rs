//! Color definitions and blending
//!
//! Pixels are 8-bit RGBA. The display backends convert to their native
//! format (RGB565 or XRGB8888) only when a frame is presented, so all
//! compositing happens at full precision and both renderer backends share the
//! single blending definition in [`Color::blend`].

use embedded_graphics::pixelcolor::raw::RawU32;
use embedded_graphics::pixelcolor::{PixelColor, Rgb565, Rgb888, RgbColor};
use serde::{Deserialize, Serialize};

/// Packed 8-bit red/green/blue/alpha color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color(u32);

impl Color {
    /// Reserved "no color": drawing it is a no-op.
    pub const NONE: Color = Color(0);

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Color(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::rgba(self.r(), self.g(), self.b(), a)
    }

    /// Scale the alpha channel by `coverage` (0-255).
    pub const fn modulate_alpha(self, coverage: u8) -> Self {
        self.with_alpha(mul_div255(self.a(), coverage))
    }

    /// Darken each color channel by `amount`, keeping alpha.
    pub const fn darken(self, amount: u8) -> Self {
        Self::rgba(
            self.r().saturating_sub(amount),
            self.g().saturating_sub(amount),
            self.b().saturating_sub(amount),
            self.a(),
        )
    }

    /// Combine `self` (source) with `dst` according to `op`.
    ///
    /// A [`Color::NONE`] source never changes the destination.
    pub fn blend(self, dst: Color, op: BlendOp) -> Color {
        if self.is_none() {
            return dst;
        }
        match op {
            BlendOp::None => self,
            BlendOp::SourceAlpha => {
                let a = self.a();
                match a {
                    255 => self,
                    0 => dst,
                    _ => {
                        let inv = 255 - a;
                        Color::rgba(
                            lerp(self.r(), dst.r(), a, inv),
                            lerp(self.g(), dst.g(), a, inv),
                            lerp(self.b(), dst.b(), a, inv),
                            a.saturating_add(mul_div255(dst.a(), inv)),
                        )
                    }
                }
            }
            BlendOp::Add => {
                let a = self.a();
                Color::rgba(
                    dst.r().saturating_add(mul_div255(self.r(), a)),
                    dst.g().saturating_add(mul_div255(self.g(), a)),
                    dst.b().saturating_add(mul_div255(self.b(), a)),
                    dst.a().max(a),
                )
            }
        }
    }
}

/// `x * y / 255`, rounded.
const fn mul_div255(x: u8, y: u8) -> u8 {
    ((x as u32 * y as u32 + 127) / 255) as u8
}

fn lerp(src: u8, dst: u8, a: u8, inv: u8) -> u8 {
    ((src as u32 * a as u32 + dst as u32 * inv as u32 + 127) / 255) as u8
}

impl PixelColor for Color {
    type Raw = RawU32;
}

impl From<Rgb888> for Color {
    fn from(c: Rgb888) -> Self {
        Color::rgb(c.r(), c.g(), c.b())
    }
}

impl From<Color> for Rgb888 {
    fn from(c: Color) -> Self {
        Rgb888::new(c.r(), c.g(), c.b())
    }
}

impl From<Color> for Rgb565 {
    fn from(c: Color) -> Self {
        Rgb565::from(Rgb888::from(c))
    }
}

/// Rule for combining a drawn pixel with the pixel already in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendOp {
    /// Overwrite the destination.
    None,
    /// Source-over alpha compositing.
    #[default]
    SourceAlpha,
    /// Alpha-weighted additive blending, saturating per channel.
    Add,
}

/// Storage format of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorDepth {
    /// One byte per pixel, zero is off and anything else is on.
    Monochrome,
    /// One alpha byte per pixel, tinted at draw time.
    Alpha,
    Rgb,
    Rgba,
}

impl ColorDepth {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ColorDepth::Monochrome | ColorDepth::Alpha => 1,
            ColorDepth::Rgb => 3,
            ColorDepth::Rgba => 4,
        }
    }

    /// Numeric tag used in the compiled asset table.
    pub const fn tag(self) -> u8 {
        match self {
            ColorDepth::Monochrome => 0,
            ColorDepth::Alpha => 1,
            ColorDepth::Rgb => 2,
            ColorDepth::Rgba => 3,
        }
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ColorDepth::Monochrome),
            1 => Some(ColorDepth::Alpha),
            2 => Some(ColorDepth::Rgb),
            3 => Some(ColorDepth::Rgba),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_packing() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (1, 2, 3, 4));
        assert_eq!(c.raw(), 0x0102_0304);
    }

    #[test]
    fn test_none_never_blends() {
        let dst = Color::rgb(10, 20, 30);
        for op in [BlendOp::None, BlendOp::SourceAlpha, BlendOp::Add] {
            assert_eq!(Color::NONE.blend(dst, op), dst);
        }
    }

    #[test]
    fn test_copy_ignores_destination() {
        let src = Color::rgba(200, 100, 50, 10);
        assert_eq!(src.blend(Color::WHITE, BlendOp::None), src);
    }

    #[test]
    fn test_source_alpha_half() {
        let src = Color::rgba(255, 0, 0, 128);
        let out = src.blend(Color::rgb(0, 0, 255), BlendOp::SourceAlpha);
        assert_eq!(out.r(), 128);
        assert_eq!(out.g(), 0);
        assert_eq!(out.b(), 127);
        assert_eq!(out.a(), 255);
    }

    #[test]
    fn test_source_alpha_extremes() {
        let dst = Color::rgb(1, 2, 3);
        assert_eq!(Color::RED.blend(dst, BlendOp::SourceAlpha), Color::RED);
        assert_eq!(Color::rgba(9, 9, 9, 0).blend(dst, BlendOp::SourceAlpha), dst);
    }

    #[test]
    fn test_add_saturates() {
        let out = Color::rgb(200, 10, 0).blend(Color::rgb(100, 10, 0), BlendOp::Add);
        assert_eq!((out.r(), out.g(), out.b()), (255, 20, 0));
    }

    #[test]
    fn test_depth_tags_round_trip() {
        for depth in [
            ColorDepth::Monochrome,
            ColorDepth::Alpha,
            ColorDepth::Rgb,
            ColorDepth::Rgba,
        ] {
            assert_eq!(ColorDepth::from_tag(depth.tag()), Some(depth));
        }
        assert_eq!(ColorDepth::from_tag(9), None);
    }
}
