//! Decoded pixel buffers and the compiled-in compressed resources they come from.

use alloc::vec::Vec;

use crate::codec::Codec;
use crate::color::{Color, ColorDepth};
use crate::error::{Error, Result};
use crate::geometry::{Rect, Size};

/// Numeric asset identifier.
pub type AssetId = u32;

/// One entry of the compiled-in asset table.
///
/// `data` holds the (possibly run-length encoded) pixel bytes; its length is
/// the compressed length.
#[derive(Debug, Clone, Copy)]
pub struct CompressedResource {
    pub id: AssetId,
    pub width: u32,
    pub height: u32,
    pub depth: ColorDepth,
    /// Stored as raw bytes, decoded with the passthrough codec.
    pub uncompressed: bool,
    pub data: &'static [u8],
}

impl CompressedResource {
    /// Size of the decoded buffer in bytes.
    pub const fn decoded_len(&self) -> usize {
        self.width as usize * self.height as usize * self.depth.bytes_per_pixel()
    }

    pub const fn codec(&self) -> Codec {
        Codec::for_depth(self.depth, self.uncompressed)
    }

    /// Decode into a [`PixelData`] registered under `id`.
    pub fn decode(&self, id: AssetId) -> Result<PixelData> {
        let bytes = self
            .codec()
            .decompress(self.data, self.decoded_len())
            .map_err(|reason| Error::Decode { id, reason })?;
        Ok(PixelData {
            id,
            width: self.width,
            height: self.height,
            depth: self.depth,
            bytes,
        })
    }
}

/// Decoded, immutable pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelData {
    id: AssetId,
    width: u32,
    height: u32,
    depth: ColorDepth,
    bytes: Vec<u8>,
}

impl PixelData {
    /// Wrap an already decoded buffer.
    ///
    /// Returns a size mismatch decode error when `bytes` does not hold exactly
    /// `width * height` pixels of `depth`.
    pub fn new(id: AssetId, width: u32, height: u32, depth: ColorDepth, bytes: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * depth.bytes_per_pixel();
        if bytes.len() != expected {
            return Err(Error::Decode {
                id,
                reason: crate::codec::CodecError::SizeMismatch {
                    expected,
                    actual: bytes.len(),
                },
            });
        }
        Ok(Self {
            id,
            width,
            height,
            depth,
            bytes,
        })
    }

    /// Build an RGBA buffer from colors, row-major.
    pub fn from_colors(id: AssetId, width: u32, height: u32, colors: &[Color]) -> Result<Self> {
        let mut bytes = Vec::with_capacity(colors.len() * 4);
        for c in colors {
            bytes.extend_from_slice(&[c.r(), c.g(), c.b(), c.a()]);
        }
        Self::new(id, width, height, ColorDepth::Rgba, bytes)
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whole-image rectangle at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::screen(self.size())
    }

    pub fn depth(&self) -> ColorDepth {
        self.depth
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Color of the pixel at (`x`, `y`).
    ///
    /// Alpha and monochrome pixels take their color from `tint`; RGB and
    /// RGBA pixels ignore it. Out-of-range coordinates yield [`Color::NONE`].
    pub fn color_at(&self, x: u32, y: u32, tint: Color) -> Color {
        if x >= self.width || y >= self.height {
            return Color::NONE;
        }
        let bpp = self.depth.bytes_per_pixel();
        let i = (y as usize * self.width as usize + x as usize) * bpp;
        let p = &self.bytes[i..i + bpp];
        match self.depth {
            ColorDepth::Monochrome => {
                if p[0] == 0 {
                    Color::NONE
                } else {
                    tint
                }
            }
            ColorDepth::Alpha => {
                if p[0] == 0 {
                    Color::NONE
                } else {
                    tint.modulate_alpha(p[0])
                }
            }
            ColorDepth::Rgb => Color::rgb(p[0], p[1], p[2]),
            ColorDepth::Rgba => Color::rgba(p[0], p[1], p[2], p[3]),
        }
    }
}
