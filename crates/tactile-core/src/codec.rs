//! Run-length pixel codec for compiled-in art.
//!
//! A compressed stream is a sequence of `(count, pixel)` pairs where `count`
//! is one byte (1-255) and `pixel` is as wide as one pixel of the variant:
//! 1 byte for alpha/monochrome, 3 for RGB, 4 for RGBA. Runs longer than 255
//! pixels are split into consecutive runs. The passthrough variant stores the
//! raw bytes unchanged.

use alloc::vec::Vec;

use thiserror_no_std::Error;

use crate::color::ColorDepth;

/// Longest run a single `(count, pixel)` pair can describe.
pub const MAX_RUN: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A run header was found but its pixel bytes are cut off
    #[error("Truncated run at offset {offset}")]
    TruncatedRun { offset: usize },

    /// A run declared a repeat count of zero
    #[error("Zero-length run at offset {offset}")]
    ZeroLengthRun { offset: usize },

    /// Raw input is not a whole number of pixels
    #[error("Input of {len} bytes is not a multiple of the {pixel_size}-byte pixel")]
    Misaligned { len: usize, pixel_size: usize },

    /// Decoded size differs from the size declared for the asset
    #[error("Expected {expected} decoded bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Codec variant, selected by the color depth of the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Passthrough,
    Alpha,
    Rgb,
    Rgba,
}

impl Codec {
    /// Pick the codec for an asset of `depth`, or passthrough for assets
    /// stored uncompressed.
    pub const fn for_depth(depth: ColorDepth, uncompressed: bool) -> Self {
        if uncompressed {
            return Codec::Passthrough;
        }
        match depth {
            ColorDepth::Monochrome | ColorDepth::Alpha => Codec::Alpha,
            ColorDepth::Rgb => Codec::Rgb,
            ColorDepth::Rgba => Codec::Rgba,
        }
    }

    /// Bytes per run value. Passthrough works on single bytes.
    pub const fn pixel_size(self) -> usize {
        match self {
            Codec::Passthrough | Codec::Alpha => 1,
            Codec::Rgb => 3,
            Codec::Rgba => 4,
        }
    }

    /// Compress `raw` into a run-length stream.
    pub fn compress(self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        let pixel_size = self.pixel_size();
        if raw.len() % pixel_size != 0 {
            return Err(CodecError::Misaligned {
                len: raw.len(),
                pixel_size,
            });
        }
        if self == Codec::Passthrough {
            return Ok(raw.to_vec());
        }

        let mut out = Vec::new();
        let mut pixels = raw.chunks_exact(pixel_size).peekable();
        while let Some(pixel) = pixels.next() {
            let mut count = 1;
            while count < MAX_RUN && pixels.peek() == Some(&pixel) {
                pixels.next();
                count += 1;
            }
            out.push(count as u8);
            out.extend_from_slice(pixel);
        }
        Ok(out)
    }

    /// Expand `stream` back into raw bytes, which must total `expected_len`.
    pub fn decompress(self, stream: &[u8], expected_len: usize) -> Result<Vec<u8>, CodecError> {
        if self == Codec::Passthrough {
            if stream.len() != expected_len {
                return Err(CodecError::SizeMismatch {
                    expected: expected_len,
                    actual: stream.len(),
                });
            }
            return Ok(stream.to_vec());
        }

        let pixel_size = self.pixel_size();
        let mut out = Vec::with_capacity(expected_len);
        let mut offset = 0;
        while offset < stream.len() {
            let count = stream[offset] as usize;
            if count == 0 {
                return Err(CodecError::ZeroLengthRun { offset });
            }
            let Some(pixel) = stream.get(offset + 1..offset + 1 + pixel_size) else {
                return Err(CodecError::TruncatedRun { offset });
            };
            if out.len() + count * pixel_size > expected_len {
                return Err(CodecError::SizeMismatch {
                    expected: expected_len,
                    actual: out.len() + count * pixel_size,
                });
            }
            for _ in 0..count {
                out.extend_from_slice(pixel);
            }
            offset += 1 + pixel_size;
        }

        if out.len() != expected_len {
            return Err(CodecError::SizeMismatch {
                expected: expected_len,
                actual: out.len(),
            });
        }
        Ok(out)
    }
}
