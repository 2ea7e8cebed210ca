//! Renders the demo art, run-length encodes it with the engine's own codec
//! and emits the asset table included by `src/lib.rs`.
//!
//! An image whose encoded stream would not be smaller than its raw bytes is
//! stored uncompressed and flagged as such in the table.

use std::env;
use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use tactile_core::ColorDepth;
use tactile_core::codec::Codec;

struct Art {
    name: &'static str,
    id: u32,
    width: u32,
    height: u32,
    depth: ColorDepth,
    pixels: Vec<u8>,
}

impl Art {
    fn new(name: &'static str, id: u32, width: u32, height: u32, depth: ColorDepth) -> Self {
        let len = (width * height) as usize * depth.bytes_per_pixel();
        Self {
            name,
            id,
            width,
            height,
            depth,
            pixels: Vec::with_capacity(len),
        }
    }

    fn render(mut self, mut pixel: impl FnMut(i32, i32) -> Vec<u8>) -> Self {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                self.pixels.extend(pixel(x, y));
            }
        }
        self
    }
}

fn distance_sq(x: i32, y: i32, cx: i32, cy: i32) -> i32 {
    (x - cx) * (x - cx) + (y - cy) * (y - cy)
}

/// Translucent disc with a vertical color ramp.
fn logo() -> Art {
    Art::new("LOGO", 1, 48, 48, ColorDepth::Rgba).render(|x, y| {
        let d = distance_sq(x, y, 24, 24);
        if d > 22 * 22 {
            return vec![0, 0, 0, 0];
        }
        let alpha = if d > 20 * 20 { 128 } else { 255 };
        vec![0x30, (0x60 + y * 3) as u8, 0xe0, alpha]
    })
}

/// 8-pixel checkerboard.
fn checker() -> Art {
    Art::new("CHECKER", 2, 64, 48, ColorDepth::Rgb).render(|x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            vec![0xe8, 0xe8, 0xe8]
        } else {
            vec![0x40, 0x48, 0x58]
        }
    })
}

/// Anti-aliased ring used as a tinted icon.
fn ring() -> Art {
    Art::new("RING", 3, 32, 32, ColorDepth::Alpha).render(|x, y| {
        let d = distance_sq(x, y, 16, 16);
        let coverage = match d {
            d if d < 9 * 9 => 0,
            d if d < 10 * 10 => 128,
            d if d < 13 * 13 => 255,
            d if d < 14 * 14 => 128,
            _ => 0,
        };
        vec![coverage]
    })
}

/// Arrow cursor.
fn cursor() -> Art {
    Art::new("CURSOR", 4, 12, 16, ColorDepth::Monochrome).render(|x, y| {
        let on = x <= y && x < 12 && (y < 12 || x < 4);
        vec![on as u8]
    })
}

/// Pseudo-random static; run-length encoding only makes it larger.
fn noise() -> Art {
    let mut state: u32 = 0x2545_f491;
    Art::new("NOISE", 5, 24, 24, ColorDepth::Rgb).render(move |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        state.to_le_bytes()[1..4].to_vec()
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo::rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let mut table = String::from("&[\n");
    let mut ids = String::new();

    for art in [logo(), checker(), ring(), cursor(), noise()] {
        let compressed = Codec::for_depth(art.depth, false)
            .compress(&art.pixels)
            .map_err(|e| format!("{}: {}", art.name, e))?;
        let uncompressed = compressed.len() >= art.pixels.len();
        let data = if uncompressed { &art.pixels } else { &compressed };

        let path = out_dir.join(format!("{}.bin", art.name.to_lowercase()));
        fs::write(&path, data)?;

        writeln!(
            ids,
            "/// {}x{} {:?}\npub const {}: tactile_core::pixel_data::AssetId = {};",
            art.width, art.height, art.depth, art.name, art.id
        )?;
        writeln!(
            table,
            "    tactile_core::pixel_data::CompressedResource {{ id: {}, width: {}, height: {}, \
             depth: tactile_core::ColorDepth::{:?}, uncompressed: {}, data: include_bytes!({:?}) }},",
            art.id, art.width, art.height, art.depth, uncompressed, path
        )?;
    }
    table.push(']');

    fs::write(out_dir.join("ids.rs"), ids)?;
    fs::write(out_dir.join("table.rs"), table)?;
    Ok(())
}
