//! Linux framebuffer device with page-flip double buffering.
//!
//! The virtual resolution is doubled when the driver allows it; frames are
//! written to the hidden page and shown with `FBIOPAN_DISPLAY`. Drivers that
//! refuse a second page fall back to drawing into the visible one.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::Path;
use std::ptr::{self, NonNull};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, info, warn};
use tactile_core::error::Device;
use tactile_core::{Color, Rect};

use crate::error::{LinuxError, Result};

const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
const FBIOPUT_VSCREENINFO: libc::c_ulong = 0x4601;
const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;
const FBIOPAN_DISPLAY: libc::c_ulong = 0x4606;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FbVarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FbFixScreenInfo {
    pub id: [u8; 16],
    pub smem_start: libc::c_ulong,
    pub smem_len: u32,
    pub kind: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

// ============================================================================
// Pixel format
// ============================================================================

/// Packed true-color layout described by the driver's bitfields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub bytes_per_pixel: usize,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
}

impl PixelFormat {
    pub const XRGB8888: PixelFormat = PixelFormat {
        bytes_per_pixel: 4,
        red: FbBitfield { offset: 16, length: 8, msb_right: 0 },
        green: FbBitfield { offset: 8, length: 8, msb_right: 0 },
        blue: FbBitfield { offset: 0, length: 8, msb_right: 0 },
    };

    pub const RGB565: PixelFormat = PixelFormat {
        bytes_per_pixel: 2,
        red: FbBitfield { offset: 11, length: 5, msb_right: 0 },
        green: FbBitfield { offset: 5, length: 6, msb_right: 0 },
        blue: FbBitfield { offset: 0, length: 5, msb_right: 0 },
    };

    pub fn from_var(var: &FbVarScreenInfo) -> Result<Self> {
        let fits = |field: &FbBitfield| field.length <= 8 && field.offset + field.length <= var.bits_per_pixel;
        match var.bits_per_pixel {
            16 | 24 | 32 if fits(&var.red) && fits(&var.green) && fits(&var.blue) => Ok(Self {
                bytes_per_pixel: var.bits_per_pixel as usize / 8,
                red: var.red,
                green: var.green,
                blue: var.blue,
            }),
            bits_per_pixel => Err(LinuxError::UnsupportedFormat { bits_per_pixel }),
        }
    }

    fn channel(value: u8, field: &FbBitfield) -> u32 {
        ((value as u32) >> (8 - field.length)) << field.offset
    }

    /// Encode `color` as the native-endian bytes of one pixel.
    pub fn encode(&self, color: Color) -> [u8; 4] {
        let value = Self::channel(color.r(), &self.red)
            | Self::channel(color.g(), &self.green)
            | Self::channel(color.b(), &self.blue);
        value.to_ne_bytes()
    }
}

// ============================================================================
// Framebuffer
// ============================================================================

/// Where pixels live inside the mapped video memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageLayout {
    width: usize,
    height: usize,
    line_length: usize,
    format: PixelFormat,
}

impl PageLayout {
    fn page_len(&self) -> usize {
        self.line_length * self.height
    }

    fn write_row(&self, memory: &mut [u8], page: u32, y: u32, x: u32, colors: &[Color]) {
        let bpp = self.format.bytes_per_pixel;
        let start = page as usize * self.page_len() + y as usize * self.line_length + x as usize * bpp;
        let row = &mut memory[start..start + colors.len() * bpp];
        for (pixel, color) in row.chunks_exact_mut(bpp).zip(colors) {
            pixel.copy_from_slice(&self.format.encode(*color)[..bpp]);
        }
    }

    /// Write a full `width * height` frame into `page`.
    fn write_frame(&self, memory: &mut [u8], page: u32, frame: &[Color]) {
        for (y, row) in frame.chunks_exact(self.width).take(self.height).enumerate() {
            self.write_row(memory, page, y as u32, 0, row);
        }
    }
}

/// Split a row-major fill of `area` into the runs that fall inside `bounds`.
///
/// `write` receives the row, the first column and the colors of each run.
fn clipped_rows<I, F>(area: Rect, bounds: Rect, colors: I, mut write: F)
where
    I: IntoIterator<Item = Color>,
    F: FnMut(u32, u32, &[Color]),
{
    let clip = area & bounds;
    let mut colors = colors.into_iter();
    let mut run = Vec::with_capacity(clip.width() as usize);
    for y in area.top()..area.bottom() {
        run.clear();
        for x in area.left()..area.right() {
            let Some(color) = colors.next() else {
                break;
            };
            if clip.contains(Point::new(x, y)) {
                run.push(color);
            }
        }
        if !run.is_empty() {
            write(y as u32, clip.left() as u32, &run);
        }
    }
}

pub struct Framebuffer {
    file: File,
    var: FbVarScreenInfo,
    layout: PageLayout,
    map: NonNull<u8>,
    map_len: usize,
    pages: u32,
    visible: u32,
}

impl Framebuffer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|reason| LinuxError::Open {
                device: Device::Display,
                path: path.display().to_string(),
                reason,
            })?;

        let mut var = get_var(&file)?;
        let format = PixelFormat::from_var(&var)?;
        if var.yres_virtual < var.yres * 2 {
            let mut doubled = var;
            doubled.yres_virtual = var.yres * 2;
            doubled.yoffset = 0;
            // SAFETY: `doubled` is a valid fb_var_screeninfo for the ioctl.
            if unsafe { libc::ioctl(file.as_raw_fd(), FBIOPUT_VSCREENINFO as _, &doubled as *const FbVarScreenInfo) } < 0 {
                warn!("{} refused a second page, drawing single-buffered", path.display());
            }
            var = get_var(&file)?;
        }

        let mut fix = FbFixScreenInfo::default();
        // SAFETY: `fix` is a writable fb_fix_screeninfo for the ioctl.
        if unsafe { libc::ioctl(file.as_raw_fd(), FBIOGET_FSCREENINFO as _, &mut fix as *mut FbFixScreenInfo) } < 0 {
            return Err(LinuxError::ioctl("FBIOGET_FSCREENINFO"));
        }

        let layout = PageLayout {
            width: var.xres as usize,
            height: var.yres as usize,
            line_length: fix.line_length as usize,
            format,
        };
        let map_len = fix.smem_len as usize;
        let pages = if var.yres_virtual >= var.yres * 2 && map_len >= 2 * layout.page_len() {
            2
        } else {
            1
        };

        // SAFETY: mapping the device's own video memory, length from the driver.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        let map = match NonNull::new(addr as *mut u8) {
            Some(map) if addr != libc::MAP_FAILED => map,
            _ => {
                return Err(LinuxError::Mmap {
                    len: map_len,
                    reason: std::io::Error::last_os_error(),
                });
            }
        };

        info!(
            "Framebuffer {} {}x{} at {} bpp, {} page(s)",
            path.display(),
            var.xres,
            var.yres,
            var.bits_per_pixel,
            pages
        );
        let mut fb = Self {
            file,
            var,
            layout,
            map,
            map_len,
            pages,
            visible: 0,
        };
        if pages == 2 {
            fb.pan(0)?;
        }
        Ok(fb)
    }

    pub fn screen_size(&self) -> Size {
        Size::new(self.var.xres, self.var.yres)
    }

    pub fn page_count(&self) -> u32 {
        self.pages
    }

    pub fn format(&self) -> PixelFormat {
        self.layout.format
    }

    fn video_memory(&mut self) -> &mut [u8] {
        // SAFETY: the mapping is `map_len` bytes long and lives as long as `self`.
        unsafe { std::slice::from_raw_parts_mut(self.map.as_ptr(), self.map_len) }
    }

    fn pan(&mut self, page: u32) -> Result<()> {
        let mut var = self.var;
        var.xoffset = 0;
        var.yoffset = page * var.yres;
        // SAFETY: `var` is a valid fb_var_screeninfo for the ioctl.
        if unsafe { libc::ioctl(self.file.as_raw_fd(), FBIOPAN_DISPLAY as _, &var as *const FbVarScreenInfo) } < 0 {
            return Err(LinuxError::ioctl("FBIOPAN_DISPLAY"));
        }
        self.var = var;
        self.visible = page;
        Ok(())
    }

    /// Show a full frame of `width * height` colors.
    ///
    /// With two pages the frame goes to the hidden page, which is then panned
    /// into view; otherwise it overwrites the visible page.
    pub fn show_frame(&mut self, frame: &[Color]) -> Result<()> {
        let layout = self.layout;
        let target = if self.pages == 2 { 1 - self.visible } else { self.visible };
        layout.write_frame(self.video_memory(), target, frame);
        if target != self.visible {
            self.pan(target)?;
            debug!("Panned to page {}", target);
        }
        Ok(())
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        // SAFETY: unmapping the region mapped in `open`; nothing borrows it.
        unsafe {
            libc::munmap(self.map.as_ptr() as *mut libc::c_void, self.map_len);
        }
    }
}

/// Direct drawing into the visible page, for screens shown outside the
/// engine's frame loop.
impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        self.screen_size()
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = Rect::screen(self.screen_size());
        let (layout, page) = (self.layout, self.visible);
        let memory = self.video_memory();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                layout.write_row(memory, page, point.y as u32, point.x as u32, &[Color::from(color)]);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let bounds = Rect::screen(self.screen_size());
        let (layout, page) = (self.layout, self.visible);
        let memory = self.video_memory();
        clipped_rows((*area).into(), bounds, colors.into_iter().map(Color::from), |y, x, run| {
            layout.write_row(memory, page, y, x, run)
        });
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> core::result::Result<(), Self::Error> {
        self.fill_contiguous(area, core::iter::repeat(color))
    }
}

fn get_var(file: &File) -> Result<FbVarScreenInfo> {
    let mut var = FbVarScreenInfo::default();
    // SAFETY: `var` is a writable fb_var_screeninfo for the ioctl.
    if unsafe { libc::ioctl(file.as_raw_fd(), FBIOGET_VSCREENINFO as _, &mut var as *mut FbVarScreenInfo) } < 0 {
        return Err(LinuxError::ioctl("FBIOGET_VSCREENINFO"));
    }
    Ok(var)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_layouts_match_the_kernel() {
        assert_eq!(core::mem::size_of::<FbVarScreenInfo>(), 160);
        let fix = if cfg!(target_pointer_width = "64") { 80 } else { 68 };
        assert_eq!(core::mem::size_of::<FbFixScreenInfo>(), fix);
    }

    #[test]
    fn test_encode_rgb565() {
        let bytes = PixelFormat::RGB565.encode(Color::rgb(0xff, 0x00, 0xff));
        assert_eq!(u16::from_ne_bytes([bytes[0], bytes[1]]), 0xf81f);
    }

    #[test]
    fn test_encode_xrgb8888() {
        let bytes = PixelFormat::XRGB8888.encode(Color::rgb(0x12, 0x34, 0x56));
        assert_eq!(u32::from_ne_bytes(bytes), 0x0012_3456);
    }

    #[test]
    fn test_format_from_driver_fields() {
        let var = FbVarScreenInfo {
            bits_per_pixel: 16,
            red: PixelFormat::RGB565.red,
            green: PixelFormat::RGB565.green,
            blue: PixelFormat::RGB565.blue,
            ..Default::default()
        };
        assert_eq!(PixelFormat::from_var(&var).unwrap(), PixelFormat::RGB565);

        let palette = FbVarScreenInfo {
            bits_per_pixel: 8,
            ..Default::default()
        };
        assert!(matches!(
            PixelFormat::from_var(&palette),
            Err(LinuxError::UnsupportedFormat { bits_per_pixel: 8 })
        ));
    }

    #[test]
    fn test_frame_lands_on_the_hidden_page_only() {
        // 2x2 pixels with a padded 12-byte stride, two pages.
        let layout = PageLayout {
            width: 2,
            height: 2,
            line_length: 12,
            format: PixelFormat::XRGB8888,
        };
        let mut memory = vec![0u8; 2 * layout.page_len()];
        let white = Color::rgb(0xff, 0xff, 0xff);
        layout.write_frame(&mut memory, 1, &[white; 4]);

        let (visible, hidden) = memory.split_at(layout.page_len());
        assert!(visible.iter().all(|b| *b == 0));
        for row in hidden.chunks_exact(12) {
            assert_eq!(u32::from_ne_bytes(row[0..4].try_into().unwrap()), 0x00ff_ffff);
            assert_eq!(u32::from_ne_bytes(row[4..8].try_into().unwrap()), 0x00ff_ffff);
            assert!(row[8..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn test_fill_is_split_into_clipped_row_runs() {
        let red = Color::rgb(0xff, 0, 0);
        let blue = Color::rgb(0, 0, 0xff);
        // 3x3 fill hanging off the top-left corner of a 4x4 screen.
        let area = Rect::new(-1, -1, 2, 2);
        let colors = [red, red, red, red, blue, blue, red, blue, blue];
        let mut runs = Vec::new();
        clipped_rows(area, Rect::new(0, 0, 4, 4), colors, |y, x, run| {
            runs.push((y, x, run.to_vec()))
        });
        assert_eq!(runs, [(0, 0, vec![blue, blue]), (1, 0, vec![blue, blue])]);
    }

    #[test]
    fn test_fill_outside_the_screen_writes_nothing() {
        let mut calls = 0;
        clipped_rows(
            Rect::new(10, 10, 12, 12),
            Rect::new(0, 0, 4, 4),
            core::iter::repeat(Color::rgb(1, 2, 3)),
            |_, _, _| calls += 1,
        );
        assert_eq!(calls, 0);
    }
}
