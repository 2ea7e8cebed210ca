//! Linux device layer for the tactile engine.
//!
//! - [`evdev`]: touch samples from `/dev/input/event*`
//! - [`touch`]: reader thread feeding the engine over a channel
//! - [`fbdev`]: mmap'd `/dev/fb*` with double buffering via panning
//! - [`blitter`]: surface-backend blitter presenting into the framebuffer

pub mod blitter;
pub mod error;
pub mod evdev;
pub mod fbdev;
pub mod touch;

pub use blitter::FbBlitter;
pub use error::{LinuxError, Result};
pub use evdev::EvdevSource;
pub use fbdev::{Framebuffer, PixelFormat};
pub use touch::{ChannelInput, TOUCH_CHANNEL, TouchMessage};
