//! Hardware-independent core of the tactile rendering engine
//!
//! This crate contains everything that does not touch a real device: the
//! geometry and color primitives, the run-length pixel codec, the asset
//! cache, both renderer backends, the control tree and scene management, and
//! the touch classification pipeline.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded Linux targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod cache;
pub mod codec;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod pages;
pub mod pixel_data;
pub mod render;
pub mod scene;

pub use color::{BlendOp, Color, ColorDepth};
pub use error::{Error, Result};
pub use geometry::{Point, Rect, Size};
