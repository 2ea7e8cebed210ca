use alloc::vec::Vec;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::geometry::Size;
use crate::input::GestureThresholds;
use crate::render::SwapOp;
use crate::scene::SceneId;

/// Which renderer backend a binary should build.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Software,
    /// Hardware 2D blitter (in-memory emulation where none exists).
    Surface,
}

/// Engine settings, stored on disk as a postcard blob.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: u32,
    pub height: u32,
    pub gestures: GestureThresholds,
    /// Longest wait for touch input per engine iteration.
    pub poll_timeout_ms: u32,
    pub swap: SwapOp,
    pub clear_color: Color,
    pub backend: Backend,
    pub initial_scene: SceneId,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            gestures: GestureThresholds::default(),
            poll_timeout_ms: 16,
            swap: SwapOp::Copy,
            clear_color: Color::BLACK,
            backend: Backend::Software,
            initial_scene: 1,
        }
    }
}

impl EngineConfig {
    pub fn screen_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms as u64)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).map_err(|reason| Error::InvalidConfig { reason })
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|reason| Error::InvalidConfig { reason })
    }
}
