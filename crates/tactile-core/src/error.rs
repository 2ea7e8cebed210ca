//! Engine-wide error type.
//!
//! Cache and scene-registry failures point at packaging or programming
//! defects and are returned to the caller as-is; nothing here retries.

use thiserror_no_std::Error;

use crate::codec::CodecError;

/// Device an I/O failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Touch,
    Display,
}

impl core::fmt::Display for Device {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Device::Touch => f.write_str("touch"),
            Device::Display => f.write_str("display"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No pixel data or texture is registered under this id
    #[error("Asset {id} not found")]
    AssetNotFound { id: u32 },

    /// An asset with this id was already registered
    #[error("Asset {id} already exists")]
    AssetAlreadyExists { id: u32 },

    /// The compressed stream of an asset is malformed
    #[error("Failed to decode asset {id}: {reason}")]
    Decode { id: u32, reason: CodecError },

    /// A blit referenced a surface the blitter never created
    #[error("Surface {handle} not found")]
    SurfaceNotFound { handle: u32 },

    /// A control id is stale or was never issued by this tree
    #[error("Control {index} not found")]
    ControlNotFound { index: u32 },

    /// No factory is registered for the requested scene id
    #[error("Scene {id} not found")]
    SceneNotFound { id: u32 },

    /// Input or rendering was attempted before any scene was activated
    #[error("No active scene")]
    ActiveSceneNotSet,

    /// A stored configuration blob could not be decoded
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: postcard::Error },

    /// Opening or reading a device failed
    #[error("{device} device I/O error (errno {errno})")]
    DeviceIo { device: Device, errno: i32 },
}

/// Result type for engine operations
pub type Result<T> = core::result::Result<T, Error>;
