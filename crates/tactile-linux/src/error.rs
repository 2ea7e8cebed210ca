use std::io;

use tactile_core::error::Device;
use thiserror_no_std::Error;

/// Failures setting up or driving the Linux devices.
#[derive(Debug, Error)]
pub enum LinuxError {
    /// A device node could not be opened
    #[error("Cannot open {device} device {path}: {reason}")]
    Open {
        device: Device,
        path: String,
        reason: io::Error,
    },

    /// A device ioctl was rejected
    #[error("{request} failed: {reason}")]
    Ioctl { request: &'static str, reason: io::Error },

    /// Video memory could not be mapped
    #[error("mmap of {len} bytes failed: {reason}")]
    Mmap { len: usize, reason: io::Error },

    /// Reading or waiting on a device failed
    #[error("{device} I/O failed: {reason}")]
    Io { device: Device, reason: io::Error },

    /// The framebuffer uses a pixel layout the blitter cannot write
    #[error("Unsupported framebuffer format: {bits_per_pixel} bits per pixel")]
    UnsupportedFormat { bits_per_pixel: u32 },
}

pub type Result<T> = core::result::Result<T, LinuxError>;

impl LinuxError {
    /// Capture `errno` of the failed libc call.
    pub(crate) fn ioctl(request: &'static str) -> Self {
        LinuxError::Ioctl {
            request,
            reason: io::Error::last_os_error(),
        }
    }

    pub fn errno(&self) -> i32 {
        match self {
            LinuxError::Open { reason, .. }
            | LinuxError::Ioctl { reason, .. }
            | LinuxError::Mmap { reason, .. }
            | LinuxError::Io { reason, .. } => reason.raw_os_error().unwrap_or(libc::EIO),
            LinuxError::UnsupportedFormat { .. } => libc::EINVAL,
        }
    }

    fn device(&self) -> Device {
        match self {
            LinuxError::Open { device, .. } | LinuxError::Io { device, .. } => *device,
            _ => Device::Display,
        }
    }
}

/// The engine only sees the device and errno; the details are logged where
/// the error is caught.
impl From<LinuxError> for tactile_core::Error {
    fn from(e: LinuxError) -> Self {
        tactile_core::Error::DeviceIo {
            device: e.device(),
            errno: e.errno(),
        }
    }
}
