//! Touch samples from an evdev character device.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use tactile_core::error::Device;
use tactile_core::input::{RawSample, RecordLayout, SampleSource};

use crate::error::{LinuxError, Result};

/// Records fetched per `read`.
const READ_BATCH: usize = 64;

/// Non-blocking evdev reader that waits with `poll(2)`.
pub struct EvdevSource {
    file: File,
    layout: RecordLayout,
    buf: Vec<u8>,
    /// Bytes of a record split across two reads.
    partial: usize,
}

impl EvdevSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_CLOEXEC)
            .open(path)
            .map_err(|reason| LinuxError::Open {
                device: Device::Touch,
                path: path.display().to_string(),
                reason,
            })?;
        info!("Touch device {} opened", path.display());
        Ok(Self::from_file(file, RecordLayout::NATIVE))
    }

    pub fn from_file(file: File, layout: RecordLayout) -> Self {
        Self {
            file,
            layout,
            buf: vec![0; READ_BATCH * layout.record_size()],
            partial: 0,
        }
    }

    /// Wait until the device is readable. Returns `false` on timeout.
    fn wait(&self, timeout: Duration) -> Result<bool> {
        let mut fds = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        // SAFETY: `fds` is a valid pollfd for the duration of the call.
        let ready = unsafe { libc::poll(&mut fds, 1, millis) };
        match ready {
            0 => Ok(false),
            n if n > 0 => {
                if fds.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                    return Err(LinuxError::Io {
                        device: Device::Touch,
                        reason: io::Error::from_raw_os_error(libc::ENODEV),
                    });
                }
                Ok(true)
            }
            _ => {
                let reason = io::Error::last_os_error();
                if reason.kind() == io::ErrorKind::Interrupted {
                    return Ok(false);
                }
                Err(LinuxError::Io {
                    device: Device::Touch,
                    reason,
                })
            }
        }
    }

    /// Read whatever is queued without blocking.
    fn drain(&mut self, out: &mut Vec<RawSample>) -> Result<usize> {
        let record = self.layout.record_size();
        let before = out.len();
        loop {
            match self.file.read(&mut self.buf[self.partial..]) {
                Ok(0) => break,
                Ok(n) => {
                    let filled = self.partial + n;
                    let whole = filled - filled % record;
                    out.extend(RawSample::parse_all(&self.buf[..whole], self.layout));
                    self.buf.copy_within(whole..filled, 0);
                    self.partial = filled - whole;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(reason) => {
                    return Err(LinuxError::Io {
                        device: Device::Touch,
                        reason,
                    });
                }
            }
        }
        Ok(out.len() - before)
    }

    /// Wait up to `timeout` and read the queued samples.
    pub fn read_samples(&mut self, timeout: Duration, out: &mut Vec<RawSample>) -> Result<usize> {
        if !self.wait(timeout)? {
            return Ok(0);
        }
        let n = self.drain(out)?;
        if n > 0 {
            debug!("Read {} touch samples", n);
        }
        Ok(n)
    }
}

impl SampleSource for EvdevSource {
    fn read(&mut self, timeout: Duration, out: &mut Vec<RawSample>) -> tactile_core::Result<usize> {
        Ok(self.read_samples(timeout, out)?)
    }
}
