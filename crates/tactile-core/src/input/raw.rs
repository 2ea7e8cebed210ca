//! Raw touch-driver records.
//!
//! The driver emits fixed-size records `{sec, usec, type: u16, code: u16,
//! value: u32}`. The time fields are `long`-sized, so a record is 16 bytes on
//! 32-bit targets and 24 bytes on 64-bit ones. Fields are native-endian.

use core::time::Duration;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0;
/// The driver's buffer overran; discard until the next report.
pub const SYN_DROPPED: u16 = 3;

pub const BTN_TOUCH: u16 = 0x14a;

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;

/// Tracking id value marking the end of a contact.
pub const TRACKING_RELEASED: i32 = -1;

/// Width of the time fields in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// 32-bit `sec`/`usec`, 16-byte records.
    Time32,
    /// 64-bit `sec`/`usec`, 24-byte records.
    Time64,
}

impl RecordLayout {
    /// Layout used by the target this crate is compiled for.
    pub const NATIVE: RecordLayout = if cfg!(target_pointer_width = "64") {
        RecordLayout::Time64
    } else {
        RecordLayout::Time32
    };

    pub const fn record_size(self) -> usize {
        match self {
            RecordLayout::Time32 => 16,
            RecordLayout::Time64 => 24,
        }
    }

    const fn time_size(self) -> usize {
        match self {
            RecordLayout::Time32 => 4,
            RecordLayout::Time64 => 8,
        }
    }
}

/// One decoded driver record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub time: Duration,
    pub kind: u16,
    pub code: u16,
    /// Stored signed: tracking ids use -1 as the release sentinel.
    pub value: i32,
}

impl RawSample {
    pub const fn new(time: Duration, kind: u16, code: u16, value: i32) -> Self {
        Self {
            time,
            kind,
            code,
            value,
        }
    }

    /// End-of-frame marker.
    pub const fn report(time: Duration) -> Self {
        Self::new(time, EV_SYN, SYN_REPORT, 0)
    }

    pub const fn is_report(&self) -> bool {
        self.kind == EV_SYN && self.code == SYN_REPORT
    }

    /// Decode one record. Returns `None` if `bytes` is shorter than a record.
    pub fn parse(bytes: &[u8], layout: RecordLayout) -> Option<Self> {
        if bytes.len() < layout.record_size() {
            return None;
        }
        let t = layout.time_size();
        let (sec, usec) = match layout {
            RecordLayout::Time32 => (
                u32::from_ne_bytes(bytes[0..4].try_into().ok()?) as u64,
                u32::from_ne_bytes(bytes[4..8].try_into().ok()?) as u64,
            ),
            RecordLayout::Time64 => (
                u64::from_ne_bytes(bytes[0..8].try_into().ok()?),
                u64::from_ne_bytes(bytes[8..16].try_into().ok()?),
            ),
        };
        let rest = &bytes[2 * t..];
        let kind = u16::from_ne_bytes(rest[0..2].try_into().ok()?);
        let code = u16::from_ne_bytes(rest[2..4].try_into().ok()?);
        let value = i32::from_ne_bytes(rest[4..8].try_into().ok()?);
        let time = Duration::from_secs(sec) + Duration::from_micros(usec);
        Some(Self::new(time, kind, code, value))
    }

    /// Decode every whole record in `bytes`; a trailing partial record is
    /// ignored.
    pub fn parse_all(bytes: &[u8], layout: RecordLayout) -> impl Iterator<Item = RawSample> + '_ {
        bytes
            .chunks_exact(layout.record_size())
            .filter_map(move |chunk| Self::parse(chunk, layout))
    }

    /// Encode in the given layout, the inverse of [`RawSample::parse`].
    pub fn write_to(&self, out: &mut alloc::vec::Vec<u8>, layout: RecordLayout) {
        let sec = self.time.as_secs();
        let usec = self.time.subsec_micros() as u64;
        match layout {
            RecordLayout::Time32 => {
                out.extend_from_slice(&(sec as u32).to_ne_bytes());
                out.extend_from_slice(&(usec as u32).to_ne_bytes());
            }
            RecordLayout::Time64 => {
                out.extend_from_slice(&sec.to_ne_bytes());
                out.extend_from_slice(&usec.to_ne_bytes());
            }
        }
        out.extend_from_slice(&self.kind.to_ne_bytes());
        out.extend_from_slice(&self.code.to_ne_bytes());
        out.extend_from_slice(&self.value.to_ne_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_parse_both_layouts() {
        let sample = RawSample::new(
            Duration::from_micros(3_000_250),
            EV_ABS,
            ABS_MT_TRACKING_ID,
            TRACKING_RELEASED,
        );
        for layout in [RecordLayout::Time32, RecordLayout::Time64] {
            let mut bytes = Vec::new();
            sample.write_to(&mut bytes, layout);
            assert_eq!(bytes.len(), layout.record_size());
            assert_eq!(RawSample::parse(&bytes, layout), Some(sample));
        }
    }

    #[test]
    fn test_parse_all_skips_partial_record() {
        let mut bytes = Vec::new();
        RawSample::report(Duration::from_secs(1)).write_to(&mut bytes, RecordLayout::Time32);
        RawSample::new(Duration::from_secs(1), EV_ABS, ABS_X, 40).write_to(&mut bytes, RecordLayout::Time32);
        bytes.extend_from_slice(&[0; 5]);

        let samples: Vec<_> = RawSample::parse_all(&bytes, RecordLayout::Time32).collect();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].is_report());
        assert_eq!(samples[1].value, 40);
        assert_eq!(RawSample::parse(&bytes[..10], RecordLayout::Time32), None);
    }
}
