//! Touch reading on a dedicated thread.
//!
//! The reader thread blocks in `poll(2)` on the evdev node, classifies the
//! samples and hands finished events to the engine thread over an
//! `embassy-sync` channel. The engine side drains the channel from its own
//! loop, waiting at most its poll timeout.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{error, info, warn};
use tactile_core::error::{Device, Error, Result};
use tactile_core::input::{InputReader, SampleSource, TouchEvent, TouchInput};

/// Channel capacity for classified touch events
pub const TOUCH_CAPACITY: usize = 32;

/// Longest single sleep while the engine waits for touch events.
const WAIT_STEP: Duration = Duration::from_millis(2);

/// How long the reader thread blocks in one `poll(2)` call.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchMessage {
    Event(TouchEvent),
    /// The device failed; the reader thread has exited.
    Failed { errno: i32 },
}

pub type TouchChannel = Channel<CriticalSectionRawMutex, TouchMessage, TOUCH_CAPACITY>;

/// Global channel between the touch thread and the engine
pub static TOUCH_CHANNEL: TouchChannel = Channel::new();

/// Start the reader thread on `source`.
pub fn spawn<S>(source: S, channel: &'static TouchChannel) -> io::Result<JoinHandle<()>>
where
    S: SampleSource + Send + 'static,
{
    thread::Builder::new()
        .name("touch".into())
        .spawn(move || read_loop(InputReader::new(source), channel))
}

fn read_loop<S: SampleSource>(mut reader: InputReader<S>, channel: &TouchChannel) {
    info!("Touch reader running");
    let mut events = Vec::new();
    loop {
        events.clear();
        match reader.poll(READ_TIMEOUT, &mut events) {
            Ok(_) => {
                for event in events.drain(..) {
                    if channel.try_send(TouchMessage::Event(event)).is_err() {
                        warn!("Touch channel full, dropping {:?}", event.kind);
                    }
                }
            }
            Err(e) => {
                error!("Touch reader stopped: {}", e);
                let errno = match e {
                    Error::DeviceIo { errno, .. } => errno,
                    _ => libc::EIO,
                };
                // Make room so the engine learns about the failure.
                while channel.try_send(TouchMessage::Failed { errno }).is_err() {
                    let _ = channel.try_receive();
                }
                return;
            }
        }
    }
}

/// Engine end of a [`TouchChannel`].
pub struct ChannelInput {
    channel: &'static TouchChannel,
}

impl ChannelInput {
    pub fn new(channel: &'static TouchChannel) -> Self {
        Self { channel }
    }
}

impl TouchInput for ChannelInput {
    fn poll(&mut self, timeout: Duration, events: &mut Vec<TouchEvent>) -> Result<usize> {
        let deadline = Instant::now() + timeout;
        let before = events.len();
        loop {
            while let Ok(message) = self.channel.try_receive() {
                match message {
                    TouchMessage::Event(event) => events.push(event),
                    TouchMessage::Failed { errno } => {
                        return Err(Error::DeviceIo {
                            device: Device::Touch,
                            errno,
                        });
                    }
                }
            }
            let now = Instant::now();
            if events.len() > before || now >= deadline {
                break;
            }
            thread::sleep(WAIT_STEP.min(deadline - now));
        }
        Ok(events.len() - before)
    }

    /// Discard queued events.
    fn reset(&mut self) {
        self.channel.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tactile_core::input::raw::{ABS_X, ABS_Y, BTN_TOUCH, EV_ABS, EV_KEY};
    use tactile_core::input::{RawSample, TouchKind};
    use tactile_core::Point;

    /// Source fed from the test thread; reports ENODEV once exhausted.
    struct Scripted {
        samples: Arc<Mutex<Vec<RawSample>>>,
    }

    impl SampleSource for Scripted {
        fn read(&mut self, _timeout: Duration, out: &mut Vec<RawSample>) -> Result<usize> {
            let mut samples = self.samples.lock().unwrap();
            if samples.is_empty() {
                return Err(Error::DeviceIo {
                    device: Device::Touch,
                    errno: libc::ENODEV,
                });
            }
            let n = samples.len();
            out.append(&mut samples);
            Ok(n)
        }
    }

    #[test]
    fn test_events_cross_threads_then_failure_is_reported() {
        static CHANNEL: TouchChannel = Channel::new();
        let t = Duration::ZERO;
        let samples = vec![
            RawSample::new(t, EV_KEY, BTN_TOUCH, 1),
            RawSample::new(t, EV_ABS, ABS_X, 7),
            RawSample::new(t, EV_ABS, ABS_Y, 9),
            RawSample::report(t),
            RawSample::new(t, EV_KEY, BTN_TOUCH, 0),
            RawSample::report(t),
        ];
        let source = Scripted {
            samples: Arc::new(Mutex::new(samples)),
        };
        spawn(source, &CHANNEL).unwrap().join().unwrap();

        let mut input = ChannelInput::new(&CHANNEL);
        let mut events = Vec::new();
        let err = input.poll(Duration::from_millis(5), &mut events).unwrap_err();
        assert_eq!(
            err,
            Error::DeviceIo {
                device: Device::Touch,
                errno: libc::ENODEV
            }
        );
        let kinds: Vec<TouchKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [TouchKind::Press, TouchKind::Lift]);
        assert_eq!(events[0].point, Point::new(7, 9));
    }

    #[test]
    fn test_poll_times_out_empty() {
        static CHANNEL: TouchChannel = Channel::new();
        let mut input = ChannelInput::new(&CHANNEL);
        let mut events = Vec::new();
        let started = Instant::now();
        assert_eq!(input.poll(Duration::from_millis(10), &mut events).unwrap(), 0);
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_reset_discards_queued_events() {
        static CHANNEL: TouchChannel = Channel::new();
        let event = TouchEvent::press(Duration::ZERO, Point::zero());
        CHANNEL.try_send(TouchMessage::Event(event)).unwrap();
        let mut input = ChannelInput::new(&CHANNEL);
        input.reset();
        let mut events = Vec::new();
        assert_eq!(input.poll(Duration::ZERO, &mut events).unwrap(), 0);
    }
}
