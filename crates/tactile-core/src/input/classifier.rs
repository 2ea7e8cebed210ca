//! Raw sample frames to Press / Drag / Lift.
//!
//! The driver reports a contact as a frame of samples closed by
//! `EV_SYN/SYN_REPORT`. Within a frame only the last X and Y count, so one
//! frame yields at most one event:
//!
//! | frame contains                                   | state   | event |
//! |--------------------------------------------------|---------|-------|
//! | tracking id ≥ 0 or `BTN_TOUCH 1`                 | idle    | Press |
//! | tracking id −1 or `BTN_TOUCH 0`                  | touched | Lift  |
//! | X/Y that differ from the last delivered position | touched | Drag  |
//!
//! A frame whose position did not change produces nothing. After
//! `SYN_DROPPED` the rest of the frame is discarded.

use log::{debug, warn};

use super::raw::*;
use super::{TouchEvent, TouchKind};
use crate::geometry::Point;

#[derive(Debug, Default, Clone, Copy)]
struct Frame {
    start: bool,
    end: bool,
    x: Option<i32>,
    y: Option<i32>,
}

#[derive(Debug, Default)]
pub struct TouchClassifier {
    frame: Frame,
    dropping: bool,
    touching: bool,
    position: Point,
    /// Position of the last delivered event.
    reported: Point,
    press_point: Point,
    press_time: core::time::Duration,
}

impl TouchClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is in progress.
    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// Forget any gesture in progress without emitting a Lift.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one sample; returns an event when it closes a frame.
    pub fn push(&mut self, sample: &RawSample) -> Option<TouchEvent> {
        match (sample.kind, sample.code) {
            (EV_SYN, SYN_REPORT) => {
                let frame = core::mem::take(&mut self.frame);
                if core::mem::replace(&mut self.dropping, false) {
                    return None;
                }
                self.finish(frame, sample.time)
            }
            (EV_SYN, SYN_DROPPED) => {
                warn!("Touch driver dropped samples, discarding frame");
                self.frame = Frame::default();
                self.dropping = true;
                None
            }
            _ if self.dropping => None,
            (EV_ABS, ABS_MT_TRACKING_ID) => {
                if sample.value == TRACKING_RELEASED {
                    self.frame.end = true;
                } else {
                    self.frame.start = true;
                }
                None
            }
            (EV_KEY, BTN_TOUCH) => {
                if sample.value != 0 {
                    self.frame.start = true;
                } else {
                    self.frame.end = true;
                }
                None
            }
            (EV_ABS, ABS_X | ABS_MT_POSITION_X) => {
                self.frame.x = Some(sample.value);
                None
            }
            (EV_ABS, ABS_Y | ABS_MT_POSITION_Y) => {
                self.frame.y = Some(sample.value);
                None
            }
            _ => None,
        }
    }

    fn finish(&mut self, frame: Frame, time: core::time::Duration) -> Option<TouchEvent> {
        if let Some(x) = frame.x {
            self.position.x = x;
        }
        if let Some(y) = frame.y {
            self.position.y = y;
        }

        let kind = if !self.touching && frame.start && !frame.end {
            self.touching = true;
            self.press_point = self.position;
            self.press_time = time;
            TouchKind::Press
        } else if self.touching && frame.end {
            self.touching = false;
            TouchKind::Lift
        } else if self.touching && self.position != self.reported {
            TouchKind::Drag
        } else {
            return None;
        };

        self.reported = self.position;
        let event = TouchEvent {
            timestamp: time,
            kind,
            point: self.position,
            press_point: self.press_point,
            press_time: self.press_time,
        };
        debug!("Touch {:?} at ({}, {})", kind, event.point.x, event.point.y);
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn abs(t: u64, code: u16, value: i32) -> RawSample {
        RawSample::new(ms(t), EV_ABS, code, value)
    }

    fn classify(samples: &[RawSample]) -> Vec<TouchEvent> {
        let mut c = TouchClassifier::new();
        samples.iter().filter_map(|s| c.push(s)).collect()
    }

    #[test]
    fn test_press_drag_lift() {
        let events = classify(&[
            abs(0, ABS_MT_TRACKING_ID, 7),
            abs(0, ABS_MT_POSITION_X, 10),
            abs(0, ABS_MT_POSITION_Y, 10),
            RawSample::report(ms(0)),
            abs(16, ABS_MT_POSITION_X, 12),
            abs(16, ABS_MT_POSITION_Y, 11),
            RawSample::report(ms(16)),
            abs(32, ABS_MT_TRACKING_ID, TRACKING_RELEASED),
            RawSample::report(ms(32)),
        ]);

        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [TouchKind::Press, TouchKind::Drag, TouchKind::Lift]);
        assert_eq!(events[1].point, Point::new(12, 11));
        assert_eq!(events[1].press_point, Point::new(10, 10));
        assert_eq!(events[1].press_time, ms(0));
        assert_eq!(events[2].point, Point::new(12, 11));
        assert_eq!(events[2].timestamp, ms(32));
    }

    #[test]
    fn test_frame_coalesces_to_last_position() {
        let events = classify(&[
            RawSample::new(ms(0), EV_KEY, BTN_TOUCH, 1),
            abs(0, ABS_X, 1),
            abs(0, ABS_X, 5),
            abs(0, ABS_Y, 9),
            RawSample::report(ms(0)),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].point, Point::new(5, 9));
    }

    #[test]
    fn test_zero_movement_drag_is_dropped() {
        let events = classify(&[
            abs(0, ABS_MT_TRACKING_ID, 1),
            abs(0, ABS_MT_POSITION_X, 3),
            RawSample::report(ms(0)),
            abs(8, ABS_MT_POSITION_X, 3),
            RawSample::report(ms(8)),
            RawSample::report(ms(9)),
        ]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_btn_touch_release_lifts() {
        let events = classify(&[
            RawSample::new(ms(0), EV_KEY, BTN_TOUCH, 1),
            RawSample::report(ms(0)),
            RawSample::new(ms(5), EV_KEY, BTN_TOUCH, 0),
            RawSample::report(ms(5)),
        ]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, TouchKind::Lift);
    }

    #[test]
    fn test_dropped_frame_is_discarded() {
        let events = classify(&[
            abs(0, ABS_MT_TRACKING_ID, 1),
            RawSample::new(ms(0), EV_SYN, SYN_DROPPED, 0),
            abs(0, ABS_MT_POSITION_X, 50),
            RawSample::report(ms(0)),
            abs(4, ABS_MT_TRACKING_ID, 1),
            RawSample::report(ms(4)),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].point, Point::zero());
        assert_eq!(events[0].timestamp, ms(4));
    }

    #[test]
    fn test_lift_without_press_is_ignored() {
        let events = classify(&[
            abs(0, ABS_MT_TRACKING_ID, TRACKING_RELEASED),
            RawSample::report(ms(0)),
        ]);
        assert!(events.is_empty());
    }
}
