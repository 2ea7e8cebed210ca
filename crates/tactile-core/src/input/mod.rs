//! Touch input pipeline
//!
//! Raw driver records ([`raw`]) are grouped into frames and classified into
//! Press / Drag / Lift [`TouchEvent`]s ([`classifier`]), pulled through a
//! bounded-wait [`SampleSource`] ([`reader`]) and handed to consumers by the
//! [`EventBroker`] ([`broker`]).

pub mod broker;
pub mod classifier;
pub mod raw;
pub mod reader;

use core::time::Duration;

use serde::{Deserialize, Serialize};

pub use broker::{EventBroker, Publisher, Subscription};
pub use classifier::TouchClassifier;
pub use raw::{RawSample, RecordLayout};
pub use reader::{InputReader, QueueSource, SampleSource, TouchInput};

use crate::geometry::Point;
use crate::scene::Action;

/// Phase of a touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    Press,
    Drag,
    Lift,
}

/// One classified touch sample.
///
/// `press_point` and `press_time` describe the Press that started the
/// gesture; on the Press itself they equal `point` and `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub timestamp: Duration,
    pub kind: TouchKind,
    pub point: Point,
    pub press_point: Point,
    pub press_time: Duration,
}

impl TouchEvent {
    pub fn press(timestamp: Duration, point: Point) -> Self {
        Self {
            timestamp,
            kind: TouchKind::Press,
            point,
            press_point: point,
            press_time: timestamp,
        }
    }

    /// Time since the gesture started.
    pub fn held_for(&self) -> Duration {
        self.timestamp.saturating_sub(self.press_time)
    }

    /// Offset from the press point.
    pub fn delta(&self) -> Point {
        self.point - self.press_point
    }

    /// What kind of gesture ended with this event. Only a Lift ends one.
    pub fn gesture(&self, thresholds: &GestureThresholds) -> Option<Gesture> {
        if self.kind != TouchKind::Lift {
            return None;
        }
        let d = self.delta();
        let distance = thresholds.drag_distance as i64;
        if (d.x as i64).pow(2) + (d.y as i64).pow(2) >= distance * distance {
            Some(Gesture::Drag)
        } else if self.held_for() >= thresholds.long_press() {
            Some(Gesture::LongPress)
        } else {
            Some(Gesture::Tap)
        }
    }
}

/// A completed Press→Lift run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap,
    LongPress,
    Drag,
}

/// Limits separating taps from long presses and drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureThresholds {
    pub long_press_ms: u32,
    /// Travel in pixels from the press point beyond which a gesture is a drag.
    pub drag_distance: u32,
}

impl GestureThresholds {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms as u64)
    }
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            long_press_ms: 600,
            drag_distance: 12,
        }
    }
}

/// Everything carried through the [`EventBroker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GfxEvent {
    Touch(TouchEvent),
    Action(Action),
    Quit,
}
