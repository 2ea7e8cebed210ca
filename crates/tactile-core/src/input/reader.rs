use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::time::Duration;

use super::{RawSample, TouchClassifier, TouchEvent};
use crate::error::Result;

/// Producer of raw driver samples.
pub trait SampleSource {
    /// Append available samples to `out`, waiting at most `timeout` for the
    /// first one. Returns the number appended; zero means the wait timed out.
    fn read(&mut self, timeout: Duration, out: &mut Vec<RawSample>) -> Result<usize>;
}

/// In-memory source fed by the caller.
///
/// Used by the desktop simulator (mouse input is translated into driver
/// samples) and by tests. Never waits.
#[derive(Debug, Default)]
pub struct QueueSource {
    pending: VecDeque<RawSample>,
}

impl QueueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: RawSample) {
        self.pending.push_back(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = RawSample>) {
        self.pending.extend(samples);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl SampleSource for QueueSource {
    fn read(&mut self, _timeout: Duration, out: &mut Vec<RawSample>) -> Result<usize> {
        let n = self.pending.len();
        out.extend(self.pending.drain(..));
        Ok(n)
    }
}

/// Shared source: the engine reads while the owner of another handle keeps
/// feeding it (the simulator's mouse handler).
impl<S: SampleSource> SampleSource for Rc<RefCell<S>> {
    fn read(&mut self, timeout: Duration, out: &mut Vec<RawSample>) -> Result<usize> {
        self.borrow_mut().read(timeout, out)
    }
}

/// A sample source paired with the classifier that interprets it.
pub struct InputReader<S: SampleSource> {
    source: S,
    classifier: TouchClassifier,
    samples: Vec<RawSample>,
}

impl<S: SampleSource> InputReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            classifier: TouchClassifier::new(),
            samples: Vec::new(),
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Drop any half-read gesture.
    pub fn reset(&mut self) {
        self.classifier.reset();
    }

    /// Wait up to `timeout` for samples and classify them.
    pub fn poll(&mut self, timeout: Duration, events: &mut Vec<TouchEvent>) -> Result<usize> {
        self.samples.clear();
        self.source.read(timeout, &mut self.samples)?;
        let before = events.len();
        for sample in &self.samples {
            if let Some(event) = self.classifier.push(sample) {
                events.push(event);
            }
        }
        Ok(events.len() - before)
    }
}

/// Object-safe view of an [`InputReader`], so the engine can hold any source.
pub trait TouchInput {
    fn poll(&mut self, timeout: Duration, events: &mut Vec<TouchEvent>) -> Result<usize>;

    fn reset(&mut self);
}

impl<S: SampleSource> TouchInput for InputReader<S> {
    fn poll(&mut self, timeout: Duration, events: &mut Vec<TouchEvent>) -> Result<usize> {
        InputReader::poll(self, timeout, events)
    }

    fn reset(&mut self) {
        InputReader::reset(self);
    }
}
