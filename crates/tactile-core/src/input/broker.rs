//! Queue between event producers and consumers.
//!
//! Events are delivered exclusively: for each event the subscribers are
//! tried in registration order and the first one returning `true` consumes
//! it. A subscriber stays registered for as long as the [`Subscription`]
//! returned by [`EventBroker::subscribe`] is alive.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use log::debug;

use super::GfxEvent;

type Handler<C> = Box<dyn FnMut(&mut C, &GfxEvent) -> bool>;

struct Subscriber<C> {
    alive: Rc<Cell<bool>>,
    handler: Handler<C>,
}

/// Registration handle. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    alive: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.alive.get()
    }

    /// Unsubscribe now.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.alive.set(false);
    }
}

/// Cloneable publishing end of a broker queue.
#[derive(Clone, Default)]
pub struct Publisher {
    queue: Rc<RefCell<VecDeque<GfxEvent>>>,
}

impl Publisher {
    pub fn publish(&self, event: GfxEvent) {
        self.queue.borrow_mut().push_back(event);
    }
}

/// Event queue with ordered, exclusive subscribers.
///
/// `C` is the context handed to every handler while the queue is drained.
pub struct EventBroker<C> {
    publisher: Publisher,
    subscribers: Vec<Subscriber<C>>,
}

impl<C> Default for EventBroker<C> {
    fn default() -> Self {
        Self {
            publisher: Publisher::default(),
            subscribers: Vec::new(),
        }
    }
}

impl<C> EventBroker<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: GfxEvent) {
        self.publisher.publish(event);
    }

    /// Handle for publishing from elsewhere, including from inside handlers.
    pub fn publisher(&self) -> Publisher {
        self.publisher.clone()
    }

    pub fn pending(&self) -> usize {
        self.publisher.queue.borrow().len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().filter(|s| s.alive.get()).count()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> Subscription
    where
        F: FnMut(&mut C, &GfxEvent) -> bool + 'static,
    {
        let alive = Rc::new(Cell::new(true));
        self.subscribers.push(Subscriber {
            alive: Rc::clone(&alive),
            handler: Box::new(handler),
        });
        Subscription { alive }
    }

    /// Deliver every queued event once. Events published meanwhile stay queued
    /// for the next call. Returns the number of events drained.
    pub fn process_events(&mut self, ctx: &mut C) -> usize {
        self.subscribers.retain(|s| s.alive.get());
        let events = core::mem::take(&mut *self.publisher.queue.borrow_mut());
        let count = events.len();

        for event in &events {
            let consumed = self
                .subscribers
                .iter_mut()
                .filter(|s| s.alive.get())
                .any(|s| (s.handler)(ctx, event));
            if !consumed {
                debug!("Unconsumed event {:?}", event);
            }
        }
        count
    }
}
