//! Synchronous publish/subscribe channel for stopwatch events.
//!
//! Delivery happens on the emitting thread: every subscriber registered at
//! the moment of `publish` runs before `publish` returns. Subscriber
//! ordering within one emission is unspecified.

use std::sync::{Arc, Mutex};

use crate::events::Event;

type Subscriber = Box<dyn Fn(&Event) + Send + Sync>;

/// A cloneable handle to a set of event subscribers.
///
/// Clones share the subscriber list, so the stopwatch and its periodic
/// callback can publish to the same observers.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It receives every subsequent emission.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        subscribers.push(Box::new(observer));
    }

    /// Deliver `event` to all current subscribers, synchronously.
    pub fn publish(&self, event: &Event) {
        let subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for subscriber in subscribers.iter() {
            subscriber(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
