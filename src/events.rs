use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::stopwatch::TimerState;

/// Every notification the stopwatch emits is an Event.
///
/// The `at` wall-clock stamp is for display and diagnostics only; elapsed
/// values are always computed on the monotonic clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Current elapsed time. Emitted at the tick rate while running, and
    /// once at the moment of pause/stop/reset.
    Tick {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// The state machine moved to a new state.
    StateChanged {
        state: TimerState,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn tick(elapsed: Duration) -> Self {
        Event::Tick {
            elapsed_ms: elapsed.as_millis() as u64,
            at: Utc::now(),
        }
    }

    pub fn state_changed(state: TimerState) -> Self {
        Event::StateChanged {
            state,
            at: Utc::now(),
        }
    }

    /// Elapsed milliseconds carried by a `Tick`, if this is one.
    pub fn elapsed_ms(&self) -> Option<u64> {
        match self {
            Event::Tick { elapsed_ms, .. } => Some(*elapsed_ms),
            _ => None,
        }
    }
}
