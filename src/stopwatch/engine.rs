//! Stopwatch engine implementation.
//!
//! The engine is a monotonic-clock-based state machine. It does not
//! schedule anything itself - [`Stopwatch`](super::Stopwatch) owns the
//! periodic callback and drives the engine; the engine can also be used
//! standalone with the caller reading [`StopwatchEngine::elapsed`] when
//! it needs a value.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> (Paused -> Running)* -> (Paused | Stopped)
//! any -> Stopped via reset
//! ```
//!
//! Elapsed time is reconstructed from the segment ledger: each completed
//! running period is a closed `[start, end)` segment, the open period (if
//! running) is carried by its start instant, and a manual override is
//! folded in as an explicit offset. At all times:
//!
//! ```text
//! elapsed = override + sum(segments) + (now - current_start if running)
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, MonotonicClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// One completed running period `[start, end)` on the monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    start: Instant,
    end: Instant,
}

impl Segment {
    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end.duration_since(self.start)
    }
}

/// Core stopwatch state machine and segment ledger.
///
/// All operations are total: an illegal transition returns `false` and
/// changes nothing. Time is read exclusively from the injected [`Clock`].
#[derive(Debug, Clone)]
pub struct StopwatchEngine<C: Clock = MonotonicClock> {
    clock: C,
    state: TimerState,
    /// Completed running periods, oldest first. Append-only until a reset
    /// or a fresh start.
    segments: Vec<Segment>,
    /// Start of the open running period. Present iff `state == Running`.
    current_start: Option<Instant>,
    /// Manual override remainder, folded into `elapsed()`. Non-zero only
    /// after a `set_elapsed` that could not be expressed by rebasing the
    /// open segment's start instant.
    override_offset: Duration,
}

impl StopwatchEngine<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for StopwatchEngine<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> StopwatchEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: TimerState::Stopped,
            segments: Vec::new(),
            current_start: None,
            override_offset: Duration::ZERO,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Completed running periods, oldest first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total active time: override + closed segments + open running period.
    ///
    /// Non-decreasing while running, constant while paused or stopped.
    pub fn elapsed(&self) -> Duration {
        let closed: Duration = self.segments.iter().map(Segment::duration).sum();
        let open = self
            .current_start
            .map(|start| self.clock.now().duration_since(start))
            .unwrap_or(Duration::ZERO);
        self.override_offset + closed + open
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin or resume counting. Returns `false` when already running.
    ///
    /// Starting from `Stopped` begins a fresh accumulation: leftovers from
    /// a previous run (segments, override) are discarded exactly as
    /// `reset` would discard them. Resuming from `Paused` keeps them.
    pub fn start(&mut self) -> bool {
        match self.state {
            TimerState::Running => false,
            TimerState::Stopped => {
                self.segments.clear();
                self.override_offset = Duration::ZERO;
                self.current_start = Some(self.clock.now());
                self.state = TimerState::Running;
                true
            }
            TimerState::Paused => {
                self.current_start = Some(self.clock.now());
                self.state = TimerState::Running;
                true
            }
        }
    }

    /// Close the open segment and hold the total. Returns `false` unless
    /// running.
    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.close_open_segment();
        self.state = TimerState::Paused;
        true
    }

    /// Close the open segment and end the run. Returns `false` unless
    /// running. Unlike `pause`, a later `start` begins from zero.
    pub fn stop(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.close_open_segment();
        self.state = TimerState::Stopped;
        true
    }

    /// Clear the ledger and return to `Stopped`. Always succeeds, from any
    /// state.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.current_start = None;
        self.override_offset = Duration::ZERO;
        self.state = TimerState::Stopped;
    }

    /// Rebase the accounting so `elapsed()` reads `value` at the instant
    /// of the call. The state is unchanged; while running, counting
    /// continues from `value`, and a resume from `Paused` picks it up.
    /// An override applied while `Stopped` holds only until the next
    /// `start`, which begins fresh. Returns the applied value.
    ///
    /// Negative overrides are unrepresentable: `Duration` is unsigned.
    pub fn set_elapsed(&mut self, value: Duration) -> Duration {
        self.segments.clear();
        self.override_offset = Duration::ZERO;
        if self.state == TimerState::Running {
            let now = self.clock.now();
            match now.checked_sub(value) {
                Some(start) => self.current_start = Some(start),
                None => {
                    // Rebasing would precede the monotonic epoch; anchor
                    // the open segment at `now` and carry the remainder.
                    self.current_start = Some(now);
                    self.override_offset = value;
                }
            }
        } else {
            self.override_offset = value;
        }
        value
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn close_open_segment(&mut self) {
        if let Some(start) = self.current_start.take() {
            let end = self.clock.now();
            self.segments.push(Segment { start, end });
        }
    }
}
