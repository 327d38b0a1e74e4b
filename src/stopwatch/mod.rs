//! The self-scheduling stopwatch.
//!
//! [`StopwatchEngine`] is the pure accounting state machine;
//! [`Stopwatch`] wraps it with the pieces the engine deliberately does
//! not own: the periodic tick callback (held only while running), the
//! event bus, and the mutex that serializes every operation. Callers on
//! any thread get the single-threaded contract of the engine.

mod engine;

pub use engine::{Segment, StopwatchEngine, TimerState};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use crate::bus::EventBus;
use crate::clock::{Clock, MonotonicClock};
use crate::config::StopwatchConfig;
use crate::error::Result;
use crate::events::Event;
use crate::ticker::{TickHandle, Ticker, TokioTicker};

struct Shared<C: Clock> {
    engine: StopwatchEngine<C>,
    /// Present iff the engine is running; owning it here keeps callback
    /// teardown inside the same critical section as the state change.
    ticker_handle: Option<TickHandle>,
}

/// A stopwatch that notifies observers of its elapsed time.
///
/// While running, a `Tick` event is published at the configured tick
/// rate; `pause`, `stop`, and `reset` each publish one final `Tick` at
/// the moment of transition. State changes publish `StateChanged`.
///
/// Ticker cancellation is best-effort, so a callback scheduled before a
/// transition may still fire after it; such callbacks find the engine no
/// longer running and emit nothing.
pub struct Stopwatch<C: Clock + Send + 'static = MonotonicClock, T: Ticker = TokioTicker> {
    shared: Arc<Mutex<Shared<C>>>,
    ticker: T,
    bus: EventBus,
    tick_rate: Duration,
}

impl Stopwatch {
    /// Build with the process monotonic clock and a ticker bound to the
    /// current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime context; use
    /// [`Stopwatch::with_parts`] and [`TokioTicker::with_handle`] from
    /// synchronous code.
    pub fn new(config: StopwatchConfig) -> Result<Self> {
        Self::with_parts(MonotonicClock, TokioTicker::new(), config)
    }
}

impl<C: Clock + Send + 'static, T: Ticker> Stopwatch<C, T> {
    pub fn with_parts(clock: C, ticker: T, config: StopwatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Mutex::new(Shared {
                engine: StopwatchEngine::with_clock(clock),
                ticker_handle: None,
            })),
            ticker,
            bus: EventBus::new(),
            tick_rate: config.tick_rate(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.lock().engine.state()
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().engine.elapsed()
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Register an observer for tick and state-change events. Delivery is
    /// synchronous on the emitting thread.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.subscribe(observer);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin or resume counting and schedule periodic ticks. Returns
    /// `false` when already running.
    pub fn start(&self) -> bool {
        {
            let mut shared = self.lock();
            if !shared.engine.start() {
                return false;
            }
            let handle = self.ticker.schedule(self.tick_rate, self.tick_callback());
            shared.ticker_handle = Some(handle);
        }
        debug!(tick_rate_ms = self.tick_rate.as_millis() as u64, "stopwatch started");
        self.bus.publish(&Event::state_changed(TimerState::Running));
        true
    }

    /// Hold the current total and cancel periodic ticks. Returns `false`
    /// unless running.
    pub fn pause(&self) -> bool {
        self.leave_running(TimerState::Paused)
    }

    /// End the run and cancel periodic ticks. Returns `false` unless
    /// running. A later `start` begins from zero.
    pub fn stop(&self) -> bool {
        self.leave_running(TimerState::Stopped)
    }

    /// Return to `Stopped` with a zero ledger, from any state. Publishes
    /// a zero tick, and a state change if the state actually moved.
    pub fn reset(&self) {
        let (was, handle) = {
            let mut shared = self.lock();
            let was = shared.engine.state();
            shared.engine.reset();
            (was, shared.ticker_handle.take())
        };
        if let Some(handle) = handle {
            handle.cancel();
        }
        debug!(from = ?was, "stopwatch reset");
        self.bus.publish(&Event::tick(Duration::ZERO));
        if was != TimerState::Stopped {
            self.bus.publish(&Event::state_changed(TimerState::Stopped));
        }
    }

    /// Rebase the accounting so the elapsed time reads `value` at the
    /// instant of the call, without changing state. Returns the applied
    /// value.
    pub fn set_elapsed(&self, value: Duration) -> Duration {
        let applied = self.lock().engine.set_elapsed(value);
        debug!(elapsed_ms = applied.as_millis() as u64, "stopwatch rebased");
        applied
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Shared<C>> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tick_callback(&self) -> Box<dyn FnMut() + Send> {
        let shared = Arc::clone(&self.shared);
        let bus = self.bus.clone();
        Box::new(move || {
            // A callback queued before pause/stop/reset may fire after the
            // transition; emit only while still running.
            let event = {
                let shared = shared.lock().unwrap_or_else(|e| e.into_inner());
                (shared.engine.state() == TimerState::Running)
                    .then(|| Event::tick(shared.engine.elapsed()))
            };
            if let Some(event) = event {
                bus.publish(&event);
            }
        })
    }

    fn leave_running(&self, to: TimerState) -> bool {
        let (elapsed, handle) = {
            let mut shared = self.lock();
            let legal = match to {
                TimerState::Paused => shared.engine.pause(),
                TimerState::Stopped => shared.engine.stop(),
                TimerState::Running => unreachable!("leave_running targets a non-running state"),
            };
            if !legal {
                return false;
            }
            (shared.engine.elapsed(), shared.ticker_handle.take())
        };
        if let Some(handle) = handle {
            handle.cancel();
        }
        debug!(to = ?to, elapsed_ms = elapsed.as_millis() as u64, "stopwatch left running");
        self.bus.publish(&Event::tick(elapsed));
        self.bus.publish(&Event::state_changed(to));
        true
    }
}

impl<C: Clock + Send + 'static, T: Ticker> Drop for Stopwatch<C, T> {
    fn drop(&mut self) {
        // Dropping the handle aborts the periodic callback; nothing fires
        // after the owner discards the stopwatch.
        self.lock().ticker_handle.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ticker::ManualTicker;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    struct Fixture {
        clock: ManualClock,
        ticker: ManualTicker,
        stopwatch: Stopwatch<ManualClock, ManualTicker>,
        seen: Arc<Mutex<Vec<Event>>>,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new();
        let ticker = ManualTicker::new();
        let stopwatch =
            Stopwatch::with_parts(clock.clone(), ticker.clone(), StopwatchConfig::default())
                .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        stopwatch.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        Fixture {
            clock,
            ticker,
            stopwatch,
            seen,
        }
    }

    impl Fixture {
        fn events(&self) -> Vec<Event> {
            self.seen.lock().unwrap().clone()
        }

        fn tick_values(&self) -> Vec<u64> {
            self.events()
                .iter()
                .filter_map(Event::elapsed_ms)
                .collect()
        }

        fn states(&self) -> Vec<TimerState> {
            self.events()
                .iter()
                .filter_map(|event| match event {
                    Event::StateChanged { state, .. } => Some(*state),
                    _ => None,
                })
                .collect()
        }
    }

    #[test]
    fn start_schedules_ticks_and_announces_running() {
        let f = fixture();
        assert!(f.stopwatch.start());
        assert_eq!(f.stopwatch.state(), TimerState::Running);
        assert_eq!(f.ticker.live_count(), 1);
        assert_eq!(f.ticker.last_period(), Some(f.stopwatch.tick_rate()));
        assert_eq!(f.states(), vec![TimerState::Running]);
    }

    #[test]
    fn periodic_ticks_report_non_decreasing_elapsed() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(100));
        f.ticker.fire();
        f.clock.advance(ms(100));
        f.ticker.fire();
        f.clock.advance(ms(50));
        f.ticker.fire();

        assert_eq!(f.tick_values(), vec![100, 200, 250]);
    }

    #[test]
    fn start_while_running_changes_nothing() {
        let f = fixture();
        f.stopwatch.start();
        let before = f.events().len();

        assert!(!f.stopwatch.start());
        assert_eq!(f.ticker.live_count(), 1);
        assert_eq!(f.events().len(), before);
    }

    #[test]
    fn pause_emits_final_tick_and_cancels() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(50));
        assert!(f.stopwatch.pause());

        assert_eq!(f.stopwatch.state(), TimerState::Paused);
        assert_eq!(f.ticker.live_count(), 0);
        assert_eq!(f.tick_values(), vec![50]);
        assert_eq!(f.states(), vec![TimerState::Running, TimerState::Paused]);
    }

    #[test]
    fn pause_while_stopped_is_silent() {
        let f = fixture();
        assert!(!f.stopwatch.pause());
        assert_eq!(f.stopwatch.state(), TimerState::Stopped);
        assert!(f.events().is_empty());
    }

    #[test]
    fn late_callback_after_pause_emits_nothing() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(50));
        f.stopwatch.pause();
        let before = f.events().len();

        // The queued callback outlived its best-effort cancellation.
        f.ticker.fire_stale();
        assert_eq!(f.events().len(), before);
    }

    #[test]
    fn no_ticks_arrive_while_paused() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(50));
        f.stopwatch.pause();
        let before = f.tick_values();

        f.clock.advance(ms(200));
        f.ticker.fire();
        f.ticker.fire_stale();
        assert_eq!(f.tick_values(), before);
    }

    #[test]
    fn pause_resume_pause_accumulates() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(50));
        f.stopwatch.pause();

        f.clock.advance(ms(200));
        f.stopwatch.start();
        f.clock.advance(ms(50));
        f.stopwatch.pause();

        assert_eq!(f.tick_values(), vec![50, 100]);
    }

    #[test]
    fn stop_emits_final_tick_and_goes_stopped() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(80));
        assert!(f.stopwatch.stop());

        assert_eq!(f.stopwatch.state(), TimerState::Stopped);
        assert_eq!(f.ticker.live_count(), 0);
        assert_eq!(f.tick_values(), vec![80]);
        assert_eq!(f.states(), vec![TimerState::Running, TimerState::Stopped]);
    }

    #[test]
    fn reset_while_running_emits_zero_and_silences_the_callback() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(120));
        f.stopwatch.reset();

        assert_eq!(f.stopwatch.state(), TimerState::Stopped);
        assert_eq!(f.stopwatch.elapsed(), Duration::ZERO);
        assert_eq!(f.ticker.live_count(), 0);
        assert_eq!(f.tick_values(), vec![0]);
        assert_eq!(f.states(), vec![TimerState::Running, TimerState::Stopped]);

        let before = f.events().len();
        f.ticker.fire_stale();
        assert_eq!(f.events().len(), before);
    }

    #[test]
    fn reset_while_stopped_emits_only_the_zero_tick() {
        let f = fixture();
        f.stopwatch.reset();
        assert_eq!(f.tick_values(), vec![0]);
        assert!(f.states().is_empty());
    }

    #[test]
    fn set_elapsed_rebases_without_events() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(400));
        let before = f.events().len();

        assert_eq!(f.stopwatch.set_elapsed(ms(100)), ms(100));
        assert_eq!(f.events().len(), before);
        assert_eq!(f.stopwatch.elapsed(), ms(100));

        // Scenario: override then pause reports the override, not the
        // wall-clock run time.
        f.stopwatch.pause();
        assert_eq!(f.tick_values().last(), Some(&100));
    }

    #[test]
    fn set_elapsed_applies_in_every_state() {
        let f = fixture();
        f.stopwatch.set_elapsed(ms(300));
        assert_eq!(f.stopwatch.elapsed(), ms(300));
        assert_eq!(f.stopwatch.state(), TimerState::Stopped);

        f.stopwatch.start();
        f.stopwatch.pause();
        f.stopwatch.set_elapsed(ms(700));
        assert_eq!(f.stopwatch.elapsed(), ms(700));
        assert_eq!(f.stopwatch.state(), TimerState::Paused);
    }

    #[test]
    fn zero_tick_rate_is_rejected_at_construction() {
        let result = Stopwatch::with_parts(
            ManualClock::new(),
            ManualTicker::new(),
            StopwatchConfig { tick_rate_ms: 0 },
        );
        assert!(result.is_err());
    }

    #[test]
    fn dropping_the_stopwatch_releases_the_callback() {
        let ticker = ManualTicker::new();
        {
            let stopwatch = Stopwatch::with_parts(
                ManualClock::new(),
                ticker.clone(),
                StopwatchConfig::default(),
            )
            .unwrap();
            stopwatch.start();
            assert_eq!(ticker.live_count(), 1);
        }
        assert_eq!(ticker.live_count(), 0);
    }
}
