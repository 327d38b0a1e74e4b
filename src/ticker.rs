//! Cancellable periodic-callback scheduling.
//!
//! A [`Ticker`] runs a callback at a fixed period until the returned
//! [`TickHandle`] is cancelled. Cancellation is best-effort: a callback
//! already queued when the handle is cancelled may still run once, so
//! callers must guard their callbacks against late firing.
//!
//! [`TokioTicker`] is the production implementation; [`ManualTicker`] is a
//! hand-fired double for deterministic tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::MissedTickBehavior;

/// Schedules a callback to run repeatedly at `period` until cancelled.
pub trait Ticker {
    fn schedule(&self, period: Duration, callback: Box<dyn FnMut() + Send>) -> TickHandle;
}

/// Opaque handle to a scheduled periodic callback.
///
/// Cancels on [`TickHandle::cancel`] or on drop.
pub struct TickHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the periodic callback. Best-effort: an already-queued
    /// invocation may still fire after this returns.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandle").finish_non_exhaustive()
    }
}

/// Periodic callbacks driven by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioTicker {
    runtime: tokio::runtime::Handle,
}

impl TokioTicker {
    /// Bind to the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime context; use
    /// [`TokioTicker::with_handle`] from synchronous code.
    pub fn new() -> Self {
        Self::with_handle(tokio::runtime::Handle::current())
    }

    pub fn with_handle(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }
}

impl Ticker for TokioTicker {
    fn schedule(&self, period: Duration, mut callback: Box<dyn FnMut() + Send>) -> TickHandle {
        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; skip it so the
            // callback first fires one full period after scheduling.
            interval.tick().await;
            loop {
                interval.tick().await;
                callback();
            }
        });
        TickHandle::new(move || task.abort())
    }
}

struct ManualEntry {
    period: Duration,
    callback: Box<dyn FnMut() + Send>,
    cancelled: Arc<AtomicBool>,
}

/// A ticker fired by hand, for single-threaded tests.
///
/// Scheduled callbacks never run on their own; the test drives them with
/// [`ManualTicker::fire`]. [`ManualTicker::fire_stale`] also invokes
/// cancelled callbacks, modelling a queued invocation that outlived its
/// best-effort cancellation.
#[derive(Clone, Default)]
pub struct ManualTicker {
    entries: Arc<Mutex<Vec<ManualEntry>>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke every live (non-cancelled) callback once.
    pub fn fire(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for entry in entries.iter_mut() {
            if !entry.cancelled.load(Ordering::SeqCst) {
                (entry.callback)();
            }
        }
    }

    /// Invoke every callback ever scheduled, cancelled or not.
    pub fn fire_stale(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for entry in entries.iter_mut() {
            (entry.callback)();
        }
    }

    /// Number of callbacks whose handle has not been cancelled.
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|entry| !entry.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Period of the most recently scheduled callback.
    pub fn last_period(&self) -> Option<Duration> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .map(|entry| entry.period)
    }
}

impl Ticker for ManualTicker {
    fn schedule(&self, period: Duration, callback: Box<dyn FnMut() + Send>) -> TickHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(ManualEntry {
            period,
            callback,
            cancelled: Arc::clone(&cancelled),
        });
        TickHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}

impl std::fmt::Debug for ManualTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTicker")
            .field("live", &self.live_count())
            .finish()
    }
}
