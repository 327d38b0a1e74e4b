//! # Lapwatch
//!
//! A stopwatch engine: segment-based elapsed-time accounting over a
//! monotonic clock, with periodic tick notifications published to an
//! event bus while running.
//!
//! ## Architecture
//!
//! - **Stopwatch Engine**: a pure state machine (`Stopped`/`Running`/
//!   `Paused`) that reconstructs elapsed time from closed running
//!   segments plus the open period; all operations are total and report
//!   illegal transitions as `false`
//! - **Stopwatch**: the engine behind a mutex, wired to a cancellable
//!   periodic ticker and a synchronous publish/subscribe event bus
//! - **Clock / Ticker**: injectable time source and callback scheduler,
//!   with deterministic doubles (`ManualClock`, `ManualTicker`) for tests
//!
//! ## Key Components
//!
//! - [`Stopwatch`]: self-scheduling stopwatch with observers
//! - [`StopwatchEngine`]: standalone caller-driven state machine
//! - [`Event`]: tick and state-change notifications
//! - [`StopwatchConfig`]: tick rate configuration (default 100 ms)

pub mod bus;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod stopwatch;
pub mod ticker;

pub use bus::EventBus;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::StopwatchConfig;
pub use error::{ConfigError, Error, Result};
pub use events::Event;
pub use stopwatch::{Segment, Stopwatch, StopwatchEngine, TimerState};
pub use ticker::{ManualTicker, TickHandle, Ticker, TokioTicker};
