//! Stopwatch configuration.
//!
//! Host applications typically embed a `[stopwatch]` table in their own
//! TOML configuration; [`StopwatchConfig::from_toml_str`] parses one table
//! on its own. The tick rate is fixed at construction — changing it means
//! building a new stopwatch.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

fn default_tick_rate_ms() -> u64 {
    100
}

/// Configuration applied at stopwatch construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchConfig {
    /// How often (in milliseconds) to emit tick events while running.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

impl StopwatchConfig {
    /// Parse from a TOML fragment, e.g. `tick_rate_ms = 250`.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::InvalidTickRate(self.tick_rate()));
        }
        Ok(())
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}
