//! Core error types for lapwatch.
//!
//! The state machine itself is total: illegal transitions report `false`
//! rather than an error. The only fallible surface is configuration.

use std::time::Duration;
use thiserror::Error;

/// Core error type for lapwatch.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Tick rate must be a positive duration
    #[error("Invalid tick rate {0:?}: must be greater than zero")]
    InvalidTickRate(Duration),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(#[from] toml::de::Error),
}

/// Result type alias for lapwatch errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;
