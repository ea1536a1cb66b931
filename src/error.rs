//! Unified error handling for the redtrend crate
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the [`Error`] enum below. Store failures are wrapped without
//! translation so callers see exactly what Redis (or the pool) reported.
//!
//! # Usage
//!
//! ```rust,ignore
//! use redtrend::error::{Error, ErrorCategory, TrendErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         eprintln!("Transient store failure, caller may retry: {err}");
//!     } else {
//!         eprintln!("Fatal error: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Common interface for classifying redtrend errors
pub trait TrendErrorTrait: std::error::Error {
    /// Check if this error is transient (the caller may retry)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration and input validation errors
    Config,
    /// Sorted-set store errors (connectivity, protocol, pool)
    Store,
    /// Local I/O errors
    Io,
}

impl ErrorCategory {
    /// Short human-readable description of the category
    pub fn description(&self) -> &'static str {
        match self {
            Self::Config => "configuration error",
            Self::Store => "store error",
            Self::Io => "I/O error",
        }
    }
}

/// Unified error type for the redtrend crate
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized cycle unit
    #[error("Invalid cycle unit '{unit}': cycle unit must be one of minute, hour, day")]
    InvalidCycleUnit { unit: String },

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Increment that is NaN or infinite
    #[error("Invalid increment {delta}: must be a finite number")]
    InvalidIncrement { delta: f64 },

    /// Redis command errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML config parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TrendErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidCycleUnit { .. }
            | Self::Config(_)
            | Self::InvalidIncrement { .. }
            | Self::Toml(_) => false,
            Self::Redis(e) => e.is_connection_dropped() || e.is_timeout() || e.is_io_error(),
            Self::Pool(_) => true,
            Self::Io(_) => true,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCycleUnit { .. }
            | Self::Config(_)
            | Self::InvalidIncrement { .. }
            | Self::Toml(_) => ErrorCategory::Config,
            Self::Redis(_) | Self::Pool(_) => ErrorCategory::Store,
            Self::Io(_) => ErrorCategory::Io,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid cycle unit error
    pub fn invalid_cycle_unit(unit: impl Into<String>) -> Self {
        Self::InvalidCycleUnit { unit: unit.into() }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
