//! redtrend - decaying trend rankings on Redis sorted sets
//!
//! Answers "which members have accumulated the most weighted activity
//! recently?" by counting activity in one sorted set per time cycle and
//! folding the live cycles into a single ranking where newer cycles weigh
//! more.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`trend`] - The trend engine, cycle arithmetic and key naming
//! - [`store`] - The sorted-set store boundary (Redis and in-memory)
//! - [`clock`] - Time sources, including a frozen clock for tests
//! - [`config`] - Configuration management and settings
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use redtrend::config::Config;
//! use redtrend::store::RedisStore;
//! use redtrend::trend::TrendEngine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = RedisStore::new(&config.redis).await?;
//!     let engine = TrendEngine::new(config.trend, Arc::new(store))?;
//!
//!     engine.record("articles", 42).await?;
//!     println!("{:?}", engine.top("articles", None).await?);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod store;
pub mod trend;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, TrendErrorTrait};
    pub use crate::store::{MemoryStore, RedisStore, SortedSetStore, StoreOp};
    pub use crate::trend::{CycleUnit, TrendConfig, TrendEngine};
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use trend::{CycleUnit, TrendConfig, TrendEngine};
