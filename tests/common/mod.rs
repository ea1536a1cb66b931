//! Common test utilities

use chrono::Duration;
use redtrend::clock::FixedClock;
use redtrend::store::MemoryStore;
use redtrend::trend::{TrendConfig, TrendEngine};
use std::sync::Arc;

/// The instant the trend scenarios start at: the top of an hour, cycle 1 of 3
pub const START: &str = "2012-07-30T18:00:00-07:00";

/// An engine, its store and its clock, all sharing the same frozen time
pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub store: Arc<MemoryStore>,
    pub engine: TrendEngine,
}

impl Harness {
    /// Build a harness frozen at [`START`]
    pub fn new(config: TrendConfig) -> Self {
        Self::at(config, START)
    }

    /// Build a harness frozen at an RFC 3339 instant
    pub fn at(config: TrendConfig, rfc3339: &str) -> Self {
        let clock = Arc::new(FixedClock::parse(rfc3339).unwrap());
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let engine = TrendEngine::with_clock(config, store.clone(), clock.clone()).unwrap();
        Self {
            clock,
            store,
            engine,
        }
    }

    /// Move time forward by `seconds`
    pub fn travel(&self, seconds: i64) {
        self.clock.advance(Duration::seconds(seconds));
    }
}
