//! Sorted-set store boundary
//!
//! The trend engine keeps no durable state; buckets and union sets live in an
//! external sorted-set store. [`SortedSetStore`] is the exact surface the
//! engine needs from it:
//!
//! - single commands (`ZINCRBY`, `ZCARD`, `TTL`, `EXPIRE`, `ZUNIONSTORE`,
//!   `ZREVRANGE`, `ZSCORE` in Redis terms)
//! - an atomic batch of write commands ([`StoreOp`]) whose partial
//!   application is never observable
//!
//! Two implementations ship with the crate: [`RedisStore`] for production
//! and [`MemoryStore`] for tests and embedding.

pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis::{RedisConfig, RedisStore};

/// A write command that can be queued in an atomic batch
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// Add `delta` to `member`'s score in `key`, creating either if missing
    IncrementScore {
        key: String,
        member: String,
        delta: f64,
    },

    /// Expire `key` after `seconds`
    SetExpiry { key: String, seconds: u64 },

    /// Overwrite `destination` with the weighted sum of `sources`
    WeightedUnionStore {
        destination: String,
        sources: Vec<String>,
        weights: Vec<f64>,
    },
}

impl StoreOp {
    /// The key this operation writes to
    pub fn key(&self) -> &str {
        match self {
            Self::IncrementScore { key, .. } | Self::SetExpiry { key, .. } => key,
            Self::WeightedUnionStore { destination, .. } => destination,
        }
    }
}

/// External sorted-set store
#[async_trait]
pub trait SortedSetStore: Send + Sync {
    /// Add `delta` to `member`'s score and return the new score
    async fn increment_score(&self, key: &str, member: &str, delta: f64) -> Result<f64>;

    /// Number of members in `key`; 0 when the key does not exist
    async fn cardinality(&self, key: &str) -> Result<u64>;

    /// Remaining seconds to live, or `None` if the key is missing or persistent
    async fn time_to_live(&self, key: &str) -> Result<Option<u64>>;

    /// Expire `key` after `seconds`
    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<()>;

    /// Overwrite `destination` with `sum(score * weight)` over `sources`,
    /// returning the cardinality of the result
    async fn weighted_union_store(
        &self,
        destination: &str,
        sources: &[String],
        weights: &[f64],
    ) -> Result<u64>;

    /// Members ranked `start..=stop` by descending score; negative indices
    /// count from the end
    async fn reverse_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Like [`reverse_range`](Self::reverse_range), paired with scores
    async fn reverse_range_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<(String, f64)>>;

    /// Score of `member` in `key`, if present
    async fn score(&self, key: &str, member: &str) -> Result<Option<f64>>;

    /// Apply all `ops` as one unit
    async fn execute_atomic(&self, ops: &[StoreOp]) -> Result<()>;
}
