//! Decaying trend rankings over a rolling window of cycles
//!
//! This module provides functionality for:
//! - Mapping wall-clock time onto a wrapping cycle index
//! - Counting member activity in one sorted-set bucket per cycle
//! - Expiring each bucket one full window after its cycle starts
//! - Folding the live buckets into a single ranking, newer cycles weighted higher
//!
//! # Example
//!
//! ```rust,ignore
//! use redtrend::trend::{TrendConfig, TrendEngine};
//! use redtrend::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let engine = TrendEngine::new(TrendConfig::default(), Arc::new(MemoryStore::new()))?;
//! engine.record("articles", 42).await?;
//! let trending = engine.top("articles", None).await?;
//! ```

pub mod cycle;
pub mod keys;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::store::{SortedSetStore, StoreOp};

pub use self::cycle::{CycleSchedule, CycleUnit};
pub use self::keys::KeySpace;

/// Number of members `top` returns when no limit is given
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// Inclusive range stop for the first `limit` members; -1 means "to the end"
fn range_stop(limit: usize) -> isize {
    isize::try_from(limit).map_or(-1, |l| l - 1)
}

/// Trend engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Length of one cycle
    pub cycle_unit: CycleUnit,

    /// How many cycles the rolling window keeps
    pub cycles_count: u32,

    /// Optional namespace prepended to every key
    pub key_prefix: Option<String>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            cycle_unit: CycleUnit::Hour,
            cycles_count: 3,
            key_prefix: None,
        }
    }
}

impl TrendConfig {
    #[must_use]
    pub fn with_cycle_unit(mut self, unit: CycleUnit) -> Self {
        self.cycle_unit = unit;
        self
    }

    #[must_use]
    pub fn with_cycles_count(mut self, count: u32) -> Self {
        self.cycles_count = count;
        self
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Resolve into a cycle schedule, rejecting a zero cycle count
    pub fn schedule(&self) -> Result<CycleSchedule> {
        CycleSchedule::new(self.cycle_unit, self.cycles_count)
    }
}

/// What was observed about a bucket before a write batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BucketState {
    /// Members already in the bucket
    pub cardinality: u64,

    /// Remaining time to live, `None` when the bucket has no expiry
    pub ttl: Option<u64>,
}

impl BucketState {
    /// A bucket needs an expiry if it is about to be created or never got one
    #[must_use]
    pub fn needs_expiry(&self) -> bool {
        self.cardinality == 0 || self.ttl.is_none()
    }
}

/// Records activity and serves decayed rankings
pub struct TrendEngine {
    schedule: CycleSchedule,
    keys: KeySpace,
    store: Arc<dyn SortedSetStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TrendEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrendEngine")
            .field("schedule", &self.schedule)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl TrendEngine {
    /// Create an engine on the system clock
    ///
    /// Fails with a configuration error before touching the store if
    /// `cycles_count` is zero.
    pub fn new(config: TrendConfig, store: Arc<dyn SortedSetStore>) -> Result<Self> {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create an engine reading time from `clock`
    pub fn with_clock(
        config: TrendConfig,
        store: Arc<dyn SortedSetStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let schedule = config.schedule()?;
        Ok(Self {
            schedule,
            keys: KeySpace::new(config.key_prefix),
            store,
            clock,
        })
    }

    #[must_use]
    pub fn schedule(&self) -> &CycleSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    #[must_use]
    pub fn cycle_unit(&self) -> CycleUnit {
        self.schedule.unit()
    }

    #[must_use]
    pub fn cycles_count(&self) -> u32 {
        self.schedule.cycles_count()
    }

    #[must_use]
    pub fn cycle_length(&self) -> u64 {
        self.schedule.cycle_length()
    }

    #[must_use]
    pub fn cycle_interval(&self) -> u64 {
        self.schedule.cycle_interval()
    }

    #[must_use]
    pub fn weight_offset(&self) -> f64 {
        self.schedule.weight_offset()
    }

    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        self.schedule.weights()
    }

    /// Cycle index for the clock's current time
    #[must_use]
    pub fn current_cycle(&self) -> u32 {
        self.schedule.cycle_at(&self.clock.now())
    }

    /// Cycle indices, most recent first, for the clock's current time
    #[must_use]
    pub fn cycle_positions(&self) -> Vec<u32> {
        self.schedule.positions_at(&self.clock.now())
    }

    /// Count one occurrence of `member` in `name`
    pub async fn record(&self, name: &str, member: impl fmt::Display) -> Result<()> {
        self.record_by(name, member, 1.0).await
    }

    /// Count `delta` occurrences of `member` in `name`
    ///
    /// The bucket is inspected first, then the increment, the expiry (if the
    /// bucket is new or persistent) and the union recomputation are sent as
    /// one atomic batch. The clock is read once so the bucket and its expiry
    /// agree even if a cycle boundary passes mid-call.
    pub async fn record_by(&self, name: &str, member: impl fmt::Display, delta: f64) -> Result<()> {
        if !delta.is_finite() {
            return Err(Error::InvalidIncrement { delta });
        }

        let now = self.clock.now();
        let member = member.to_string();
        let bucket = self.keys.bucket(name, self.schedule.cycle_at(&now));

        let state = BucketState {
            cardinality: self.store.cardinality(&bucket).await?,
            ttl: self.store.time_to_live(&bucket).await?,
        };

        let ops = self.plan_record(name, &member, delta, &now, state);
        self.store.execute_atomic(&ops).await?;

        debug!(
            name = %name,
            member = %member,
            bucket = %bucket,
            new_bucket = state.needs_expiry(),
            "Recorded trend activity"
        );

        Ok(())
    }

    /// The atomic batch `record_by` submits, given the observed bucket state
    #[must_use]
    pub fn plan_record(
        &self,
        name: &str,
        member: &str,
        delta: f64,
        now: &DateTime<FixedOffset>,
        state: BucketState,
    ) -> Vec<StoreOp> {
        let bucket = self.keys.bucket(name, self.schedule.cycle_at(now));

        let mut ops = vec![StoreOp::IncrementScore {
            key: bucket.clone(),
            member: member.to_string(),
            delta,
        }];
        if state.needs_expiry() {
            ops.push(StoreOp::SetExpiry {
                key: bucket,
                seconds: self.schedule.expire_seconds_at(now),
            });
        }
        ops.push(self.union_op(name, now));
        ops
    }

    /// Rebuild the weighted union for `name` from the live buckets
    pub async fn unionize(&self, name: &str) -> Result<()> {
        let op = self.union_op(name, &self.clock.now());
        self.store.execute_atomic(std::slice::from_ref(&op)).await?;
        debug!(name = %name, union = %op.key(), "Rebuilt trend union");
        Ok(())
    }

    fn union_op(&self, name: &str, now: &DateTime<FixedOffset>) -> StoreOp {
        StoreOp::WeightedUnionStore {
            destination: self.keys.union(name),
            sources: self
                .schedule
                .positions_at(now)
                .into_iter()
                .map(|cycle| self.keys.bucket(name, cycle))
                .collect(),
            weights: self.schedule.weights(),
        }
    }

    /// Highest weighted members of `name`, at most `limit` (default 10)
    pub async fn top(&self, name: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store
            .reverse_range(&self.keys.union(name), 0, range_stop(limit))
            .await
    }

    /// Like [`top`](Self::top), with each member's weighted score
    pub async fn top_with_scores(
        &self,
        name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<(String, f64)>> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store
            .reverse_range_with_scores(&self.keys.union(name), 0, range_stop(limit))
            .await
    }

    /// Raw count of `member` in one cycle bucket of `name`
    pub async fn bucket_score(
        &self,
        name: &str,
        cycle: u32,
        member: impl fmt::Display,
    ) -> Result<Option<f64>> {
        self.store
            .score(&self.keys.bucket(name, cycle), &member.to_string())
            .await
    }
}
