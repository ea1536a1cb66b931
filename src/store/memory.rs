//! In-process sorted-set store
//!
//! Mirrors the Redis semantics the engine relies on: missing keys read as
//! empty, `ZUNIONSTORE` deletes an empty destination, `ZREVRANGE` breaks
//! score ties by reverse member order, and keys expire against the injected
//! [`Clock`]. An atomic batch is applied under a single lock hold.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{SortedSetStore, StoreOp};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;

#[derive(Debug, Default)]
struct SortedSet {
    members: HashMap<String, f64>,
    /// Expiry deadline in unix milliseconds
    expires_at: Option<i64>,
}

impl SortedSet {
    /// Members sorted by descending score, ties by descending member
    fn ranked(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .members
            .iter()
            .map(|(member, score)| (member.clone(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        ranked
    }
}

#[derive(Debug, Default)]
struct Keyspace {
    sets: HashMap<String, SortedSet>,
}

impl Keyspace {
    fn purge_expired(&mut self, now_ms: i64) {
        self.sets
            .retain(|_, set| set.expires_at.map_or(true, |deadline| deadline > now_ms));
    }

    fn increment(&mut self, key: &str, member: &str, delta: f64) -> f64 {
        let set = self.sets.entry(key.to_string()).or_default();
        let score = set.members.entry(member.to_string()).or_insert(0.0);
        *score += delta;
        *score
    }

    fn expire(&mut self, key: &str, seconds: u64, now_ms: i64) {
        if let Some(set) = self.sets.get_mut(key) {
            set.expires_at = Some(now_ms + seconds as i64 * 1000);
        }
    }

    fn union_store(&mut self, destination: &str, sources: &[String], weights: &[f64]) -> u64 {
        let mut result: HashMap<String, f64> = HashMap::new();
        for (i, source) in sources.iter().enumerate() {
            let weight = weights.get(i).copied().unwrap_or(1.0);
            if let Some(set) = self.sets.get(source) {
                for (member, score) in &set.members {
                    *result.entry(member.clone()).or_insert(0.0) += score * weight;
                }
            }
        }

        self.sets.remove(destination);
        let count = result.len() as u64;
        if count > 0 {
            self.sets.insert(
                destination.to_string(),
                SortedSet {
                    members: result,
                    expires_at: None,
                },
            );
        }
        count
    }

    fn apply(&mut self, op: &StoreOp, now_ms: i64) {
        match op {
            StoreOp::IncrementScore { key, member, delta } => {
                self.increment(key, member, *delta);
            }
            StoreOp::SetExpiry { key, seconds } => self.expire(key, *seconds, now_ms),
            StoreOp::WeightedUnionStore {
                destination,
                sources,
                weights,
            } => {
                self.union_store(destination, sources, weights);
            }
        }
    }
}

/// Resolve Redis-style inclusive `start..=stop` indices against `len`
fn slice_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Sorted-set store held in process memory
pub struct MemoryStore {
    keyspace: Mutex<Keyspace>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store expiring keys against the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store expiring keys against `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            keyspace: Mutex::new(Keyspace::default()),
            clock,
        }
    }

    /// Whether `key` currently exists
    pub async fn exists(&self, key: &str) -> bool {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);
        keyspace.sets.contains_key(key)
    }

    /// Drop every key
    pub async fn flush(&self) {
        self.keyspace.lock().await.sets.clear();
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    async fn ranked(&self, key: &str, start: isize, stop: isize) -> Vec<(String, f64)> {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);

        let Some(set) = keyspace.sets.get(key) else {
            return Vec::new();
        };
        let ranked = set.ranked();
        match slice_bounds(ranked.len(), start, stop) {
            Some((from, to)) => ranked[from..=to].to_vec(),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl SortedSetStore for MemoryStore {
    async fn increment_score(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);
        Ok(keyspace.increment(key, member, delta))
    }

    async fn cardinality(&self, key: &str) -> Result<u64> {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);
        Ok(keyspace
            .sets
            .get(key)
            .map_or(0, |set| set.members.len() as u64))
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<u64>> {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);
        Ok(keyspace
            .sets
            .get(key)
            .and_then(|set| set.expires_at)
            .map(|deadline| ((deadline - now_ms + 500) / 1000) as u64))
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<()> {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);
        keyspace.expire(key, seconds, now_ms);
        Ok(())
    }

    async fn weighted_union_store(
        &self,
        destination: &str,
        sources: &[String],
        weights: &[f64],
    ) -> Result<u64> {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);
        Ok(keyspace.union_store(destination, sources, weights))
    }

    async fn reverse_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        Ok(self
            .ranked(key, start, stop)
            .await
            .into_iter()
            .map(|(member, _)| member)
            .collect())
    }

    async fn reverse_range_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<(String, f64)>> {
        Ok(self.ranked(key, start, stop).await)
    }

    async fn score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);
        Ok(keyspace
            .sets
            .get(key)
            .and_then(|set| set.members.get(member).copied()))
    }

    async fn execute_atomic(&self, ops: &[StoreOp]) -> Result<()> {
        let now_ms = self.now_ms();
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired(now_ms);
        for op in ops {
            keyspace.apply(op, now_ms);
        }
        Ok(())
    }
}
