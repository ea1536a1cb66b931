//! Redis-backed sorted-set store
//!
//! Connections come from a deadpool-redis pool. Atomic batches are sent as a
//! `MULTI`/`EXEC` pipeline, so either every queued command applies or none
//! does.
//!
//! # Example
//!
//! ```rust,ignore
//! use redtrend::store::{RedisConfig, RedisStore};
//!
//! let store = RedisStore::new(&RedisConfig::from_env()?).await?;
//! store.health_check().await?;
//! ```

use ::redis::AsyncCommands;
use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use serde::{Deserialize, Serialize};

use super::{SortedSetStore, StoreOp};
use crate::error::{Error, Result};

/// Redis connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,

    /// Connection pool size
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
        }
    }
}

impl RedisConfig {
    /// Create config from environment variables
    ///
    /// A non-numeric `REDIS_POOL_SIZE` is an error rather than a silent default.
    pub fn from_env() -> Result<Self> {
        let pool_size = match std::env::var("REDIS_POOL_SIZE") {
            Ok(size) => size.trim().parse::<usize>().map_err(|e| {
                Error::config(format!("REDIS_POOL_SIZE '{size}' is not a size: {e}"))
            })?,
            Err(_) => 10,
        };

        Ok(Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            pool_size,
        })
    }
}

/// Sorted-set store on a pooled Redis connection
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Connect to Redis and verify the connection with a `PING`
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let pool = PoolConfig::from_url(&config.url)
            .builder()
            .map_err(|e| Error::config(format!("Failed to create pool builder: {e}")))?
            .max_size(config.pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Redis connection pool: {e}")))?;

        let store = Self { pool };
        store.health_check().await?;

        tracing::info!(url = %config.url, pool_size = config.pool_size, "Connected to Redis");

        Ok(store)
    }

    /// Wrap an existing pool without pinging it
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    /// Check that Redis answers `PING`
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.pool.get().await?;
        let reply: String = ::redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(reply == "PONG")
    }

    /// Remove every key in the current database. Intended for tests.
    pub async fn flush_db(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let _: () = ::redis::cmd("FLUSHDB").query_async(&mut *conn).await?;
        Ok(())
    }

    fn queue(pipe: &mut ::redis::Pipeline, op: &StoreOp) {
        match op {
            StoreOp::IncrementScore { key, member, delta } => {
                pipe.cmd("ZINCRBY").arg(key).arg(*delta).arg(member).ignore();
            }
            StoreOp::SetExpiry { key, seconds } => {
                pipe.cmd("EXPIRE").arg(key).arg(*seconds).ignore();
            }
            StoreOp::WeightedUnionStore {
                destination,
                sources,
                weights,
            } => {
                pipe.cmd("ZUNIONSTORE")
                    .arg(destination)
                    .arg(sources.len())
                    .arg(sources.as_slice())
                    .arg("WEIGHTS")
                    .arg(weights.as_slice())
                    .ignore();
            }
        }
    }
}

#[async_trait]
impl SortedSetStore for RedisStore {
    async fn increment_score(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        let mut conn = self.pool.get().await?;
        let score: f64 = conn.zincr(key, member, delta).await?;
        Ok(score)
    }

    async fn cardinality(&self, key: &str) -> Result<u64> {
        let mut conn = self.pool.get().await?;
        let count: u64 = conn.zcard(key).await?;
        Ok(count)
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<u64>> {
        let mut conn = self.pool.get().await?;
        // -2: no such key, -1: no expiry
        let ttl: i64 = conn.ttl(key).await?;
        Ok(u64::try_from(ttl).ok())
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let _: () = ::redis::cmd("EXPIRE")
            .arg(key)
            .arg(seconds)
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }

    async fn weighted_union_store(
        &self,
        destination: &str,
        sources: &[String],
        weights: &[f64],
    ) -> Result<u64> {
        let mut conn = self.pool.get().await?;
        let count: u64 = ::redis::cmd("ZUNIONSTORE")
            .arg(destination)
            .arg(sources.len())
            .arg(sources)
            .arg("WEIGHTS")
            .arg(weights)
            .query_async(&mut *conn)
            .await?;
        Ok(count)
    }

    async fn reverse_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let members: Vec<String> = conn.zrevrange(key, start, stop).await?;
        Ok(members)
    }

    async fn reverse_range_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<(String, f64)>> {
        let mut conn = self.pool.get().await?;
        let ranked: Vec<(String, f64)> = conn.zrevrange_withscores(key, start, stop).await?;
        Ok(ranked)
    }

    async fn score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let mut conn = self.pool.get().await?;
        let score: Option<f64> = conn.zscore(key, member).await?;
        Ok(score)
    }

    async fn execute_atomic(&self, ops: &[StoreOp]) -> Result<()> {
        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for op in ops {
            Self::queue(&mut pipe, op);
        }

        let mut conn = self.pool.get().await?;
        let _: () = pipe.query_async(&mut *conn).await?;
        Ok(())
    }
}
