//! Configuration management for redtrend
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::store::RedisConfig;
use crate::trend::{CycleUnit, TrendConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trend window configuration
    pub trend: TrendConfig,

    /// Redis connection configuration
    pub redis: RedisConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// An unrecognized `REDTREND_CYCLE_UNIT` or a non-numeric
    /// `REDTREND_CYCLES_COUNT` / `REDIS_POOL_SIZE` is an error rather than a
    /// silent default.
    pub fn from_env() -> Result<Self> {
        let cycle_unit = match std::env::var("REDTREND_CYCLE_UNIT") {
            Ok(unit) => unit.parse::<CycleUnit>()?,
            Err(_) => CycleUnit::default(),
        };

        let cycles_count = match std::env::var("REDTREND_CYCLES_COUNT") {
            Ok(count) => count.trim().parse::<u32>().map_err(|e| {
                Error::config(format!("REDTREND_CYCLES_COUNT '{count}' is not a count: {e}"))
            })?,
            Err(_) => 3,
        };

        let key_prefix = std::env::var("REDTREND_KEY_PREFIX")
            .ok()
            .filter(|p| !p.is_empty());

        let level = std::env::var("REDTREND_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let format =
            std::env::var("REDTREND_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            trend: TrendConfig {
                cycle_unit,
                cycles_count,
                key_prefix,
            },
            redis: RedisConfig::from_env()?,
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.trend.cycles_count == 0 {
            return Err(Error::config("cycles_count must be greater than 0"));
        }

        if self.redis.pool_size == 0 {
            return Err(Error::config("pool_size must be greater than 0"));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(Error::config(format!(
                "log format must be text or json, got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }
}
