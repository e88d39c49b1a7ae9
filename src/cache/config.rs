//! Cache configuration: TTLs, tier toggles and connection parameters

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{env_bool, env_i64, env_secs, env_string, env_usize};

/// Configuration for the hybrid cache.
///
/// The posting-list TTL is always `snapshot_ttl + index_ttl_grace`, strictly
/// greater than the snapshot's, so indexes outlive the snapshot they
/// describe and the snapshot stays authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of the `campaigns:active` snapshot entry.
    pub snapshot_ttl: Duration,

    /// Extra lifetime of posting lists beyond the snapshot TTL.
    pub index_ttl_grace: Duration,

    /// Local tier capacity bound.
    pub memory_max_entries: usize,

    /// Interval of the local tier's background expiry sweep.
    pub sweep_interval: Duration,

    /// Per-operation deadline for shared-tier calls.
    pub op_timeout: Duration,

    /// Shared tier address (`host:port`).
    pub redis_addr: String,

    /// Shared tier credential; empty means unauthenticated.
    pub redis_password: String,

    /// Shared tier logical database.
    pub redis_db: i64,

    /// Local tier kill switch.
    pub enable_memory: bool,

    /// Shared tier kill switch.
    pub enable_redis: bool,

    /// Reserved for predictive warming.
    pub refresh_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(300),
            index_ttl_grace: Duration::from_secs(60),
            memory_max_entries: 1000,
            sweep_interval: Duration::from_secs(300),
            op_timeout: Duration::from_secs(2),
            redis_addr: "localhost:6379".to_string(),
            redis_password: String::new(),
            redis_db: 0,
            enable_memory: true,
            enable_redis: true,
            refresh_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Cache configuration from environment variables, with defaults for
    /// everything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            snapshot_ttl: env_secs("CACHE_DEFAULT_TTL", defaults.snapshot_ttl),
            index_ttl_grace: env_secs("CACHE_INDEX_TTL_GRACE", defaults.index_ttl_grace),
            memory_max_entries: env_usize("CACHE_MEMORY_SIZE", defaults.memory_max_entries),
            sweep_interval: defaults.sweep_interval,
            op_timeout: defaults.op_timeout,
            redis_addr: env_string("REDIS_ADDR", &defaults.redis_addr),
            redis_password: env_string("REDIS_PASSWORD", ""),
            redis_db: env_i64("REDIS_DB", defaults.redis_db),
            enable_memory: env_bool("CACHE_ENABLE_MEMORY", defaults.enable_memory),
            enable_redis: env_bool("CACHE_ENABLE_REDIS", defaults.enable_redis),
            refresh_interval: env_secs("CACHE_REFRESH_INTERVAL", defaults.refresh_interval),
        }
    }

    /// Validate the configuration. Fatal at startup only.
    pub fn validate(&self) -> Result<(), String> {
        if self.snapshot_ttl.is_zero() {
            return Err("snapshot_ttl must be greater than zero".to_string());
        }
        if self.index_ttl_grace.is_zero() {
            return Err("index_ttl_grace must be greater than zero".to_string());
        }
        if self.enable_memory && self.memory_max_entries == 0 {
            return Err("memory_max_entries must be greater than 0".to_string());
        }
        if self.enable_redis && self.redis_addr.is_empty() {
            return Err("redis_addr is required when the shared tier is enabled".to_string());
        }
        Ok(())
    }

    /// Posting-list TTL, strictly greater than the snapshot TTL.
    pub fn index_ttl(&self) -> Duration {
        self.snapshot_ttl + self.index_ttl_grace
    }
}

/// Builder for [`CacheConfig`].
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    snapshot_ttl: Option<Duration>,
    index_ttl_grace: Option<Duration>,
    memory_max_entries: Option<usize>,
    sweep_interval: Option<Duration>,
    op_timeout: Option<Duration>,
    redis_addr: Option<String>,
    redis_password: Option<String>,
    redis_db: Option<i64>,
    enable_memory: Option<bool>,
    enable_redis: Option<bool>,
    refresh_interval: Option<Duration>,
}

impl CacheConfigBuilder {
    pub fn snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.snapshot_ttl = Some(ttl);
        self
    }

    pub fn index_ttl_grace(mut self, grace: Duration) -> Self {
        self.index_ttl_grace = Some(grace);
        self
    }

    pub fn memory_max_entries(mut self, max: usize) -> Self {
        self.memory_max_entries = Some(max);
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    pub fn op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = Some(timeout);
        self
    }

    pub fn redis_addr(mut self, addr: impl Into<String>) -> Self {
        self.redis_addr = Some(addr.into());
        self
    }

    pub fn redis_password(mut self, password: impl Into<String>) -> Self {
        self.redis_password = Some(password.into());
        self
    }

    pub fn redis_db(mut self, db: i64) -> Self {
        self.redis_db = Some(db);
        self
    }

    pub fn enable_memory(mut self, enable: bool) -> Self {
        self.enable_memory = Some(enable);
        self
    }

    pub fn enable_redis(mut self, enable: bool) -> Self {
        self.enable_redis = Some(enable);
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();
        CacheConfig {
            snapshot_ttl: self.snapshot_ttl.unwrap_or(defaults.snapshot_ttl),
            index_ttl_grace: self.index_ttl_grace.unwrap_or(defaults.index_ttl_grace),
            memory_max_entries: self.memory_max_entries.unwrap_or(defaults.memory_max_entries),
            sweep_interval: self.sweep_interval.unwrap_or(defaults.sweep_interval),
            op_timeout: self.op_timeout.unwrap_or(defaults.op_timeout),
            redis_addr: self.redis_addr.unwrap_or(defaults.redis_addr),
            redis_password: self.redis_password.unwrap_or(defaults.redis_password),
            redis_db: self.redis_db.unwrap_or(defaults.redis_db),
            enable_memory: self.enable_memory.unwrap_or(defaults.enable_memory),
            enable_redis: self.enable_redis.unwrap_or(defaults.enable_redis),
            refresh_interval: self.refresh_interval.unwrap_or(defaults.refresh_interval),
        }
    }
}
