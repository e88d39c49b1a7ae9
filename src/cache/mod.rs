//! # Hybrid campaign cache
//!
//! Two-tier caching for campaign snapshots and per-dimension inverted
//! indexes, shielding the source of truth from per-request load.
//!
//! - **Local tier** ([`MemoryCache`]): bounded, process-local store with
//!   per-entry expiry, LRU eviction and a background sweeper.
//! - **Shared tier** ([`RedisCache`]): cross-instance store with namespaced
//!   keys, TTL writes, pattern invalidation and a pub/sub invalidation
//!   channel.
//! - **Hybrid** ([`HybridCache`]): fronts both tiers behind one typed
//!   interface with hit/miss/error counters and a composite health report.
//!
//! Reads fan out local-first; a shared-tier hit warms the local tier before
//! returning. Writes go to both enabled tiers, and a shared-tier failure is
//! counted but never fails the operation. Consistency is bounded staleness:
//! coarse invalidation plus short TTLs, with posting lists outliving the
//! snapshot they describe so the snapshot stays authoritative.

pub mod config;
pub mod entry;
pub mod health;
pub mod hybrid;
pub mod memory;
pub mod redis;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::CacheEntry;
pub use health::{CacheHealth, HealthStatus, MemoryTierHealth, RedisTierHealth};
pub use hybrid::HybridCache;
pub use memory::{start_auto_sweep, MemoryCache};
pub use redis::{RedisCache, INVALIDATION_CHANNEL, NAMESPACE};
pub use types::{index_key, CacheStats, CacheValue, SNAPSHOT_KEY};
