//! Hybrid cache: local and shared tiers behind one typed interface

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::config::CacheConfig;
use crate::cache::health::{
    overall_of, CacheHealth, HealthStatus, MemoryTierHealth, RedisTierHealth,
    MEMORY_DEGRADED_UTIL_PCT, REDIS_DEGRADED_LATENCY,
};
use crate::cache::memory::MemoryCache;
use crate::cache::redis::RedisCache;
use crate::cache::types::{index_key, CacheStats, CacheValue, SNAPSHOT_KEY};
use crate::error::{CacheError, CacheResult};
use crate::models::CampaignWithRules;

/// Fronts the local and shared tiers.
///
/// Reads go local-first; a shared-tier hit warms the local tier with the
/// default snapshot TTL before returning. Writes fan out to both enabled
/// tiers; the local write cannot fail and a shared-tier failure is counted
/// and logged but never fails the operation. Every shared-tier call runs
/// under the configured per-operation deadline.
#[derive(Debug)]
pub struct HybridCache {
    memory: Option<Arc<MemoryCache>>,
    redis: Option<RedisCache>,
    config: CacheConfig,
    stats: RwLock<CacheStats>,
    started_at: DateTime<Utc>,
}

impl HybridCache {
    /// Build the cache per configuration. A shared-tier connection or ping
    /// failure here is fatal; after construction it only ever degrades.
    pub async fn new(config: CacheConfig) -> CacheResult<Self> {
        config.validate().map_err(CacheError::Config)?;

        let memory = config
            .enable_memory
            .then(|| Arc::new(MemoryCache::new(config.memory_max_entries)));
        let redis = if config.enable_redis {
            Some(
                RedisCache::connect(&config.redis_addr, &config.redis_password, config.redis_db)
                    .await?,
            )
        } else {
            None
        };

        info!(
            "hybrid cache ready (memory: {}, redis: {})",
            memory.is_some(),
            redis.is_some()
        );

        Ok(Self {
            memory,
            redis,
            config,
            stats: RwLock::new(CacheStats::default()),
            started_at: Utc::now(),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Local tier handle, for wiring the background sweeper.
    pub fn memory_tier(&self) -> Option<Arc<MemoryCache>> {
        self.memory.clone()
    }

    async fn with_deadline<T>(
        &self,
        operation: impl Future<Output = CacheResult<T>>,
    ) -> CacheResult<T> {
        match tokio::time::timeout(self.config.op_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.config.op_timeout)),
        }
    }

    /// The active-campaign snapshot, or [`CacheError::Miss`].
    pub async fn get_active_campaigns(&self) -> CacheResult<Vec<CampaignWithRules>> {
        if let Some(memory) = &self.memory {
            if let Some(CacheValue::Campaigns(campaigns)) = memory.get(SNAPSHOT_KEY).await {
                self.record_hit().await;
                debug!("local tier hit: {}", SNAPSHOT_KEY);
                return Ok(campaigns);
            }
        }

        if let Some(redis) = &self.redis {
            match self.with_deadline(redis.get_campaigns()).await {
                Ok(campaigns) => {
                    self.record_hit().await;
                    debug!("shared tier hit: {}", SNAPSHOT_KEY);
                    if let Some(memory) = &self.memory {
                        memory
                            .set(
                                SNAPSHOT_KEY,
                                CacheValue::Campaigns(campaigns.clone()),
                                self.config.snapshot_ttl,
                            )
                            .await;
                    }
                    return Ok(campaigns);
                }
                Err(CacheError::Miss) => {}
                Err(err) => {
                    warn!("shared tier read failed for {}: {}", SNAPSHOT_KEY, err);
                    self.record_error().await;
                }
            }
        }

        self.record_miss().await;
        Err(CacheError::Miss)
    }

    /// Store the snapshot in every enabled tier.
    pub async fn set_active_campaigns(
        &self,
        campaigns: &[CampaignWithRules],
        ttl: Duration,
    ) -> CacheResult<()> {
        if let Some(memory) = &self.memory {
            memory
                .set(SNAPSHOT_KEY, CacheValue::Campaigns(campaigns.to_vec()), ttl)
                .await;
        }
        if let Some(redis) = &self.redis {
            if let Err(err) = self.with_deadline(redis.set_campaigns(campaigns, ttl)).await {
                warn!("shared tier write failed for {}: {}", SNAPSHOT_KEY, err);
                self.record_error().await;
            }
        }
        Ok(())
    }

    /// A posting list for (dimension, normalized value), or
    /// [`CacheError::Miss`].
    pub async fn get_campaign_index(
        &self,
        dimension: &str,
        value: &str,
    ) -> CacheResult<Vec<String>> {
        let key = index_key(dimension, value);

        if let Some(memory) = &self.memory {
            if let Some(CacheValue::CampaignIds(ids)) = memory.get(&key).await {
                self.record_hit().await;
                return Ok(ids);
            }
        }

        if let Some(redis) = &self.redis {
            match self.with_deadline(redis.get_index(&key)).await {
                Ok(ids) => {
                    self.record_hit().await;
                    if let Some(memory) = &self.memory {
                        memory
                            .set(
                                &key,
                                CacheValue::CampaignIds(ids.clone()),
                                self.config.index_ttl(),
                            )
                            .await;
                    }
                    return Ok(ids);
                }
                Err(CacheError::Miss) => {}
                Err(err) => {
                    warn!("shared tier read failed for {}: {}", key, err);
                    self.record_error().await;
                }
            }
        }

        self.record_miss().await;
        Err(CacheError::Miss)
    }

    /// Store a posting list in every enabled tier.
    pub async fn set_campaign_index(
        &self,
        dimension: &str,
        value: &str,
        campaign_ids: &[String],
        ttl: Duration,
    ) -> CacheResult<()> {
        let key = index_key(dimension, value);

        if let Some(memory) = &self.memory {
            memory
                .set(&key, CacheValue::CampaignIds(campaign_ids.to_vec()), ttl)
                .await;
        }
        if let Some(redis) = &self.redis {
            if let Err(err) = self
                .with_deadline(redis.set_index(&key, campaign_ids, ttl))
                .await
            {
                warn!("shared tier write failed for {}: {}", key, err);
                self.record_error().await;
            }
        }
        Ok(())
    }

    /// Drop everything from every enabled tier. Best-effort: shared-tier
    /// failures are logged and counted, not surfaced.
    pub async fn invalidate_all(&self) -> CacheResult<()> {
        if let Some(memory) = &self.memory {
            memory.clear().await;
        }
        if let Some(redis) = &self.redis {
            if let Err(err) = self.with_deadline(redis.clear()).await {
                warn!("shared tier invalidation failed: {}", err);
                self.record_error().await;
            }
        }
        info!("cache invalidated");
        Ok(())
    }

    /// Drop the local tier only, the reaction to a broadcast invalidation.
    pub async fn drop_local(&self) {
        if let Some(memory) = &self.memory {
            memory.clear().await;
        }
    }

    /// Broadcast an invalidation event to other instances.
    pub async fn publish_invalidation(&self, event: &str) -> CacheResult<()> {
        match &self.redis {
            Some(redis) => self.with_deadline(redis.publish_invalidation(event)).await,
            None => Ok(()),
        }
    }

    /// Subscribe to the invalidation channel in a background task; every
    /// message drops the local tier. Returns `None` when the shared tier is
    /// disabled.
    pub fn spawn_invalidation_listener(&self) -> Option<JoinHandle<()>> {
        let redis = self.redis.clone()?;
        let memory = self.memory.clone();

        Some(tokio::spawn(async move {
            let result = redis
                .listen_invalidation(move |event| {
                    let memory = memory.clone();
                    async move {
                        info!("invalidation broadcast ({}), dropping local tier", event);
                        if let Some(memory) = memory {
                            memory.clear().await;
                        }
                    }
                })
                .await;
            if let Err(err) = result {
                warn!("invalidation subscription ended: {}", err);
            }
        }))
    }

    /// Current counters with the hit ratio recomputed.
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone().with_ratio()
    }

    async fn record_hit(&self) {
        let mut stats = self.stats.write().await;
        stats.hits += 1;
        stats.total_ops += 1;
        stats.last_updated = Utc::now();
    }

    async fn record_miss(&self) {
        let mut stats = self.stats.write().await;
        stats.misses += 1;
        stats.total_ops += 1;
        stats.last_updated = Utc::now();
    }

    async fn record_error(&self) {
        let mut stats = self.stats.write().await;
        stats.errors += 1;
        stats.last_updated = Utc::now();
    }

    /// Composite health report over both tiers.
    pub async fn health(&self) -> CacheHealth {
        let memory = self.memory_health().await;
        let redis = self.redis_health().await;
        let overall = overall_of(&memory, &redis);

        CacheHealth {
            overall,
            memory,
            redis,
            stats: self.stats().await,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            last_test: Utc::now(),
        }
    }

    async fn memory_health(&self) -> MemoryTierHealth {
        let Some(memory) = &self.memory else {
            return MemoryTierHealth::disabled();
        };

        let size = memory.len().await;
        let max_size = memory.max_entries();
        let util_pct = if max_size > 0 {
            size as f64 / max_size as f64 * 100.0
        } else {
            0.0
        };
        let status = if util_pct > MEMORY_DEGRADED_UTIL_PCT {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        MemoryTierHealth {
            enabled: true,
            status,
            size,
            max_size,
            util_pct,
            evicted_keys: memory.evicted_count().await,
        }
    }

    async fn redis_health(&self) -> RedisTierHealth {
        let Some(redis) = &self.redis else {
            return RedisTierHealth::disabled(self.config.redis_addr.clone());
        };

        match self.with_deadline(redis.ping()).await {
            Ok(latency) => {
                let status = if latency > REDIS_DEGRADED_LATENCY {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                };
                RedisTierHealth {
                    enabled: true,
                    status,
                    connected: true,
                    address: redis.addr().to_string(),
                    latency_ms: latency.as_millis() as u64,
                    error: None,
                }
            }
            Err(err) => RedisTierHealth {
                enabled: true,
                status: HealthStatus::Unhealthy,
                connected: false,
                address: redis.addr().to_string(),
                latency_ms: 0,
                error: Some(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Campaign, CampaignStatus, CampaignWithRules};

    fn memory_only_config() -> CacheConfig {
        CacheConfig::builder()
            .enable_redis(false)
            .memory_max_entries(100)
            .snapshot_ttl(Duration::from_secs(60))
            .build()
    }

    fn sample_snapshot() -> Vec<CampaignWithRules> {
        let now = Utc::now();
        vec![CampaignWithRules::new(
            Campaign {
                id: "spotify".to_string(),
                name: "Spotify".to_string(),
                image_url: "https://somelink".to_string(),
                cta: "Download".to_string(),
                status: CampaignStatus::Active,
                created_at: now,
                updated_at: now,
            },
            Vec::new(),
        )]
    }

    #[tokio::test]
    async fn test_snapshot_read_your_writes() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();
        let snapshot = sample_snapshot();

        cache
            .set_active_campaigns(&snapshot, Duration::from_secs(60))
            .await
            .unwrap();

        let cached = cache.get_active_campaigns().await.unwrap();
        assert_eq!(cached, snapshot);
    }

    #[tokio::test]
    async fn test_snapshot_reads_are_stable_until_expiry() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();
        let snapshot = sample_snapshot();

        cache
            .set_active_campaigns(&snapshot, Duration::from_secs(60))
            .await
            .unwrap();

        let first = cache.get_active_campaigns().await.unwrap();
        let second = cache.get_active_campaigns().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_miss_is_typed() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();
        let err = cache.get_active_campaigns().await.unwrap_err();
        assert!(err.is_miss());
    }

    #[tokio::test]
    async fn test_counters_track_hits_and_misses() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();

        let _ = cache.get_active_campaigns().await; // miss
        cache
            .set_active_campaigns(&sample_snapshot(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.get_active_campaigns().await.unwrap(); // hit
        cache.get_active_campaigns().await.unwrap(); // hit

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.total_ops, 3);
        assert!((stats.hit_ratio - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_posting_list_roundtrip() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();
        let ids = vec!["spotify".to_string(), "duolingo".to_string()];

        cache
            .set_campaign_index("country", "us", &ids, Duration::from_secs(60))
            .await
            .unwrap();

        let cached = cache.get_campaign_index("country", "us").await.unwrap();
        assert_eq!(cached, ids);

        let err = cache.get_campaign_index("country", "de").await.unwrap_err();
        assert!(err.is_miss());
    }

    #[tokio::test]
    async fn test_invalidate_all_yields_local_miss() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();

        cache
            .set_active_campaigns(&sample_snapshot(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.invalidate_all().await.unwrap();

        assert!(cache.get_active_campaigns().await.unwrap_err().is_miss());
    }

    #[tokio::test]
    async fn test_drop_local_clears_the_memory_tier() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();

        cache
            .set_active_campaigns(&sample_snapshot(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.drop_local().await;

        assert!(cache.get_active_campaigns().await.unwrap_err().is_miss());
    }

    #[tokio::test]
    async fn test_health_with_redis_disabled() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();
        let health = cache.health().await;

        assert_eq!(health.overall, HealthStatus::Healthy);
        assert!(health.memory.enabled);
        assert_eq!(health.memory.status, HealthStatus::Healthy);
        assert!(!health.redis.enabled);
        assert_eq!(health.redis.status, HealthStatus::Disabled);
    }

    #[tokio::test]
    async fn test_health_unhealthy_when_all_tiers_disabled() {
        let config = CacheConfig::builder()
            .enable_memory(false)
            .enable_redis(false)
            .build();
        let cache = HybridCache::new(config).await.unwrap();

        let health = cache.health().await;
        assert_eq!(health.overall, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_publish_invalidation_without_redis_is_a_noop() {
        let cache = HybridCache::new(memory_only_config()).await.unwrap();
        assert!(cache.publish_invalidation("refresh").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let mut config = memory_only_config();
        config.memory_max_entries = 0;

        let err = HybridCache::new(config).await.unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
    }
}
