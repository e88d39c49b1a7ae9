//! Cache-aware repository: read-through snapshot, detached index
//! materialization and the index-assisted fast path

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::cache::{CacheHealth, CacheStats, HybridCache};
use crate::dimensions::DimensionRegistry;
use crate::error::CacheResult;
use crate::models::{CampaignWithRules, DeliveryRequest};
use crate::repository::CampaignRepository;

/// Deadline for detached materialization work, independent of any request
/// deadline so a timed-out request cannot abort an in-progress warm-up.
const MATERIALIZE_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on concurrently running materialization tasks. When the worker set
/// is saturated the warm-up is shed, not queued.
const MATERIALIZE_WORKERS: usize = 2;

/// Wraps a source-of-truth repository with the hybrid cache.
///
/// A snapshot miss falls back to the source, returns the result to the
/// caller immediately and materializes the snapshot plus the per-dimension
/// inverted indexes in a detached task.
pub struct CachedRepository {
    source: Arc<dyn CampaignRepository>,
    cache: Arc<HybridCache>,
    registry: Arc<DimensionRegistry>,
    materialize_permits: Arc<Semaphore>,
}

impl CachedRepository {
    pub fn new(
        source: Arc<dyn CampaignRepository>,
        cache: Arc<HybridCache>,
        registry: Arc<DimensionRegistry>,
    ) -> Self {
        Self {
            source,
            cache,
            registry,
            materialize_permits: Arc::new(Semaphore::new(MATERIALIZE_WORKERS)),
        }
    }

    async fn fetch_and_materialize(&self) -> anyhow::Result<Vec<CampaignWithRules>> {
        let campaigns = self.source.active_campaigns_with_rules().await?;
        self.spawn_materialization(campaigns.clone());
        Ok(campaigns)
    }

    fn spawn_materialization(&self, campaigns: Vec<CampaignWithRules>) {
        let Ok(permit) = Arc::clone(&self.materialize_permits).try_acquire_owned() else {
            warn!("materialization workers saturated, skipping cache warm-up");
            return;
        };

        let cache = Arc::clone(&self.cache);
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let _permit = permit;
            let work = materialize(cache, registry, campaigns);
            if tokio::time::timeout(MATERIALIZE_TIMEOUT, work).await.is_err() {
                warn!(
                    "cache materialization timed out after {:?}",
                    MATERIALIZE_TIMEOUT
                );
            }
        });
    }

    /// Index-assisted lookup: union the posting lists of the request's
    /// dimension values and filter the snapshot down to that candidate set.
    ///
    /// The union is deliberate — a campaign with no rule on a dimension has
    /// no posting list entry there yet still implicitly matches it, so an
    /// intersection would wrongly drop it. When no index can answer, the
    /// lookup degrades to the full-snapshot path.
    pub async fn campaigns_for_request(
        &self,
        request: &DeliveryRequest,
    ) -> anyhow::Result<Vec<CampaignWithRules>> {
        match self.candidate_ids(request).await {
            None => self.active_campaigns_with_rules().await,
            Some(candidates) => {
                let campaigns = self.active_campaigns_with_rules().await?;
                Ok(campaigns
                    .into_iter()
                    .filter(|campaign| candidates.contains(campaign.id()))
                    .collect())
            }
        }
    }

    /// Candidate identifiers from the posting lists, or `None` when no
    /// usable index was found and the caller must fall back.
    async fn candidate_ids(&self, request: &DeliveryRequest) -> Option<HashSet<String>> {
        let mut union: HashSet<String> = HashSet::new();
        let mut any_index = false;

        for processor in self.registry.processors() {
            let value = processor.extract(request);
            if value.is_empty() {
                continue;
            }
            let normalized = processor.normalize(&value);
            match self.cache.get_campaign_index(processor.name(), &normalized).await {
                Ok(ids) if !ids.is_empty() => {
                    any_index = true;
                    union.extend(ids);
                }
                Ok(_) => {}
                // A miss or degraded lookup leaves this dimension out of
                // the candidate set.
                Err(_) => {}
            }
        }

        any_index.then_some(union)
    }

    /// Drop all cached snapshots and indexes.
    pub async fn invalidate_cache(&self) -> CacheResult<()> {
        self.cache.invalidate_all().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn cache_health(&self) -> CacheHealth {
        self.cache.health().await
    }
}

#[async_trait]
impl CampaignRepository for CachedRepository {
    async fn active_campaigns_with_rules(&self) -> anyhow::Result<Vec<CampaignWithRules>> {
        match self.cache.get_active_campaigns().await {
            Ok(campaigns) => Ok(campaigns),
            Err(_) => self.fetch_and_materialize().await,
        }
    }
}

/// Write the snapshot and every posting list to the cache. Indexes get the
/// longer TTL so they outlive the snapshot they describe.
async fn materialize(
    cache: Arc<HybridCache>,
    registry: Arc<DimensionRegistry>,
    campaigns: Vec<CampaignWithRules>,
) {
    let snapshot_ttl = cache.config().snapshot_ttl;
    let index_ttl = cache.config().index_ttl();

    if let Err(err) = cache.set_active_campaigns(&campaigns, snapshot_ttl).await {
        warn!("failed to cache campaign snapshot: {}", err);
    }

    let postings = build_postings(&registry, &campaigns);
    let count = postings.len();
    for ((dimension, value), ids) in postings {
        if let Err(err) = cache
            .set_campaign_index(&dimension, &value, &ids, index_ttl)
            .await
        {
            warn!("failed to cache index {}:{}: {}", dimension, value, err);
        }
    }
    debug!("materialized snapshot and {} posting lists", count);
}

/// Posting lists keyed by (dimension, normalized value).
///
/// Only include-rules are indexed; exclude-rules are never pre-indexed.
/// Identifiers are appended as encountered — duplicates are possible and
/// harmless for the downstream union filter. Rules for dimensions without a
/// registered processor are skipped, matching the matcher's treatment.
fn build_postings(
    registry: &DimensionRegistry,
    campaigns: &[CampaignWithRules],
) -> BTreeMap<(String, String), Vec<String>> {
    let mut postings: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();

    for campaign in campaigns {
        if !campaign.is_active() {
            continue;
        }
        for rule in &campaign.rules {
            if !rule.is_include() {
                continue;
            }
            let Some(processor) = registry.get(&rule.dimension) else {
                continue;
            };
            for value in &rule.values {
                postings
                    .entry((rule.dimension.clone(), processor.normalize(value)))
                    .or_default()
                    .push(campaign.id().to_string());
            }
        }
    }

    postings
}
