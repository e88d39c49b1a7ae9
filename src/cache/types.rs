//! Core cache payload and statistics types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::CampaignWithRules;

/// Key of the full active-campaign snapshot.
pub const SNAPSHOT_KEY: &str = "campaigns:active";

/// Key of a posting list for one (dimension, normalized value) pair.
///
/// The value must already be normalized by the dimension's processor; the
/// shared tier additionally prefixes the application namespace.
pub fn index_key(dimension: &str, value: &str) -> String {
    format!("index:{}:{}", dimension, value)
}

/// Payload stored in the cache tiers.
///
/// The tiers treat this as opaque; the typed accessors live on the hybrid
/// cache. A tagged enum stands in for the dynamically-typed payloads of
/// less strict runtimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheValue {
    /// The active-campaign snapshot.
    Campaigns(Vec<CampaignWithRules>),
    /// A posting list of campaign identifiers.
    CampaignIds(Vec<String>),
}

impl CacheValue {
    pub fn into_campaigns(self) -> Option<Vec<CampaignWithRules>> {
        match self {
            CacheValue::Campaigns(campaigns) => Some(campaigns),
            CacheValue::CampaignIds(_) => None,
        }
    }

    pub fn into_campaign_ids(self) -> Option<Vec<String>> {
        match self {
            CacheValue::CampaignIds(ids) => Some(ids),
            CacheValue::Campaigns(_) => None,
        }
    }
}

/// Cache performance counters. All counts are monotonically non-decreasing;
/// the hit ratio is recomputed whenever stats are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub total_ops: u64,
    pub hit_ratio: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self {
            hits: 0,
            misses: 0,
            errors: 0,
            total_ops: 0,
            hit_ratio: 0.0,
            last_updated: Utc::now(),
        }
    }
}

impl CacheStats {
    /// Recompute the hit ratio from the counters. Zero operations leave the
    /// ratio at zero.
    pub fn with_ratio(mut self) -> Self {
        if self.total_ops > 0 {
            self.hit_ratio = self.hits as f64 / self.total_ops as f64;
        }
        self
    }
}
