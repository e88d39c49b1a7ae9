//! Campaign data access: the source-of-truth seam and its caching wrapper

pub mod cached;
pub mod memory;

pub use cached::CachedRepository;
pub use memory::MemoryRepository;

use async_trait::async_trait;

use crate::models::CampaignWithRules;

/// Source of active campaigns with their targeting rules.
///
/// The relational store lives behind this seam; the crate ships an
/// in-process implementation and the cache-aware wrapper.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// All currently-active campaigns bundled with their rules.
    async fn active_campaigns_with_rules(&self) -> anyhow::Result<Vec<CampaignWithRules>>;
}
