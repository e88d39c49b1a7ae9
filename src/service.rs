//! Delivery service: the hot-path orchestrator
//!
//! The only entry point the transport layer calls. The order is fixed:
//! validate, normalize, fetch the snapshot through the repository, filter
//! through the matcher, project.

use std::sync::Arc;

use tracing::error;

use crate::dimensions::DimensionRegistry;
use crate::error::DeliveryError;
use crate::matcher::CampaignMatcher;
use crate::models::{CampaignResponse, DeliveryRequest};
use crate::repository::CampaignRepository;

/// Finds the campaigns whose targeting rules admit a delivery request.
pub struct DeliveryService {
    repository: Arc<dyn CampaignRepository>,
    matcher: CampaignMatcher,
}

impl DeliveryService {
    pub fn new(repository: Arc<dyn CampaignRepository>, registry: Arc<DimensionRegistry>) -> Self {
        Self {
            repository,
            matcher: CampaignMatcher::new(registry),
        }
    }

    pub fn matcher(&self) -> &CampaignMatcher {
        &self.matcher
    }

    /// All campaigns admitting the request, projected for the delivery API.
    ///
    /// Validation failures surface with stable messages and never touch the
    /// cache or the source; source failures surface as the generic
    /// retrieval error.
    pub async fn get_campaigns(
        &self,
        request: &DeliveryRequest,
    ) -> Result<Vec<CampaignResponse>, DeliveryError> {
        request.validate()?;

        let mut request = request.clone();
        request.normalize();

        let campaigns = self
            .repository
            .active_campaigns_with_rules()
            .await
            .map_err(|err| {
                error!("failed to load campaign snapshot: {}", err);
                DeliveryError::Retrieval
            })?;

        Ok(campaigns
            .iter()
            .filter(|campaign| self.matcher.matches(campaign, &request))
            .map(|campaign| campaign.to_response())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CampaignWithRules;
    use crate::repository::MemoryRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRepository {
        calls: AtomicUsize,
        inner: MemoryRepository,
    }

    #[async_trait]
    impl CampaignRepository for CountingRepository {
        async fn active_campaigns_with_rules(&self) -> anyhow::Result<Vec<CampaignWithRules>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.active_campaigns_with_rules().await
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl CampaignRepository for FailingRepository {
        async fn active_campaigns_with_rules(&self) -> anyhow::Result<Vec<CampaignWithRules>> {
            anyhow::bail!("connection pool exhausted")
        }
    }

    fn service_with(repository: Arc<dyn CampaignRepository>) -> DeliveryService {
        DeliveryService::new(repository, Arc::new(DimensionRegistry::with_builtins()))
    }

    #[tokio::test]
    async fn test_matching_campaigns_are_projected() {
        let service = service_with(Arc::new(MemoryRepository::sample()));
        let request = DeliveryRequest::new("US", "Android", "com.any");

        let campaigns = service.get_campaigns(&request).await.unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].cid, "spotify");
        assert_eq!(campaigns[0].cta, "Download");
    }

    #[tokio::test]
    async fn test_validation_error_skips_the_repository() {
        let repository = Arc::new(CountingRepository {
            calls: AtomicUsize::new(0),
            inner: MemoryRepository::sample(),
        });
        let service = service_with(repository.clone());

        let request = DeliveryRequest::new("", "Android", "com.any");
        let err = service.get_campaigns(&request).await.unwrap_err();

        assert_eq!(err.to_string(), "country is required");
        assert_eq!(repository.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_source_failure_surfaces_generic_error() {
        let service = service_with(Arc::new(FailingRepository));
        let request = DeliveryRequest::new("US", "Android", "com.any");

        let err = service.get_campaigns(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "failed to retrieve campaigns");
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_request_is_normalized_before_matching() {
        let service = service_with(Arc::new(MemoryRepository::sample()));

        // Mixed-case country still matches spotify's include rule.
        let request = DeliveryRequest::new("Us", "ANDROID", "com.any");
        let campaigns = service.get_campaigns(&request).await.unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].cid, "spotify");
    }

    #[tokio::test]
    async fn test_no_match_yields_empty_list() {
        let service = service_with(Arc::new(MemoryRepository::sample()));

        let request = DeliveryRequest::new("DE", "Windows", "com.any");
        let campaigns = service.get_campaigns(&request).await.unwrap();
        assert!(campaigns.is_empty());
    }
}
