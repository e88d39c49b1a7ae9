//! In-process source of truth with a seeded sample inventory

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{
    dimension, Campaign, CampaignStatus, CampaignWithRules, TargetingRule,
};
use crate::repository::CampaignRepository;

/// Campaign source backed by process memory.
///
/// Stands in for the relational store in the demo binary and in tests.
pub struct MemoryRepository {
    campaigns: Vec<CampaignWithRules>,
}

impl MemoryRepository {
    pub fn new(campaigns: Vec<CampaignWithRules>) -> Self {
        Self { campaigns }
    }

    /// Repository seeded with the sample inventory.
    pub fn sample() -> Self {
        let now = Utc::now();
        let campaign = |id: &str, name: &str, img: &str, cta: &str| Campaign {
            id: id.to_string(),
            name: name.to_string(),
            image_url: img.to_string(),
            cta: cta.to_string(),
            status: CampaignStatus::Active,
            created_at: now,
            updated_at: now,
        };

        Self::new(vec![
            CampaignWithRules::new(
                campaign("spotify", "Spotify - Music for everyone", "https://somelink", "Download"),
                vec![TargetingRule::include(
                    "spotify",
                    dimension::COUNTRY,
                    &["US", "Canada"],
                )],
            ),
            CampaignWithRules::new(
                campaign("duolingo", "Duolingo: Best way to learn", "https://somelink2", "Install"),
                vec![
                    TargetingRule::include("duolingo", dimension::OS, &["Android", "iOS"]),
                    TargetingRule::exclude("duolingo", dimension::COUNTRY, &["US"]),
                ],
            ),
            CampaignWithRules::new(
                campaign("subwaysurfer", "Subway Surfer", "https://somelink3", "Play"),
                vec![
                    TargetingRule::include("subwaysurfer", dimension::OS, &["Android"]),
                    TargetingRule::include(
                        "subwaysurfer",
                        dimension::APP,
                        &["com.gametion.ludokinggame"],
                    ),
                ],
            ),
        ])
    }
}

#[async_trait]
impl CampaignRepository for MemoryRepository {
    async fn active_campaigns_with_rules(&self) -> anyhow::Result<Vec<CampaignWithRules>> {
        Ok(self
            .campaigns
            .iter()
            .filter(|campaign| campaign.is_active())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_inventory() {
        let repository = MemoryRepository::sample();
        let campaigns = repository.active_campaigns_with_rules().await.unwrap();

        assert_eq!(campaigns.len(), 3);
        assert!(campaigns.iter().any(|c| c.id() == "spotify"));
        assert!(campaigns.iter().any(|c| c.id() == "duolingo"));
        assert!(campaigns.iter().any(|c| c.id() == "subwaysurfer"));
    }

    #[tokio::test]
    async fn test_inactive_campaigns_are_filtered() {
        let now = Utc::now();
        let inactive = CampaignWithRules::new(
            Campaign {
                id: "paused".to_string(),
                name: "Paused".to_string(),
                image_url: "https://somelink".to_string(),
                cta: "Install".to_string(),
                status: CampaignStatus::Inactive,
                created_at: now,
                updated_at: now,
            },
            Vec::new(),
        );

        let repository = MemoryRepository::new(vec![inactive]);
        let campaigns = repository.active_campaigns_with_rules().await.unwrap();
        assert!(campaigns.is_empty());
    }
}
