//! Campaign entities and the delivery response projection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::rule::TargetingRule;

/// An advertising inventory entry: creative, call to action and status.
///
/// Field names on the wire follow the delivery API (`cid`, `img`), which is
/// also how the shared cache tier stores snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(rename = "cid")]
    pub id: String,
    pub name: String,
    #[serde(rename = "img")]
    pub image_url: String,
    pub cta: String,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campaign lifecycle status. Only active campaigns are ever matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "INACTIVE")]
    Inactive,
}

impl Campaign {
    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }

    /// Project into the delivery API response shape.
    pub fn to_response(&self) -> CampaignResponse {
        CampaignResponse {
            cid: self.id.clone(),
            img: self.image_url.clone(),
            cta: self.cta.clone(),
        }
    }
}

/// The delivery API view of a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignResponse {
    pub cid: String,
    pub img: String,
    pub cta: String,
}

/// A campaign bundled with all of its targeting rules.
///
/// This is the unit that flows through the cache and the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignWithRules {
    #[serde(flatten)]
    pub campaign: Campaign,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<TargetingRule>,
}

impl CampaignWithRules {
    pub fn new(campaign: Campaign, rules: Vec<TargetingRule>) -> Self {
        Self { campaign, rules }
    }

    pub fn id(&self) -> &str {
        &self.campaign.id
    }

    pub fn is_active(&self) -> bool {
        self.campaign.is_active()
    }

    pub fn to_response(&self) -> CampaignResponse {
        self.campaign.to_response()
    }
}
