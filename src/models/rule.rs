//! Targeting rules: where a campaign is allowed to run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known dimension names. The registry is open-ended; these are the
/// names this crate registers processors for out of the box.
pub mod dimension {
    pub const COUNTRY: &str = "country";
    pub const OS: &str = "os";
    pub const APP: &str = "app";
    pub const STATE: &str = "state";
    pub const DEVICE_TYPE: &str = "device_type";
    pub const AGE_GROUP: &str = "age_group";
    pub const TIME_OF_DAY: &str = "time_of_day";
}

/// A single include/exclude predicate over one targeting dimension.
///
/// `values` is non-empty by validation; its ordering carries no meaning and
/// duplicate values are idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingRule {
    #[serde(default)]
    pub id: i64,
    pub campaign_id: String,
    pub dimension: String,
    pub rule_type: RuleType,
    pub values: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Include rules whitelist, exclude rules veto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Include,
    Exclude,
}

impl TargetingRule {
    pub fn new(
        campaign_id: &str,
        dimension: &str,
        rule_type: RuleType,
        values: &[&str],
    ) -> Self {
        Self {
            id: 0,
            campaign_id: campaign_id.to_string(),
            dimension: dimension.to_string(),
            rule_type,
            values: values.iter().map(|v| v.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    pub fn include(campaign_id: &str, dimension: &str, values: &[&str]) -> Self {
        Self::new(campaign_id, dimension, RuleType::Include, values)
    }

    pub fn exclude(campaign_id: &str, dimension: &str, values: &[&str]) -> Self {
        Self::new(campaign_id, dimension, RuleType::Exclude, values)
    }

    pub fn is_include(&self) -> bool {
        self.rule_type == RuleType::Include
    }
}
