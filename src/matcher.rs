//! Campaign matching: include-union, exclude-veto, per-dimension dispatch
//!
//! The matcher evaluates a campaign's rule set against a request by
//! dispatching every dimension group through its registered processor.
//! Include rules whitelist (OR within a dimension), exclude rules veto,
//! and all dimension groups must pass. Matching never returns an error;
//! anything unresolvable degrades to "no match" for that campaign.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::dimensions::{DimensionProcessor, DimensionRegistry};
use crate::models::{CampaignWithRules, DeliveryRequest, TargetingRule};

/// Evaluates campaigns against delivery requests through the dimension
/// registry handed in at construction.
pub struct CampaignMatcher {
    registry: Arc<DimensionRegistry>,
}

impl CampaignMatcher {
    pub fn new(registry: Arc<DimensionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DimensionRegistry {
        &self.registry
    }

    /// Decide whether a campaign admits a request.
    ///
    /// Pure in (campaign rules, request values): two calls with the same
    /// inputs yield the same result.
    pub fn matches(&self, campaign: &CampaignWithRules, request: &DeliveryRequest) -> bool {
        if !campaign.is_active() {
            return false;
        }
        // No rules means the campaign matches everyone.
        if campaign.rules.is_empty() {
            return true;
        }

        let mut by_dimension: HashMap<&str, Vec<&TargetingRule>> = HashMap::new();
        for rule in &campaign.rules {
            by_dimension
                .entry(rule.dimension.as_str())
                .or_default()
                .push(rule);
        }

        for (dimension, rules) in by_dimension {
            let Some(processor) = self.registry.get(dimension) else {
                // Unknown dimensions are skipped for forward compatibility
                // with rules this binary does not understand yet.
                warn!("skipping rules for unregistered dimension: {}", dimension);
                continue;
            };
            if !self.dimension_matches(request, &rules, processor.as_ref()) {
                return false;
            }
        }

        true
    }

    fn dimension_matches(
        &self,
        request: &DeliveryRequest,
        rules: &[&TargetingRule],
        processor: &dyn DimensionProcessor,
    ) -> bool {
        let (includes, excludes): (Vec<&TargetingRule>, Vec<&TargetingRule>) =
            rules.iter().copied().partition(|rule| rule.is_include());

        let request_value = processor.extract(request);
        if request_value.is_empty() {
            // A dimension absent from the request only passes when nothing
            // whitelists on it.
            return includes.is_empty();
        }

        let rule_applies = |rule: &TargetingRule| match processor.as_dependent() {
            Some(dependent) => dependent.matches_with_dependencies(rule, request),
            None => processor.matches(&request_value, rule),
        };

        if !includes.is_empty() && !includes.iter().any(|rule| rule_applies(rule)) {
            return false;
        }
        !excludes.iter().any(|rule| rule_applies(rule))
    }

    /// Validate a single rule. Unlike matching, ingestion-time validation
    /// treats an unknown dimension as an error so mis-registration is
    /// caught where it can be acted on.
    pub fn validate_rule(&self, rule: &TargetingRule) -> Result<(), String> {
        if rule.campaign_id.is_empty() {
            return Err("campaign_id is required".to_string());
        }
        if rule.values.is_empty() {
            return Err("values cannot be empty".to_string());
        }
        let Some(processor) = self.registry.get(&rule.dimension) else {
            return Err(format!("unknown dimension: {}", rule.dimension));
        };
        processor.validate(rule)
    }

    /// Validate one campaign's whole rule set, including the requirement
    /// that every dependent dimension's dependencies carry rules in the
    /// same campaign.
    pub fn validate_campaign_rules(&self, rules: &[TargetingRule]) -> Result<(), String> {
        for rule in rules {
            self.validate_rule(rule)?;

            let Some(processor) = self.registry.get(&rule.dimension) else {
                continue;
            };
            if let Some(dependent) = processor.as_dependent() {
                for dependency in dependent.dependencies() {
                    if !rules.iter().any(|r| r.dimension == *dependency) {
                        return Err(format!(
                            "dimension {} depends on {} but {} rules are not present",
                            rule.dimension, dependency, dependency
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
