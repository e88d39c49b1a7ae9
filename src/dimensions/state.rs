//! State targeting, dependent on the country dimension

use std::collections::HashMap;

use crate::dimensions::{DependentDimensionProcessor, DimensionProcessor};
use crate::models::{dimension, DeliveryRequest, TargetingRule};

/// State/province targeting. Only meaningful under a country that supports
/// state-level targeting, so this processor declares a `country` dependency
/// and matches through the dependency-aware path.
pub struct StateProcessor {
    country_states: HashMap<&'static str, Vec<&'static str>>,
}

impl StateProcessor {
    pub fn new() -> Self {
        Self {
            country_states: country_state_table(),
        }
    }

    fn states_for(&self, country: &str) -> Option<&[&'static str]> {
        self.country_states.get(country).map(Vec::as_slice)
    }
}

impl Default for StateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Countries that support state-level targeting and their state codes.
fn country_state_table() -> HashMap<&'static str, Vec<&'static str>> {
    HashMap::from([("in", vec!["gj", "ma", "ka"])])
}

impl DimensionProcessor for StateProcessor {
    fn name(&self) -> &'static str {
        dimension::STATE
    }

    fn extract(&self, request: &DeliveryRequest) -> String {
        request.state.clone()
    }

    fn normalize(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    fn validate(&self, rule: &TargetingRule) -> Result<(), String> {
        if rule.values.is_empty() {
            return Err("state rule must have at least one value".to_string());
        }
        for value in &rule.values {
            if value.trim().len() < 2 {
                return Err("state code must be at least 2 characters".to_string());
            }
        }
        Ok(())
    }

    fn as_dependent(&self) -> Option<&dyn DependentDimensionProcessor> {
        Some(self)
    }
}

impl DependentDimensionProcessor for StateProcessor {
    fn dependencies(&self) -> &[&'static str] {
        &[dimension::COUNTRY]
    }

    fn validate_with_dependencies(
        &self,
        rule: &TargetingRule,
        request: &DeliveryRequest,
    ) -> Result<(), String> {
        self.validate(rule)?;

        let country = request.country.trim().to_lowercase();
        if country.is_empty() {
            return Err("country is required for state targeting".to_string());
        }
        let Some(valid_states) = self.states_for(&country) else {
            return Err(format!(
                "country {} does not support state-level targeting",
                country
            ));
        };

        for value in &rule.values {
            let normalized = self.normalize(value);
            if !valid_states.contains(&normalized.as_str()) {
                return Err(format!("state {} is not valid for country {}", value, country));
            }
        }
        Ok(())
    }

    fn matches_with_dependencies(&self, rule: &TargetingRule, request: &DeliveryRequest) -> bool {
        let country = request.country.trim().to_lowercase();
        let Some(valid_states) = self.states_for(&country) else {
            return false;
        };

        let request_state = self.normalize(&request.state);
        if request_state.is_empty() {
            return false;
        }
        if !valid_states.contains(&request_state.as_str()) {
            return false;
        }

        self.matches(&request_state, rule)
    }
}
