//! Built-in processors for the three always-present dimensions

use crate::dimensions::DimensionProcessor;
use crate::models::{dimension, DeliveryRequest, TargetingRule};

/// Country targeting. ISO-style two-letter codes, compared case-insensitively.
pub struct CountryProcessor;

impl DimensionProcessor for CountryProcessor {
    fn name(&self) -> &'static str {
        dimension::COUNTRY
    }

    fn extract(&self, request: &DeliveryRequest) -> String {
        request.country.clone()
    }

    fn normalize(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    fn validate(&self, rule: &TargetingRule) -> Result<(), String> {
        if rule.values.is_empty() {
            return Err("country rule must have at least one value".to_string());
        }
        for value in &rule.values {
            if value.trim().len() < 2 {
                return Err("country code must be at least 2 characters".to_string());
            }
        }
        Ok(())
    }
}

/// Operating system targeting, compared case-insensitively. The value set
/// is open; unknown platforms are accepted.
pub struct OsProcessor;

impl DimensionProcessor for OsProcessor {
    fn name(&self) -> &'static str {
        dimension::OS
    }

    fn extract(&self, request: &DeliveryRequest) -> String {
        request.os.clone()
    }

    fn normalize(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    fn validate(&self, rule: &TargetingRule) -> Result<(), String> {
        if rule.values.is_empty() {
            return Err("os rule must have at least one value".to_string());
        }
        for value in &rule.values {
            if value.trim().is_empty() {
                return Err("os value cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Application identifier targeting. App IDs are case-sensitive by platform
/// convention, so normalization only trims.
pub struct AppProcessor;

impl DimensionProcessor for AppProcessor {
    fn name(&self) -> &'static str {
        dimension::APP
    }

    fn extract(&self, request: &DeliveryRequest) -> String {
        request.app.clone()
    }

    fn normalize(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn validate(&self, rule: &TargetingRule) -> Result<(), String> {
        if rule.values.is_empty() {
            return Err("app rule must have at least one value".to_string());
        }
        for value in &rule.values {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err("app ID cannot be empty".to_string());
            }
            if !trimmed.contains('.') {
                return Err(
                    "app ID should follow package naming convention (e.g. com.company.app)"
                        .to_string(),
                );
            }
        }
        Ok(())
    }
}
