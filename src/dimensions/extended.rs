//! Extended dimension processors: device type, age group, time of day
//!
//! These ride in the request's open-ended dimension map and demonstrate the
//! extension pattern: register a processor, add rules under its name, done.

use crate::dimensions::DimensionProcessor;
use crate::models::{dimension, DeliveryRequest, TargetingRule};

const VALID_DEVICE_TYPES: [&str; 3] = ["mobile", "tablet", "desktop"];

const VALID_AGE_GROUPS: [&str; 7] = [
    "13-17", "18-24", "25-34", "35-44", "45-54", "55-64", "65+",
];

/// Device class targeting (mobile, tablet, desktop).
pub struct DeviceTypeProcessor;

impl DimensionProcessor for DeviceTypeProcessor {
    fn name(&self) -> &'static str {
        dimension::DEVICE_TYPE
    }

    fn extract(&self, request: &DeliveryRequest) -> String {
        request.dimension_value(dimension::DEVICE_TYPE).to_string()
    }

    fn normalize(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    fn validate(&self, rule: &TargetingRule) -> Result<(), String> {
        if rule.values.is_empty() {
            return Err("device_type rule must have at least one value".to_string());
        }
        for value in &rule.values {
            if !VALID_DEVICE_TYPES.contains(&self.normalize(value).as_str()) {
                return Err("device_type must be one of: mobile, tablet, desktop".to_string());
            }
        }
        Ok(())
    }
}

/// Age bracket targeting over a fixed bracket list.
pub struct AgeGroupProcessor;

impl DimensionProcessor for AgeGroupProcessor {
    fn name(&self) -> &'static str {
        dimension::AGE_GROUP
    }

    fn extract(&self, request: &DeliveryRequest) -> String {
        request.dimension_value(dimension::AGE_GROUP).to_string()
    }

    fn normalize(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    fn validate(&self, rule: &TargetingRule) -> Result<(), String> {
        if rule.values.is_empty() {
            return Err("age_group rule must have at least one value".to_string());
        }
        for value in &rule.values {
            if !VALID_AGE_GROUPS.contains(&self.normalize(value).as_str()) {
                return Err("age_group must be one of the predefined age ranges".to_string());
            }
        }
        Ok(())
    }
}

/// Hour-of-day targeting. Rule values are single hours (`14`) or inclusive
/// ranges (`9-17`); the request carries the hour under `time_of_day`, so
/// matching stays a pure function of the request.
pub struct TimeOfDayProcessor;

impl TimeOfDayProcessor {
    fn parse_hour(value: &str) -> Option<u32> {
        let hour: u32 = value.trim().parse().ok()?;
        (hour <= 23).then_some(hour)
    }
}

impl DimensionProcessor for TimeOfDayProcessor {
    fn name(&self) -> &'static str {
        dimension::TIME_OF_DAY
    }

    fn extract(&self, request: &DeliveryRequest) -> String {
        request.dimension_value(dimension::TIME_OF_DAY).to_string()
    }

    fn normalize(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn validate(&self, rule: &TargetingRule) -> Result<(), String> {
        if rule.values.is_empty() {
            return Err("time_of_day rule must have at least one value".to_string());
        }
        for value in &rule.values {
            let value = value.trim();
            if let Some((start, end)) = value.split_once('-') {
                if Self::parse_hour(start).is_none() || Self::parse_hour(end).is_none() {
                    return Err("hour values must be integers between 0 and 23".to_string());
                }
            } else if Self::parse_hour(value).is_none() {
                return Err("hour must be an integer between 0 and 23".to_string());
            }
        }
        Ok(())
    }

    fn matches(&self, request_value: &str, rule: &TargetingRule) -> bool {
        let Some(hour) = Self::parse_hour(request_value) else {
            return false;
        };

        rule.values.iter().any(|value| {
            let value = value.trim();
            match value.split_once('-') {
                Some((start, end)) => {
                    match (Self::parse_hour(start), Self::parse_hour(end)) {
                        (Some(start), Some(end)) => start <= hour && hour <= end,
                        _ => false,
                    }
                }
                None => Self::parse_hour(value) == Some(hour),
            }
        })
    }
}
