//! Delivery request: an open-ended mapping from dimension name to value

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;
use crate::models::rule::dimension;

/// A request for ad delivery.
///
/// Country, os and app are always present and required; `state` and any
/// further dimensions are optional. Dimensions beyond the named fields ride
/// in `extra`, so new processors need no request changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub country: String,
    pub os: String,
    pub app: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl DeliveryRequest {
    pub fn new(country: impl Into<String>, os: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            os: os.into(),
            app: app.into(),
            state: String::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Set a dimension value by name, named fields and extras alike.
    pub fn with_dimension(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match name {
            dimension::COUNTRY => self.country = value,
            dimension::OS => self.os = value,
            dimension::APP => self.app = value,
            dimension::STATE => self.state = value,
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
        self
    }

    /// Validate the required dimensions. Messages are stable and surfaced
    /// verbatim by the delivery API.
    pub fn validate(&self) -> Result<(), DeliveryError> {
        if self.country.is_empty() {
            return Err(DeliveryError::Validation("country is required".to_string()));
        }
        if self.country.len() != 2 {
            return Err(DeliveryError::Validation(
                "country must be a 2-letter code".to_string(),
            ));
        }
        if self.os.is_empty() {
            return Err(DeliveryError::Validation("os is required".to_string()));
        }
        if self.app.is_empty() {
            return Err(DeliveryError::Validation("app is required".to_string()));
        }
        // State and extras are optional, nothing to check here.
        Ok(())
    }

    /// Canonicalize the request in place. Country, os and state fold to
    /// lowercase; app identifiers are case-sensitive and only trimmed.
    /// Extras are trimmed; their processors fold them per their own policy.
    pub fn normalize(&mut self) {
        self.country = self.country.trim().to_lowercase();
        self.os = self.os.trim().to_lowercase();
        self.app = self.app.trim().to_string();
        self.state = self.state.trim().to_lowercase();
        for value in self.extra.values_mut() {
            *value = value.trim().to_string();
        }
    }

    /// The request's value for a dimension, or the empty string if absent.
    pub fn dimension_value(&self, name: &str) -> &str {
        match name {
            dimension::COUNTRY => &self.country,
            dimension::OS => &self.os,
            dimension::APP => &self.app,
            dimension::STATE => &self.state,
            _ => self.extra.get(name).map(String::as_str).unwrap_or(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_dimensions() {
        let valid = DeliveryRequest::new("US", "Android", "com.any");
        assert!(valid.validate().is_ok());

        let missing_country = DeliveryRequest::new("", "Android", "com.any");
        assert_eq!(
            missing_country.validate().unwrap_err().to_string(),
            "country is required"
        );

        let long_country = DeliveryRequest::new("USA", "Android", "com.any");
        assert_eq!(
            long_country.validate().unwrap_err().to_string(),
            "country must be a 2-letter code"
        );

        let missing_os = DeliveryRequest::new("US", "", "com.any");
        assert_eq!(missing_os.validate().unwrap_err().to_string(), "os is required");

        let missing_app = DeliveryRequest::new("US", "Android", "");
        assert_eq!(missing_app.validate().unwrap_err().to_string(), "app is required");
    }

    #[test]
    fn test_normalize_folds_per_dimension_policy() {
        let mut request = DeliveryRequest::new(" US ", " iOS ", " com.Gametion.LudoKingGame ");
        request.state = " GJ ".to_string();
        request.normalize();

        assert_eq!(request.country, "us");
        assert_eq!(request.os, "ios");
        // App identifiers keep their case.
        assert_eq!(request.app, "com.Gametion.LudoKingGame");
        assert_eq!(request.state, "gj");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut request = DeliveryRequest::new(" US ", "Android", " com.any ");
        request.normalize();
        let once = request.clone();
        request.normalize();
        assert_eq!(request, once);
    }

    #[test]
    fn test_dimension_value_covers_extras() {
        let request = DeliveryRequest::new("us", "android", "com.any")
            .with_dimension("device_type", "mobile");

        assert_eq!(request.dimension_value("country"), "us");
        assert_eq!(request.dimension_value("device_type"), "mobile");
        assert_eq!(request.dimension_value("age_group"), "");
    }
}
