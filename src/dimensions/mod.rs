//! # Pluggable targeting dimensions
//!
//! Every targeting axis (country, os, app, state, ...) is handled by one
//! [`DimensionProcessor`]: value extraction from the request, per-dimension
//! normalization, rule validation and rule matching. The matcher and the
//! cache never know a concrete dimension; they go through the
//! [`DimensionRegistry`].
//!
//! Registration is a construction-time concern. The registry is handed to
//! the matcher and service explicitly and is read-only on the hot path.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use adrelay::dimensions::{DimensionRegistry, StateProcessor};
//!
//! let mut registry = DimensionRegistry::with_builtins();
//! registry.register(Arc::new(StateProcessor::new()));
//! assert!(registry.contains("state"));
//! ```

pub mod builtin;
pub mod extended;
pub mod state;

pub use builtin::{AppProcessor, CountryProcessor, OsProcessor};
pub use extended::{AgeGroupProcessor, DeviceTypeProcessor, TimeOfDayProcessor};
pub use state::StateProcessor;

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{DeliveryRequest, TargetingRule};

/// One targeting axis: extraction, normalization, validation and matching.
pub trait DimensionProcessor: Send + Sync {
    /// Stable identifier matching `TargetingRule::dimension`.
    fn name(&self) -> &'static str;

    /// The request's value for this dimension, or empty if absent.
    fn extract(&self, request: &DeliveryRequest) -> String;

    /// Canonicalize a value for comparison. Must be idempotent and is
    /// applied symmetrically to request and rule values.
    fn normalize(&self, value: &str) -> String;

    /// Shape check for a rule, invoked at ingestion/bootstrap and never on
    /// the hot path.
    fn validate(&self, rule: &TargetingRule) -> Result<(), String>;

    /// True iff the normalized request value equals any normalized value in
    /// the rule.
    fn matches(&self, request_value: &str, rule: &TargetingRule) -> bool {
        let normalized = self.normalize(request_value);
        rule.values.iter().any(|v| self.normalize(v) == normalized)
    }

    /// Dependency-aware view of this processor, if it has one. The matcher
    /// prefers the dependency-aware methods when this returns `Some`.
    fn as_dependent(&self) -> Option<&dyn DependentDimensionProcessor> {
        None
    }
}

/// A dimension whose semantics depend on other dimensions (e.g. state
/// targeting only makes sense under a country).
pub trait DependentDimensionProcessor: DimensionProcessor {
    /// Names of the dimensions this processor depends on.
    fn dependencies(&self) -> &[&'static str];

    /// Validate a rule in the context of a concrete request.
    fn validate_with_dependencies(
        &self,
        rule: &TargetingRule,
        request: &DeliveryRequest,
    ) -> Result<(), String>;

    /// Match a rule in the context of a concrete request. A missing
    /// required dependency in the request means the rule does not match.
    fn matches_with_dependencies(&self, rule: &TargetingRule, request: &DeliveryRequest) -> bool;
}

/// Name to processor table. Mutable at process init, read-mostly after.
pub struct DimensionRegistry {
    processors: HashMap<String, Arc<dyn DimensionProcessor>>,
}

impl DimensionRegistry {
    /// Empty registry, for callers that want full control.
    pub fn empty() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Registry pre-loaded with the country, os and app built-ins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(CountryProcessor));
        registry.register(Arc::new(OsProcessor));
        registry.register(Arc::new(AppProcessor));
        registry
    }

    /// Add a processor. Must happen before the first match.
    pub fn register(&mut self, processor: Arc<dyn DimensionProcessor>) {
        self.processors
            .insert(processor.name().to_string(), processor);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DimensionProcessor>> {
        self.processors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// All registered processors, in no particular order.
    pub fn processors(&self) -> impl Iterator<Item = &Arc<dyn DimensionProcessor>> {
        self.processors.values()
    }

    /// All registered dimension names, sorted for stable output.
    pub fn dimension_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for DimensionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
