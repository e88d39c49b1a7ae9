//! Composite health reporting for the hybrid cache

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::types::CacheStats;

/// Local tier utilization above this is considered degraded.
pub(crate) const MEMORY_DEGRADED_UTIL_PCT: f64 = 90.0;

/// Shared tier ping latency above this is considered degraded.
pub(crate) const REDIS_DEGRADED_LATENCY: Duration = Duration::from_millis(50);

/// Health of a cache tier or of the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Disabled,
}

impl HealthStatus {
    /// Healthy or degraded tiers still serve traffic.
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Local tier health details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryTierHealth {
    pub enabled: bool,
    pub status: HealthStatus,
    pub size: usize,
    pub max_size: usize,
    pub util_pct: f64,
    pub evicted_keys: u64,
}

impl MemoryTierHealth {
    pub(crate) fn disabled() -> Self {
        Self {
            enabled: false,
            status: HealthStatus::Disabled,
            size: 0,
            max_size: 0,
            util_pct: 0.0,
            evicted_keys: 0,
        }
    }
}

/// Shared tier health details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisTierHealth {
    pub enabled: bool,
    pub status: HealthStatus,
    pub connected: bool,
    pub address: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RedisTierHealth {
    pub(crate) fn disabled(address: String) -> Self {
        Self {
            enabled: false,
            status: HealthStatus::Disabled,
            connected: false,
            address,
            latency_ms: 0,
            error: None,
        }
    }
}

/// Composite cache health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealth {
    pub overall: HealthStatus,
    pub memory: MemoryTierHealth,
    pub redis: RedisTierHealth,
    pub stats: CacheStats,
    pub uptime_secs: u64,
    pub last_test: DateTime<Utc>,
}

/// Aggregate tier health: healthy iff every enabled tier is healthy,
/// degraded when at least one enabled tier is degraded and none unhealthy,
/// unhealthy when any enabled tier is unhealthy or no tier is enabled.
pub(crate) fn overall_of(memory: &MemoryTierHealth, redis: &RedisTierHealth) -> HealthStatus {
    let enabled: Vec<HealthStatus> = [memory.status, redis.status]
        .into_iter()
        .filter(|status| *status != HealthStatus::Disabled)
        .collect();

    if enabled.is_empty() {
        return HealthStatus::Unhealthy;
    }
    if enabled.contains(&HealthStatus::Unhealthy) {
        return HealthStatus::Unhealthy;
    }
    if enabled.contains(&HealthStatus::Degraded) {
        return HealthStatus::Degraded;
    }
    HealthStatus::Healthy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(status: HealthStatus) -> MemoryTierHealth {
        MemoryTierHealth {
            enabled: status != HealthStatus::Disabled,
            status,
            size: 10,
            max_size: 100,
            util_pct: 10.0,
            evicted_keys: 0,
        }
    }

    fn redis(status: HealthStatus) -> RedisTierHealth {
        RedisTierHealth {
            enabled: status != HealthStatus::Disabled,
            status,
            connected: status.is_operational(),
            address: "localhost:6379".to_string(),
            latency_ms: 1,
            error: None,
        }
    }

    #[test]
    fn test_overall_healthy_when_all_enabled_tiers_healthy() {
        assert_eq!(
            overall_of(&memory(HealthStatus::Healthy), &redis(HealthStatus::Healthy)),
            HealthStatus::Healthy
        );
        assert_eq!(
            overall_of(&memory(HealthStatus::Healthy), &redis(HealthStatus::Disabled)),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_overall_degraded_when_any_tier_degraded() {
        assert_eq!(
            overall_of(&memory(HealthStatus::Degraded), &redis(HealthStatus::Healthy)),
            HealthStatus::Degraded
        );
        assert_eq!(
            overall_of(&memory(HealthStatus::Healthy), &redis(HealthStatus::Degraded)),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_overall_unhealthy_dominates() {
        assert_eq!(
            overall_of(&memory(HealthStatus::Degraded), &redis(HealthStatus::Unhealthy)),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_all_disabled_is_unhealthy() {
        assert_eq!(
            overall_of(
                &MemoryTierHealth::disabled(),
                &RedisTierHealth::disabled("localhost:6379".to_string())
            ),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            r#""degraded""#
        );
        assert_eq!(HealthStatus::Unhealthy.to_string(), "unhealthy");
    }

    #[test]
    fn test_error_field_omitted_when_absent() {
        let json = serde_json::to_value(redis(HealthStatus::Healthy)).unwrap();
        assert!(json.get("error").is_none());
    }
}
