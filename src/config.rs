//! Process configuration loaded from the environment

use std::time::Duration;

/// General process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            env: env_string("APP_ENV", "dev"),
            log_level: env_string("LOG_LEVEL", "info"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(8080),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "dev".to_string(),
            log_level: "info".to_string(),
            port: 8080,
        }
    }
}

pub(crate) fn env_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

pub(crate) fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Seconds-valued environment variable as a `Duration`.
pub(crate) fn env_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::default();
        assert_eq!(config.env, "dev");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_env_helpers_fall_back_on_garbage() {
        assert_eq!(env_usize("ADRELAY_TEST_UNSET_USIZE", 7), 7);
        assert!(env_bool("ADRELAY_TEST_UNSET_BOOL", true));
        assert_eq!(
            env_secs("ADRELAY_TEST_UNSET_SECS", Duration::from_secs(5)),
            Duration::from_secs(5)
        );
        assert_eq!(env_string("ADRELAY_TEST_UNSET_STRING", "fallback"), "fallback");
    }
}
