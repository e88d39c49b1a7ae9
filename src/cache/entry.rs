//! Cache entry with absolute expiry

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::types::CacheValue;

/// A stored payload and the instant it stops being served.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: CacheValue,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Entry expiring at `now + ttl`.
    pub fn new(value: CacheValue, ttl: Duration) -> Self {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(300));
        Self { value, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_is_not_expired() {
        let entry = CacheEntry::new(CacheValue::CampaignIds(Vec::new()), Duration::from_secs(60));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let entry = CacheEntry::new(
            CacheValue::CampaignIds(Vec::new()),
            Duration::from_millis(10),
        );
        std::thread::sleep(Duration::from_millis(30));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_longer_ttl_expires_later() {
        let snapshot = CacheEntry::new(CacheValue::Campaigns(Vec::new()), Duration::from_secs(300));
        let index = CacheEntry::new(CacheValue::CampaignIds(Vec::new()), Duration::from_secs(360));
        assert!(index.expires_at > snapshot.expires_at);
    }
}
