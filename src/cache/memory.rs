//! Process-local cache tier with TTL expiry and LRU eviction

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::entry::CacheEntry;
use crate::cache::types::CacheValue;

/// Bounded in-process key/value store, the hot tier of the hybrid cache.
///
/// Readers and writers are serialized through an async `RwLock`; expiry
/// sweeps and eviction take the writer side. Payloads are opaque
/// [`CacheValue`]s, typed accessors live on the hybrid cache.
#[derive(Debug)]
pub struct MemoryCache {
    store: Arc<RwLock<MemoryStore>>,
    max_entries: usize,
}

#[derive(Debug)]
struct MemoryStore {
    entries: HashMap<String, CacheEntry>,

    /// Access order for eviction, least recently used at the front.
    lru: VecDeque<String>,

    evicted: u64,
}

impl MemoryStore {
    fn touch(&mut self, key: &str) {
        self.lru.retain(|k| k != key);
        self.lru.push_back(key.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.lru.retain(|k| k != key);
    }

    fn sweep_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        self.evicted += expired.len() as u64;
        expired.len()
    }
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore {
                entries: HashMap::new(),
                lru: VecDeque::new(),
                evicted: 0,
            })),
            max_entries,
        }
    }

    /// Look up a key. Absent and expired entries both read as a miss; an
    /// expired entry is dropped on the way out.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let mut store = self.store.write().await;

        let expired = match store.entries.get(key) {
            None => return None,
            Some(entry) => entry.is_expired(),
        };
        if expired {
            debug!("local cache entry expired: {}", key);
            store.remove(key);
            store.evicted += 1;
            return None;
        }

        let value = store.entries.get(key).map(|entry| entry.value.clone());
        store.touch(key);
        value
    }

    /// Store a value with absolute expiry `now + ttl`. When the insert
    /// pushes the store over capacity, expired entries are swept first and
    /// the least recently used entries are evicted until bounded.
    pub async fn set(&self, key: &str, value: CacheValue, ttl: Duration) {
        let mut store = self.store.write().await;

        store.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        store.touch(key);

        if store.entries.len() > self.max_entries {
            store.sweep_expired();
            while store.entries.len() > self.max_entries {
                let Some(oldest) = store.lru.pop_front() else {
                    break;
                };
                debug!("evicting least recently used entry: {}", oldest);
                store.entries.remove(&oldest);
                store.evicted += 1;
            }
        }
    }

    /// Drop all entries.
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        let count = store.entries.len();
        store.entries.clear();
        store.lru.clear();
        info!("cleared {} entries from the local cache tier", count);
    }

    /// Remove all expired entries, returning how many were dropped.
    pub async fn sweep_expired(&self) -> usize {
        self.store.write().await.sweep_expired()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.entries.is_empty()
    }

    /// Total entries dropped by expiry or eviction since construction.
    pub async fn evicted_count(&self) -> u64 {
        self.store.read().await.evicted
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

/// Background task purging expired entries at a fixed interval.
pub async fn start_auto_sweep(cache: Arc<MemoryCache>, interval: Duration) {
    info!("starting local cache sweeper (interval: {:?})", interval);
    loop {
        tokio::time::sleep(interval).await;
        let removed = cache.sweep_expired().await;
        if removed > 0 {
            debug!("sweeper purged {} expired entries", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> CacheValue {
        CacheValue::CampaignIds(values.iter().map(|v| v.to_string()).collect())
    }

    #[tokio::test]
    async fn test_read_your_writes() {
        let cache = MemoryCache::new(10);

        cache.set("k1", ids(&["spotify"]), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k1").await, Some(ids(&["spotify"])));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_absent_key_is_a_miss() {
        let cache = MemoryCache::new(10);
        assert!(cache.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_dropped() {
        let cache = MemoryCache::new(10);

        cache.set("k1", ids(&["a"]), Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get("k1").await.is_none());
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.evicted_count().await, 1);
    }

    #[tokio::test]
    async fn test_lru_eviction_over_capacity() {
        let cache = MemoryCache::new(3);

        cache.set("k1", ids(&["1"]), Duration::from_secs(60)).await;
        cache.set("k2", ids(&["2"]), Duration::from_secs(60)).await;
        cache.set("k3", ids(&["3"]), Duration::from_secs(60)).await;

        // Refresh k1 so k2 becomes the least recently used.
        cache.get("k1").await;

        cache.set("k4", ids(&["4"]), Duration::from_secs(60)).await;

        assert!(cache.get("k2").await.is_none());
        assert!(cache.get("k1").await.is_some());
        assert!(cache.get("k3").await.is_some());
        assert!(cache.get("k4").await.is_some());
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn test_expired_entries_swept_before_eviction() {
        let cache = MemoryCache::new(2);

        cache.set("stale", ids(&["1"]), Duration::from_millis(10)).await;
        cache.set("fresh", ids(&["2"]), Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        // The insert over capacity drops the expired entry, not the live one.
        cache.set("new", ids(&["3"]), Duration::from_secs(60)).await;

        assert!(cache.get("fresh").await.is_some());
        assert!(cache.get("new").await.is_some());
        assert!(cache.get("stale").await.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_grow_the_store() {
        let cache = MemoryCache::new(10);

        cache.set("k1", ids(&["a"]), Duration::from_secs(60)).await;
        cache.set("k1", ids(&["b"]), Duration::from_secs(60)).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("k1").await, Some(ids(&["b"])));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new(10);

        cache.set("k1", ids(&["a"]), Duration::from_secs(60)).await;
        cache.set("k2", ids(&["b"]), Duration::from_secs(60)).await;
        cache.clear().await;

        assert!(cache.is_empty().await);
        assert!(cache.get("k1").await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let cache = MemoryCache::new(10);

        cache.set("k1", ids(&["a"]), Duration::from_millis(10)).await;
        cache.set("k2", ids(&["b"]), Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.sweep_expired().await, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(MemoryCache::new(1000));

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for j in 0..20 {
                    let key = format!("key_{}_{}", i, j);
                    cache.set(&key, ids(&["x"]), Duration::from_secs(60)).await;
                    assert!(cache.get(&key).await.is_some());
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len().await, 160);
    }
}
