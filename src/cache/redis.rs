//! Shared cache tier backed by Redis
//!
//! All keys carry the application namespace so instances can share a server
//! with other tenants; payloads cross the wire as JSON with the same field
//! names the delivery API uses. A miss is a typed signal distinct from
//! transport errors, which the hybrid cache degrades and counts.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::cache::types::SNAPSHOT_KEY;
use crate::error::{CacheError, CacheResult};
use crate::models::CampaignWithRules;

/// Namespace prefix applied to every key this service writes.
pub const NAMESPACE: &str = "adrelay:";

/// Broadcast channel carrying invalidation events. Subscribers treat any
/// message as a directive to drop their local tier.
pub const INVALIDATION_CHANNEL: &str = "adrelay:cache:invalidate";

/// Shared, cross-instance cache tier.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    conn: ConnectionManager,
    addr: String,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("client", &self.client)
            .field("addr", &self.addr)
            .finish()
    }
}

impl RedisCache {
    /// Connect and ping. A failed ping is fatal here, at construction;
    /// failures after this point degrade instead.
    pub async fn connect(addr: &str, password: &str, db: i64) -> CacheResult<Self> {
        let url = if password.is_empty() {
            format!("redis://{}/{}", addr, db)
        } else {
            format!("redis://:{}@{}/{}", password, addr, db)
        };
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Config(e.to_string()))?;
        let conn = ConnectionManager::new(client.clone()).await?;

        let cache = Self {
            client,
            conn,
            addr: addr.to_string(),
        };
        cache.ping().await?;
        info!("connected to redis at {}", addr);
        Ok(cache)
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn namespaced(key: &str) -> String {
        format!("{}{}", NAMESPACE, key)
    }

    /// The active-campaign snapshot, or [`CacheError::Miss`].
    pub async fn get_campaigns(&self) -> CacheResult<Vec<CampaignWithRules>> {
        let payload = self.get_raw(SNAPSHOT_KEY).await?;
        Ok(serde_json::from_str(&payload)?)
    }

    pub async fn set_campaigns(
        &self,
        campaigns: &[CampaignWithRules],
        ttl: Duration,
    ) -> CacheResult<()> {
        let payload = serde_json::to_string(campaigns)?;
        self.set_raw(SNAPSHOT_KEY, payload, ttl).await
    }

    /// A posting list by its un-namespaced key, or [`CacheError::Miss`].
    pub async fn get_index(&self, key: &str) -> CacheResult<Vec<String>> {
        let payload = self.get_raw(key).await?;
        Ok(serde_json::from_str(&payload)?)
    }

    pub async fn set_index(&self, key: &str, ids: &[String], ttl: Duration) -> CacheResult<()> {
        let payload = serde_json::to_string(ids)?;
        self.set_raw(key, payload, ttl).await
    }

    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(Self::namespaced(key)).await?;
        payload.ok_or(CacheError::Miss)
    }

    async fn set_raw(&self, key: &str, payload: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::namespaced(key), payload, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    /// Delete every key under the application namespace.
    pub async fn clear(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(format!("{}*", NAMESPACE)).await?;
        if keys.is_empty() {
            return Ok(());
        }
        debug!("clearing {} namespaced keys from redis", keys.len());
        let _: () = conn.del(keys).await?;
        Ok(())
    }

    /// Broadcast an invalidation event to all subscribed instances.
    pub async fn publish_invalidation(&self, event: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.publish(INVALIDATION_CHANNEL, event).await?;
        Ok(())
    }

    /// Run `handler` for every invalidation message until the subscription
    /// ends or the surrounding task is dropped.
    pub async fn listen_invalidation<F, Fut>(&self, mut handler: F) -> CacheResult<()>
    where
        F: FnMut(String) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(INVALIDATION_CHANNEL).await?;
        info!("subscribed to {}", INVALIDATION_CHANNEL);

        let mut messages = pubsub.on_message();
        while let Some(message) = messages.next().await {
            let event: String = message.get_payload().unwrap_or_default();
            handler(event).await;
        }
        Ok(())
    }

    /// Liveness probe returning round-trip latency.
    pub async fn ping(&self) -> CacheResult<Duration> {
        let start = Instant::now();
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_keys() {
        assert_eq!(
            RedisCache::namespaced("campaigns:active"),
            "adrelay:campaigns:active"
        );
        assert_eq!(
            RedisCache::namespaced("index:country:us"),
            "adrelay:index:country:us"
        );
    }

    #[test]
    fn test_invalidation_channel_is_namespaced() {
        assert!(INVALIDATION_CHANNEL.starts_with(NAMESPACE));
    }
}
