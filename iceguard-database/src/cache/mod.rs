mod noop_store;
mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use noop_store::NoopCacheStore;
use redis_store::RedisCacheStore;

/// Guild config is read on every message, so it stays cached a while.
pub const CONFIG_CACHE_TTL: Duration = Duration::from_secs(300);
pub const CHANNEL_LIST_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled(NoopCacheStore),
    Redis(RedisCacheStore),
}

#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled(NoopCacheStore),
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.ping().await,
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled(store) => store.get(key).await,
            CacheBackend::Redis(store) => store.get(key).await,
        }?;

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let ttl_seconds = ttl.as_secs().max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        match &self.backend {
            CacheBackend::Disabled(store) => store.set(key, payload, ttl_seconds).await,
            CacheBackend::Redis(store) => store.set(key, payload, ttl_seconds).await,
        }
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.del(key).await,
            CacheBackend::Redis(store) => store.del(key).await,
        }
    }

    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(
                ?e,
                cache_key = key,
                "cache get failed; falling back to database"
            ),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(
                ?e,
                cache_key = key,
                "cache set failed; returning database value"
            );
        }

        Ok(loaded)
    }
}

pub fn cooldown_config_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("cooldown_config:{guild_id}"))
}

pub fn monitored_channels_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("monitored_channels:{guild_id}"))
}

pub async fn invalidate_cooldown_config(cache: &CacheService, guild_id: u64) -> anyhow::Result<()> {
    cache.del(&cooldown_config_key(cache, guild_id)).await
}

pub async fn invalidate_monitored_channels(
    cache: &CacheService,
    guild_id: u64,
) -> anyhow::Result<()> {
    cache.del(&monitored_channels_key(cache, guild_id)).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CacheService, cooldown_config_key, monitored_channels_key};

    #[test]
    fn keys_are_prefixed_per_guild() {
        let cache = CacheService::disabled("iceguard:test");
        assert_eq!(
            cooldown_config_key(&cache, 42),
            "iceguard:test:cooldown_config:42"
        );
        assert_eq!(
            monitored_channels_key(&cache, 42),
            "iceguard:test:monitored_channels:42"
        );
        assert!(!cache.is_redis_enabled());
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let cache = CacheService::disabled("iceguard:test");
        let mut loads = 0;

        for _ in 0..2 {
            let value = cache
                .get_or_load_json("k", Duration::from_secs(5), || {
                    loads += 1;
                    async { Ok(vec![1_u64, 2]) }
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2]);
        }

        assert_eq!(loads, 2);
        assert!(cache.ping().await.is_ok());
    }
}
