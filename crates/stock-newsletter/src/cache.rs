//! Caching layer for market data and news to reduce API calls

use cached::{Cached, TimedCache};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Cache key for data requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Stock symbol or search query
    pub subject: String,
    /// Endpoint or operation type
    pub endpoint: String,
    /// Additional parameters as JSON string
    pub params: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(subject: impl Into<String>, endpoint: impl Into<String>, params: &serde_json::Value) -> Self {
        Self {
            subject: subject.into(),
            endpoint: endpoint.into(),
            params: params.to_string(),
        }
    }
}

/// Thread-safe TTL cache of JSON values
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct TtlCache {
    cache: Arc<Mutex<TimedCache<CacheKey, serde_json::Value>>>,
}

impl TtlCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(Mutex::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        self.cache.lock().await.cache_get(key).cloned()
    }

    /// Insert a value into the cache, dropping any expired entries
    pub async fn insert(&self, key: CacheKey, value: serde_json::Value) {
        let mut cache = self.cache.lock().await;
        cache.flush();
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    ///
    /// Failed fetches are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<serde_json::Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<serde_json::Value, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(subject = %key.subject, endpoint = %key.endpoint, "Cache hit");
            return Ok(value);
        }

        tracing::debug!(subject = %key.subject, endpoint = %key.endpoint, "Cache miss");
        let value = fetcher().await?;
        self.insert(key, value.clone()).await;

        Ok(value)
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        self.cache.lock().await.cache_clear();
    }

    /// Get the number of live entries
    pub async fn len(&self) -> usize {
        let mut cache = self.cache.lock().await;
        cache.flush();
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache").finish_non_exhaustive()
    }
}

/// Caches for the two data sources
#[derive(Debug, Clone)]
pub struct DataCaches {
    /// Price history, long TTL
    pub prices: TtlCache,
    /// News searches, short TTL
    pub news: TtlCache,
}

impl DataCaches {
    /// Create caches with the given TTLs
    pub fn new(price_ttl: Duration, news_ttl: Duration) -> Self {
        Self {
            prices: TtlCache::new(price_ttl),
            news: TtlCache::new(news_ttl),
        }
    }

    /// Clear all caches
    pub async fn clear_all(&self) {
        self.prices.clear().await;
        self.news.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_cache_get_or_fetch() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "history", &json!({"days": 365}));
        let value = json!({"close": 150.0});

        let mut call_count = 0;
        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>(value.clone()) }
            })
            .await
            .unwrap();
        assert_eq!(result, value);

        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>(json!(null)) }
            })
            .await
            .unwrap();
        assert_eq!(result, value);
        assert_eq!(call_count, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_not_cached() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let key = CacheKey::new("BTC", "news", &json!({}));

        let err = cache
            .get_or_fetch(key.clone(), || async { Err::<serde_json::Value, _>("offline") })
            .await
            .unwrap_err();
        assert_eq!(err, "offline");
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_expiry() {
        let cache = TtlCache::new(Duration::from_millis(20));
        let key = CacheKey::new("AAPL", "history", &json!({}));
        cache.insert(key.clone(), json!(1)).await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted() {
        let cache = TtlCache::new(Duration::from_millis(20));
        for ticker in ["AAPL", "MSFT", "NVDA"] {
            cache.insert(CacheKey::new(ticker, "history", &json!({})), json!(1)).await;
        }
        assert_eq!(cache.len().await, 3);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.len().await, 0);

        cache.insert(CacheKey::new("BTC-USD", "history", &json!({})), json!(2)).await;
        assert_eq!(cache.cache.lock().await.cache_size(), 1);
    }

    #[tokio::test]
    async fn test_keys_differ_by_params() {
        let caches = DataCaches::new(Duration::from_secs(3600), Duration::from_secs(300));
        caches
            .prices
            .insert(CacheKey::new("AAPL", "history", &json!({"end": "2024-08-08"})), json!(1))
            .await;
        assert!(
            caches
                .prices
                .get(&CacheKey::new("AAPL", "history", &json!({"end": "2024-08-09"})))
                .await
                .is_none()
        );
        assert_eq!(caches.prices.len().await, 1);

        caches.clear_all().await;
        assert!(caches.prices.is_empty().await);
    }
}
