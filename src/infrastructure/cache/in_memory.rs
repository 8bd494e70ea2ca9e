//! In-memory cache implementation using moka

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Upper bound on the lifetime of any entry
    pub default_ttl: Duration,
    /// Time to idle - entries not accessed for this duration are evicted
    pub time_to_idle: Option<Duration>,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            default_ttl: Duration::from_secs(3600), // 1 hour
            time_to_idle: None,
        }
    }
}

impl InMemoryCacheConfig {
    /// Creates a new configuration with specified max capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Sets the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the time-to-idle duration
    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    /// Expiration timestamp (millis since epoch)
    expires_at: u64,
}

/// Tag -> tagged key -> expiry of the tagged entry (millis since epoch)
type TagIndex = HashMap<String, HashMap<String, u64>>;

/// Thread-safe in-memory cache implementation using moka
///
/// Features:
/// - TTL support per entry
/// - LRU-like eviction when capacity is reached
/// - Tag index for bulk eviction, holding only live entries
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    tags: RwLock<TagIndex>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let mut builder = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.default_ttl);

        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        Self {
            cache: builder.build(),
            tags: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn is_expired(entry: &CacheEntry) -> bool {
        Self::current_time_millis() > entry.expires_at
    }

    /// Drops `keys` from every tag
    async fn untag(&self, keys: &[String]) {
        let mut index = self.tags.write().await;

        if index.is_empty() {
            return;
        }

        for members in index.values_mut() {
            for key in keys {
                members.remove(key);
            }
        }

        index.retain(|_, members| !members.is_empty());
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) => {
                if Self::is_expired(&entry) {
                    self.cache.remove(key).await;
                    return Ok(None);
                }

                Ok(Some(entry.data.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let expires_at = Self::current_time_millis() + ttl.as_millis() as u64;
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at,
        };

        // A plain write replaces any tagged entry under the key
        self.untag(&[key.to_string()]).await;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        self.untag(&[key.to_string()]).await;
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<usize, DomainError> {
        self.untag(keys).await;

        let mut deleted = 0;

        for key in keys {
            if self.cache.remove(key).await.is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) => {
                let now = Self::current_time_millis();

                if entry.expires_at <= now {
                    self.cache.remove(key).await;
                    Ok(None)
                } else {
                    let remaining = entry.expires_at - now;
                    Ok(Some(Duration::from_millis(remaining)))
                }
            }
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        self.tags.write().await.clear();
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }

    fn supports_tags(&self) -> bool {
        true
    }

    async fn tag_keys(
        &self,
        tags: &[String],
        keys: &[String],
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let now = Self::current_time_millis();
        let expires_at = now + ttl.as_millis() as u64;
        let mut index = self.tags.write().await;

        for tag in tags {
            let members = index.entry(tag.clone()).or_default();

            for key in keys {
                members.insert(key.clone(), expires_at);
            }
        }

        // Drop members whose entries expired or were evicted for capacity
        for members in index.values_mut() {
            members.retain(|key, expires_at| *expires_at > now && self.cache.contains_key(key));
        }
        index.retain(|_, members| !members.is_empty());

        Ok(())
    }

    async fn flush_tags(&self, tags: &[String]) -> Result<usize, DomainError> {
        let keys: HashSet<String> = {
            let mut index = self.tags.write().await;
            tags.iter()
                .filter_map(|tag| index.remove(tag))
                .flat_map(HashMap::into_keys)
                .collect()
        };

        let mut deleted = 0;

        for key in keys {
            if self.cache.remove(&key).await.is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = InMemoryCache::new();

        let result: Option<String> = cache.get("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = cache.delete("key1").await.unwrap();
        assert!(deleted);

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let cache = InMemoryCache::new();

        let deleted = cache.delete("missing").await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let cache = InMemoryCache::new();

        cache.set("a", &1, Duration::from_secs(60)).await.unwrap();
        cache.set("b", &2, Duration::from_secs(60)).await.unwrap();
        cache.set("c", &3, Duration::from_secs(60)).await.unwrap();

        let deleted = cache
            .delete_many(&["a".to_string(), "b".to_string(), "zzz".to_string()])
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert!(!cache.exists("a").await.unwrap());
        assert!(cache.exists("c").await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = InMemoryCache::new();

        // Set with very short TTL
        cache
            .set("key1", &"value1", Duration::from_millis(50))
            .await
            .unwrap();

        // Should exist immediately
        assert!(cache.exists("key1").await.unwrap());

        // Wait for expiration
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Should be expired
        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_ttl_remaining() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let ttl = cache.ttl("key1").await.unwrap();
        assert!(ttl.is_some());

        let remaining = ttl.unwrap();
        assert!(remaining.as_secs() > 50 && remaining.as_secs() <= 60);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("key2", &"value2", Duration::from_secs(60))
            .await
            .unwrap();

        cache.clear().await.unwrap();

        let size = cache.size().await.unwrap();
        assert_eq!(size, 0);
    }

    #[tokio::test]
    async fn test_flush_tags_only_evicts_tagged_keys() {
        let cache = InMemoryCache::new();
        let tags = vec!["clients".to_string()];

        cache.set("tagged", &1, Duration::from_secs(60)).await.unwrap();
        cache.set("untagged", &2, Duration::from_secs(60)).await.unwrap();
        cache
            .tag_keys(&tags, &["tagged".to_string()], Duration::from_secs(60))
            .await
            .unwrap();

        let flushed = cache.flush_tags(&tags).await.unwrap();

        assert_eq!(flushed, 1);
        assert!(!cache.exists("tagged").await.unwrap());
        assert!(cache.exists("untagged").await.unwrap());
    }

    async fn tagged_members(cache: &InMemoryCache) -> usize {
        cache.tags.read().await.values().map(HashMap::len).sum()
    }

    #[tokio::test]
    async fn test_delete_untags_keys() {
        let cache =
            InMemoryCache::with_config(InMemoryCacheConfig::default().with_max_capacity(100));
        let tags = vec!["clients".to_string()];

        for i in 0..500 {
            let key = format!("client:{}", i);
            cache.set(&key, &i, Duration::from_secs(60)).await.unwrap();
            cache
                .tag_keys(&tags, &[key.clone()], Duration::from_secs(60))
                .await
                .unwrap();

            if i % 2 == 0 {
                cache.delete(&key).await.unwrap();
            } else {
                cache.delete_many(&[key]).await.unwrap();
            }
        }

        assert_eq!(tagged_members(&cache).await, 0);
    }

    #[tokio::test]
    async fn test_untagged_overwrite_survives_flush() {
        let cache = InMemoryCache::new();
        let tags = vec!["clients".to_string()];

        cache.set("k1", &1, Duration::from_secs(60)).await.unwrap();
        cache
            .tag_keys(&tags, &["k1".to_string()], Duration::from_secs(60))
            .await
            .unwrap();
        cache.set("k1", &2, Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.flush_tags(&tags).await.unwrap(), 0);
        assert!(cache.exists("k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_members_are_pruned() {
        let cache = InMemoryCache::new();
        let tags = vec!["clients".to_string()];

        cache.set("old", &1, Duration::from_millis(50)).await.unwrap();
        cache
            .tag_keys(&tags, &["old".to_string()], Duration::from_millis(50))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        cache.set("new", &2, Duration::from_secs(60)).await.unwrap();
        cache
            .tag_keys(&tags, &["new".to_string()], Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(tagged_members(&cache).await, 1);
    }

    #[tokio::test]
    async fn test_flush_unknown_tag() {
        let cache = InMemoryCache::new();

        assert!(cache.supports_tags());
        assert_eq!(cache.flush_tags(&["nope".to_string()]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_config() {
        let config = InMemoryCacheConfig::default()
            .with_max_capacity(100)
            .with_default_ttl(Duration::from_secs(300))
            .with_time_to_idle(Duration::from_secs(60));

        let cache = InMemoryCache::with_config(config.clone());

        assert_eq!(cache.config().max_capacity, 100);
        assert_eq!(cache.config().default_ttl, Duration::from_secs(300));
        assert_eq!(cache.config().time_to_idle, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_complex_types() {
        let cache = InMemoryCache::new();

        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct TestData {
            name: String,
            values: Vec<i32>,
        }

        let data = TestData {
            name: "test".to_string(),
            values: vec![1, 2, 3],
        };

        cache
            .set("complex", &data, Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<TestData> = cache.get("complex").await.unwrap();
        assert_eq!(result, Some(data));
    }
}
