//! Redis cache implementation

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// Features:
/// - TTL support per entry
/// - Multi-key deletion in a single `DEL`
/// - Tag index kept in sorted sets scored by expiry
/// - Connection pooling via ConnectionManager, established on first use
///   when Redis is unreachable at startup
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let cache = Self::lazy(config)?;
        cache.connect().await?;
        Ok(cache)
    }

    /// Creates a cache that connects on first use
    ///
    /// Every call fails with [`DomainError::Cache`] until a connection is
    /// established; later calls retry the connect.
    pub fn lazy(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
            config,
        })
    }

    /// Establishes the connection if it is not up yet
    pub async fn connect(&self) -> Result<(), DomainError> {
        self.connection().await.map(|_| ())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn connection(&self) -> Result<ConnectionManager, DomainError> {
        self.connection
            .get_or_try_init(|| async {
                tokio::time::timeout(
                    self.config.connection_timeout,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                .map_err(|_| DomainError::cache("Timed out connecting to Redis"))?
                .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))
            })
            .await
            .cloned()
    }

    fn prefix_key(&self, key: &str) -> String {
        prefixed(self.config.key_prefix.as_deref(), key)
    }

    fn tag_key(&self, tag: &str) -> String {
        self.prefix_key(&format!("tag:{}:keys", tag))
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection().await?;

        // Use SCAN to find matching keys (safer than KEYS for production)
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut conn)
                .await
                .map_err(|e| DomainError::cache(format!("Failed to scan keys: {}", e)))?;

            found.extend(keys);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(found)
    }
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, key),
        None => key.to_string(),
    }
}

fn unix_now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection().await?;

        let result: Option<String> = conn.get(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to get key '{}': {}", key, e))
        })?;

        Ok(result)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection().await?;

        let ttl_secs = ttl.as_secs().max(1);

        let _: () = conn
            .set_ex(&prefixed_key, value, ttl_secs)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to set key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection().await?;

        let deleted: i32 = conn.del(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to delete key '{}': {}", key, e))
        })?;

        Ok(deleted > 0)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<usize, DomainError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let prefixed_keys: Vec<String> = keys.iter().map(|k| self.prefix_key(k)).collect();
        let mut conn = self.connection().await?;

        let deleted: usize = conn
            .del(&prefixed_keys)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete keys: {}", e)))?;

        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection().await?;

        let exists: bool = conn.exists(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to check existence of key '{}': {}", key, e))
        })?;

        Ok(exists)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection().await?;

        let ttl_secs: i64 = conn.ttl(&prefixed_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to get TTL for key '{}': {}", key, e))
        })?;

        // Redis returns -2 if key doesn't exist, -1 if no TTL
        if ttl_secs < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(ttl_secs as u64)))
        }
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;

        // Without a prefix the whole database belongs to this cache
        match &self.config.key_prefix {
            Some(_) => {
                let keys = self.scan_keys(&self.prefix_key("*")).await?;

                for chunk in keys.chunks(500) {
                    let _: usize = conn.del(chunk).await.map_err(|e| {
                        DomainError::cache(format!("Failed to delete keys: {}", e))
                    })?;
                }
            }
            None => {
                redis::cmd("FLUSHDB")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| DomainError::cache(format!("Failed to flush database: {}", e)))?;
            }
        }

        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        match &self.config.key_prefix {
            Some(_) => Ok(self.scan_keys(&self.prefix_key("*")).await?.len()),
            None => {
                let mut conn = self.connection().await?;
                let size: usize = redis::cmd("DBSIZE")
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| {
                        DomainError::cache(format!("Failed to get database size: {}", e))
                    })?;
                Ok(size)
            }
        }
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
        if tags.is_empty() || keys.is_empty() {
            return Ok(());
        }

        let now = unix_now_secs();
        let expires_at = now + ttl.as_secs().max(1);
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();

        for tag in tags {
            let tag_key = self.tag_key(tag);

            for key in keys {
                pipe.cmd("ZADD").arg(&tag_key).arg(expires_at).arg(key).ignore();
            }

            // Drop members whose entries can no longer be alive
            pipe.cmd("ZREMRANGEBYSCORE")
                .arg(&tag_key)
                .arg("-inf")
                .arg(now)
                .ignore();
        }

        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to tag keys: {}", e)))?;

        Ok(())
    }

    async fn flush_tags(&self, tags: &[String]) -> Result<usize, DomainError> {
        let mut conn = self.connection().await?;
        let mut deleted = 0usize;

        for tag in tags {
            let tag_key = self.tag_key(tag);

            let members: Vec<String> = redis::cmd("ZRANGE")
                .arg(&tag_key)
                .arg(0)
                .arg(-1)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    DomainError::cache(format!("Failed to read tag '{}': {}", tag, e))
                })?;

            deleted += self.delete_many(&members).await?;

            let _: i32 = conn.del(&tag_key).await.map_err(|e| {
                DomainError::cache(format!("Failed to delete tag '{}': {}", tag, e))
            })?;
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    // Note: These tests require a running Redis instance
    // Run with: cargo test -- --ignored

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379")
            .with_key_prefix("test")
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        // Cleanup
        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete_many() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache.set("dm1", &1, Duration::from_secs(60)).await.unwrap();
        cache.set("dm2", &2, Duration::from_secs(60)).await.unwrap();

        let deleted = cache
            .delete_many(&["dm1".to_string(), "dm2".to_string(), "dm3".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_flush_tags() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();
        let tags = vec!["redis-test-tag".to_string()];

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

        // Cleanup
        cache.delete("untagged").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ttl() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("ttl_key", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let ttl = cache.ttl("ttl_key").await.unwrap();
        assert!(ttl.is_some());
        assert!(ttl.unwrap().as_secs() > 50);

        // Cleanup
        cache.delete("ttl_key").await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_calls_with_cache_error() {
        let cache = RedisCache::lazy(
            RedisCacheConfig::new("redis://127.0.0.1:1")
                .with_connection_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        assert!(!cache.is_connected());

        let result = cache.get_raw("key1").await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));

        let result = cache.delete_many(&["key1".to_string()]).await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));
        assert!(!cache.is_connected());
    }

    #[test]
    fn test_invalid_url() {
        let result = RedisCache::lazy(RedisCacheConfig::new("not a url"));
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[test]
    fn test_prefixed() {
        assert_eq!(prefixed(Some("myapp"), "k"), "myapp:k");
        assert_eq!(prefixed(None, "k"), "k");
    }

    #[test]
    fn test_config_builder() {
        let config = RedisCacheConfig::new("redis://localhost")
            .with_key_prefix("myapp")
            .with_connection_timeout(Duration::from_secs(1));

        assert_eq!(config.key_prefix, Some("myapp".to_string()));
        assert_eq!(config.connection_timeout, Duration::from_secs(1));
    }
}
