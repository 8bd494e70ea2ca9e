//! Tag-scoped view over a taggable cache store

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Cache handle that registers every written key under a fixed tag set
///
/// Reads and deletes pass straight through; `flush` evicts every entry
/// written through any handle sharing one of the tags.
#[derive(Debug, Clone)]
pub struct TaggedCache {
    inner: Arc<dyn Cache>,
    tags: Vec<String>,
}

impl TaggedCache {
    /// Wraps a store that supports tags
    pub fn new(inner: Arc<dyn Cache>, tags: Vec<String>) -> Result<Self, DomainError> {
        if !inner.supports_tags() {
            return Err(DomainError::cache("Cache store does not support tags"));
        }

        Ok(Self { inner, tags })
    }

    /// Scopes a store to the tags when it supports them, else returns it unchanged
    pub fn scope(store: Arc<dyn Cache>, tags: Vec<String>) -> Arc<dyn Cache> {
        if store.supports_tags() && !tags.is_empty() {
            Arc::new(Self { inner: store, tags })
        } else {
            store
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Evicts every entry carrying one of this handle's tags
    pub async fn flush(&self) -> Result<usize, DomainError> {
        self.inner.flush_tags(&self.tags).await
    }
}

#[async_trait]
impl Cache for TaggedCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.inner.get_raw(key).await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.inner.set_raw(key, value, ttl).await?;
        self.inner
            .tag_keys(&self.tags, &[key.to_string()], ttl)
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        self.inner.delete(key).await
    }

    async fn delete_many(&self, keys: &[String]) -> Result<usize, DomainError> {
        self.inner.delete_many(keys).await
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        self.inner.exists(key).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        self.inner.ttl(key).await
    }

    /// Clearing a tagged view only evicts its own entries
    async fn clear(&self) -> Result<(), DomainError> {
        self.flush().await.map(|_| ())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.inner.size().await
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
        self.inner.tag_keys(tags, keys, ttl).await
    }

    async fn flush_tags(&self, tags: &[String]) -> Result<usize, DomainError> {
        self.inner.flush_tags(tags).await
    }
}
