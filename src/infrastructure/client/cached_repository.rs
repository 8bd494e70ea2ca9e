//! Read-through caching decorator for client repositories

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::cache::{Cache, CacheExt, ClientCacheKeys, DEFAULT_KEY_PREFIX};
use crate::domain::client::{
    personal_access_client_missing, Client, ClientId, ClientRepository, OwnerId,
};
use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheStores, TaggedCache};

/// Tag attached to every entry written by the caching layer
pub const CLIENT_CACHE_TAG: &str = "oauth-client-cache";

pub const DEFAULT_EXPIRES_IN_SECS: u64 = 300;

/// Settings of the client cache
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientCacheConfig {
    pub key_prefix: String,
    pub expires_in_secs: u64,
    /// Extra tags, merged with [`CLIENT_CACHE_TAG`]
    pub tags: Vec<String>,
    /// Named store; `None` uses the registry default
    pub store: Option<String>,
}

impl Default for ClientCacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            expires_in_secs: DEFAULT_EXPIRES_IN_SECS,
            tags: Vec::new(),
            store: None,
        }
    }
}

impl ClientCacheConfig {
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_expires_in(mut self, ttl: Duration) -> Self {
        self.expires_in_secs = ttl.as_secs();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.expires_in_secs)
    }

    /// Configured tags followed by the internal tag, without duplicates
    pub fn merged_tags(&self) -> Vec<String> {
        let mut merged: Vec<String> = Vec::with_capacity(self.tags.len() + 1);

        for tag in self
            .tags
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(CLIENT_CACHE_TAG))
        {
            if !merged.iter().any(|existing| existing == tag) {
                merged.push(tag.to_string());
            }
        }

        merged
    }
}

/// Explicitly configured personal access client
#[derive(Clone, Deserialize)]
pub struct PersonalAccessClient {
    pub id: ClientId,
    #[serde(default)]
    pub secret: Option<String>,
}

impl PersonalAccessClient {
    pub fn new(id: ClientId) -> Self {
        Self { id, secret: None }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}

impl fmt::Debug for PersonalAccessClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonalAccessClient")
            .field("id", &self.id)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Client repository that serves reads from a cache and evicts on writes
///
/// Reads are cache-aside under keys derived by [`ClientCacheKeys`]; absent
/// clients are cached as well. Every mutation is committed to the wrapped
/// repository first, then all keys that could reference the client are
/// deleted in one batch. Cache failures never fail a call: reads fall back
/// to the wrapped repository and failed writes or evictions are logged.
pub struct CachedClientRepository {
    inner: Arc<dyn ClientRepository>,
    cache: Arc<dyn Cache>,
    keys: ClientCacheKeys,
    ttl: Duration,
    tags: Vec<String>,
    personal_access_client: Option<PersonalAccessClient>,
}

impl CachedClientRepository {
    /// Wraps `inner`, scoping `store` to the configured tags when it supports them
    pub fn new(
        inner: Arc<dyn ClientRepository>,
        store: Arc<dyn Cache>,
        config: ClientCacheConfig,
    ) -> Self {
        let tags = config.merged_tags();

        Self {
            inner,
            cache: TaggedCache::scope(store, tags.clone()),
            keys: ClientCacheKeys::new(config.key_prefix.clone()),
            ttl: config.ttl(),
            tags,
            personal_access_client: None,
        }
    }

    /// Resolves the configured store by name from the registry
    pub fn from_stores(
        inner: Arc<dyn ClientRepository>,
        stores: &CacheStores,
        config: ClientCacheConfig,
    ) -> Result<Self, DomainError> {
        let store = stores.store(config.store.as_deref())?;
        Ok(Self::new(inner, store, config))
    }

    pub fn with_personal_access_client(mut self, client: PersonalAccessClient) -> Self {
        self.personal_access_client = Some(client);
        self
    }

    pub fn key_for_entity(&self, id: &ClientId) -> String {
        self.keys.for_entity(id)
    }

    pub fn key_for_owner(&self, owner_id: &OwnerId) -> String {
        self.keys.for_owner(owner_id)
    }

    pub fn key_for_owner_entity(&self, owner_id: &OwnerId, id: &ClientId) -> String {
        self.keys.for_owner_entity(owner_id, id)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn personal_access_client_id(&self) -> Option<&ClientId> {
        self.personal_access_client.as_ref().map(|c| &c.id)
    }

    pub fn personal_access_client_secret(&self) -> Option<&str> {
        self.personal_access_client
            .as_ref()
            .and_then(|c| c.secret.as_deref())
    }

    /// Every cache key that a read pattern could have populated for `client`
    pub fn cache_keys_for(&self, client: &Client) -> Vec<String> {
        let mut keys = vec![self.key_for_entity(client.id())];

        if let Some(owner_id) = client.owner_id() {
            keys.push(self.key_for_owner(owner_id));
            keys.push(self.key_for_owner_entity(owner_id, client.id()));
        }

        if let Some(id) = self.personal_access_client_id() {
            let key = self.key_for_entity(id);

            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        keys
    }

    /// Deletes every cached entry referencing `client` in a single batch
    pub async fn invalidate(&self, client: &Client) {
        let keys = self.cache_keys_for(client);

        match self.cache.delete_many(&keys).await {
            Ok(deleted) => debug!(
                client_id = %client.id(),
                keys = keys.len(),
                deleted,
                "Invalidated client cache entries"
            ),
            Err(e) => warn!(
                client_id = %client.id(),
                error = %e,
                "Failed to invalidate client cache entries"
            ),
        }
    }

    /// Evicts every entry carrying this repository's tags
    pub async fn flush(&self) -> Result<usize, DomainError> {
        self.cache.flush_tags(&self.tags).await
    }

    async fn remember<T, F>(&self, key: String, fetch: F) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: Future<Output = Result<T, DomainError>> + Send,
    {
        let cached: Result<Option<T>, DomainError> = self.cache.get(&key).await;

        match cached {
            Ok(Some(value)) => {
                debug!(key = %key, "Cache hit");
                return Ok(value);
            }
            Ok(None) => debug!(key = %key, "Cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Cache read failed, querying repository"),
        }

        let value = fetch.await?;

        if let Err(e) = self.cache.set(&key, &value, self.ttl).await {
            warn!(key = %key, error = %e, "Failed to store value in cache");
        }

        Ok(value)
    }
}

impl fmt::Debug for CachedClientRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedClientRepository")
            .field("cache", &self.cache)
            .field("keys", &self.keys)
            .field("ttl", &self.ttl)
            .field("tags", &self.tags)
            .field("personal_access_client", &self.personal_access_client)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ClientRepository for CachedClientRepository {
    async fn find(&self, id: &ClientId) -> Result<Option<Client>, DomainError> {
        self.remember(self.key_for_entity(id), self.inner.find(id))
            .await
    }

    async fn find_for_owner(
        &self,
        id: &ClientId,
        owner_id: &OwnerId,
    ) -> Result<Option<Client>, DomainError> {
        self.remember(
            self.key_for_owner_entity(owner_id, id),
            self.inner.find_for_owner(id, owner_id),
        )
        .await
    }

    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Client>, DomainError> {
        self.remember(
            self.key_for_owner(owner_id),
            self.inner.list_for_owner(owner_id),
        )
        .await
    }

    async fn find_personal_access_client(&self) -> Result<Option<Client>, DomainError> {
        self.inner.find_personal_access_client().await
    }

    async fn personal_access_client(&self) -> Result<Client, DomainError> {
        match &self.personal_access_client {
            Some(configured) => self.find(&configured.id).await?.ok_or_else(|| {
                DomainError::configuration(format!(
                    "Personal access client [{}] not found",
                    configured.id
                ))
            }),
            None => self
                .inner
                .find_personal_access_client()
                .await?
                .ok_or_else(personal_access_client_missing),
        }
    }

    async fn create(&self, client: Client) -> Result<Client, DomainError> {
        let client = self.inner.create(client).await?;
        self.invalidate(&client).await;
        Ok(client)
    }

    async fn create_personal_access_client(
        &self,
        owner_id: Option<OwnerId>,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError> {
        let client = self
            .inner
            .create_personal_access_client(owner_id, name, redirect)
            .await?;
        self.invalidate(&client).await;
        Ok(client)
    }

    async fn update(
        &self,
        client: &Client,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError> {
        let updated = self.inner.update(client, name, redirect).await?;
        self.invalidate(&updated).await;
        Ok(updated)
    }

    async fn regenerate_secret(&self, client: &Client) -> Result<Client, DomainError> {
        let updated = self.inner.regenerate_secret(client).await?;
        self.invalidate(&updated).await;
        Ok(updated)
    }

    async fn delete(&self, client: &Client) -> Result<(), DomainError> {
        self.inner.delete(client).await?;
        self.invalidate(client).await;
        Ok(())
    }
}
