//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};
use super::stores::{CacheStores, CacheStoresConfig};

/// Supported cache drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// In-memory cache using moka
    #[default]
    #[serde(alias = "inmemory", alias = "memory")]
    InMemory,
    /// Redis cache
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache driver: {}. Valid drivers: in_memory, redis",
                s
            ))),
        }
    }
}

/// Settings for a single cache store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub driver: CacheType,
    /// Required for the Redis driver
    pub redis_url: Option<String>,
    /// Store-level key namespace, applied under the repository prefix
    pub key_prefix: Option<String>,
    /// Upper bound on the lifetime of in-memory entries
    pub default_ttl_secs: u64,
    pub max_capacity: Option<u64>,
    pub time_to_idle_secs: Option<u64>,
    /// Redis connect timeout
    pub connection_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: CacheType::InMemory,
            redis_url: None,
            key_prefix: None,
            default_ttl_secs: 3600,
            max_capacity: Some(10_000),
            time_to_idle_secs: None,
            connection_timeout_secs: 5,
        }
    }
}

impl CacheConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            driver: CacheType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout_secs = timeout.as_secs();
        self
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

/// Factory for creating cache stores
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache store based on configuration
    ///
    /// An unreachable Redis server does not fail creation: the store is
    /// returned unconnected and reports cache errors until Redis is back.
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn Cache>, DomainError> {
        match config.driver {
            CacheType::InMemory => {
                let mut in_memory_config =
                    InMemoryCacheConfig::default().with_default_ttl(config.default_ttl());

                if let Some(capacity) = config.max_capacity {
                    in_memory_config = in_memory_config.with_max_capacity(capacity);
                }

                if let Some(tti) = config.time_to_idle_secs {
                    in_memory_config = in_memory_config.with_time_to_idle(Duration::from_secs(tti));
                }

                Ok(Arc::new(InMemoryCache::with_config(in_memory_config)))
            }
            CacheType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the redis driver")
                })?;

                let mut redis_config = RedisCacheConfig::new(url).with_connection_timeout(
                    Duration::from_secs(config.connection_timeout_secs),
                );

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                let cache = RedisCache::lazy(redis_config)?;

                if let Err(e) = cache.connect().await {
                    warn!(error = %e, "Redis unavailable, store will connect on first use");
                }

                Ok(Arc::new(cache))
            }
        }
    }

    /// Builds every configured store and registers it under its name
    pub async fn create_stores(
        &self,
        config: &CacheStoresConfig,
    ) -> Result<CacheStores, DomainError> {
        if !config.stores.contains_key(&config.default) {
            return Err(DomainError::configuration(format!(
                "Default cache store '{}' is not configured",
                config.default
            )));
        }

        let mut stores = CacheStores::new(config.default.clone());

        for (name, store_config) in &config.stores {
            info!(store = %name, driver = %store_config.driver, "Creating cache store");
            stores.insert(name.clone(), self.create(store_config).await?);
        }

        Ok(stores)
    }
}
