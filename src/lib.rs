//! OAuth client cache
//!
//! A read-through caching layer for OAuth client lookups with:
//! - Cache-aside reads by client, owner and owner-scoped client
//! - Targeted invalidation after every committed mutation
//! - Tag-scoped bulk eviction on stores that support tags
//! - In-memory (moka) and Redis cache stores

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use domain::{ClientRepository, DomainError};
use infrastructure::cache::{CacheFactory, CacheStores};
use infrastructure::client::{
    CachedClientRepository, InMemoryClientRepository, PostgresClientRepository,
};

/// Builds every configured cache store
pub async fn create_cache_stores(config: &AppConfig) -> Result<CacheStores, DomainError> {
    CacheFactory::new().create_stores(&config.cache).await
}

/// Builds the cached client repository over the configured source of truth
pub async fn create_client_repository(
    config: &AppConfig,
) -> Result<CachedClientRepository, DomainError> {
    let stores = create_cache_stores(config).await?;

    let inner: Arc<dyn ClientRepository> = match &config.database {
        Some(database) => Arc::new(PostgresClientRepository::new(database.connect().await?)),
        None => {
            info!("No database configured, keeping clients in memory");
            Arc::new(InMemoryClientRepository::new())
        }
    };

    let mut repository =
        CachedClientRepository::from_stores(inner, &stores, config.client_cache.clone())?;

    if let Some(personal_access_client) = &config.personal_access_client {
        repository = repository.with_personal_access_client(personal_access_client.clone());
    }

    info!(
        store = config.client_cache.store.as_deref().unwrap_or(stores.default_name()),
        prefix = %config.client_cache.key_prefix,
        ttl_secs = config.client_cache.expires_in_secs,
        "Client cache ready"
    );

    Ok(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClientId;
    use crate::infrastructure::cache::{CacheConfig, CacheStoresConfig};
    use crate::infrastructure::client::PersonalAccessClient;
    use std::collections::HashMap;
    use std::time::Duration;

    #[tokio::test]
    async fn test_create_client_repository_defaults() {
        let repository = create_client_repository(&AppConfig::default()).await.unwrap();

        assert!(repository.find(&ClientId::new("1").unwrap()).await.unwrap().is_none());
        assert_eq!(repository.flush().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_client_repository_with_personal_access_client() {
        let mut config = AppConfig::default();
        config.personal_access_client =
            Some(PersonalAccessClient::new(ClientId::new("pac").unwrap()).with_secret("s"));

        let repository = create_client_repository(&config).await.unwrap();

        assert_eq!(repository.personal_access_client_secret(), Some("s"));
        assert!(repository.personal_access_client().await.is_err());
    }

    #[tokio::test]
    async fn test_create_client_repository_with_unreachable_redis() {
        let mut config = AppConfig::default();
        config.cache = CacheStoresConfig {
            default: "redis".to_string(),
            stores: HashMap::from([(
                "redis".to_string(),
                CacheConfig::redis("redis://127.0.0.1:1")
                    .with_connection_timeout(Duration::from_secs(1)),
            )]),
        };

        let repository = create_client_repository(&config).await.unwrap();
        let created = repository
            .create_password_grant_client(None, "Password Grant", "http://localhost")
            .await
            .unwrap();

        let found = repository.find(created.id()).await.unwrap();
        assert_eq!(found.unwrap().id(), created.id());
    }

    #[tokio::test]
    async fn test_create_client_repository_unknown_store() {
        let mut config = AppConfig::default();
        config.client_cache.store = Some("redis".to_string());

        let result = create_client_repository(&config).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
