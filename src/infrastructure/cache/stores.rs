//! Named cache store registry

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::factory::CacheConfig;
use crate::domain::cache::Cache;
use crate::domain::DomainError;

pub const DEFAULT_STORE_NAME: &str = "memory";

/// Store definitions keyed by name, plus the name used when none is requested
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheStoresConfig {
    pub default: String,
    pub stores: HashMap<String, CacheConfig>,
}

impl Default for CacheStoresConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_STORE_NAME.to_string(),
            stores: HashMap::from([(DEFAULT_STORE_NAME.to_string(), CacheConfig::in_memory())]),
        }
    }
}

/// Live cache stores, resolved by name
#[derive(Debug, Clone)]
pub struct CacheStores {
    default: String,
    stores: HashMap<String, Arc<dyn Cache>>,
}

impl CacheStores {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            stores: HashMap::new(),
        }
    }

    /// Registry holding one store, which is also the default
    pub fn single(name: impl Into<String>, store: Arc<dyn Cache>) -> Self {
        let name = name.into();
        Self::new(name.clone()).with_store(name, store)
    }

    pub fn with_store(mut self, name: impl Into<String>, store: Arc<dyn Cache>) -> Self {
        self.insert(name, store);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, store: Arc<dyn Cache>) {
        self.stores.insert(name.into(), store);
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Registered store names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves a store by name, falling back to the default store for `None`
    pub fn store(&self, name: Option<&str>) -> Result<Arc<dyn Cache>, DomainError> {
        let name = name.unwrap_or(&self.default);

        self.stores.get(name).cloned().ok_or_else(|| {
            DomainError::configuration(format!("Cache store [{}] is not defined", name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::infrastructure::cache::InMemoryCache;

    #[test]
    fn test_store_resolves_default() {
        let stores = CacheStores::single("memory", Arc::new(InMemoryCache::new()))
            .with_store("plain", Arc::new(MockCache::new()));

        assert!(stores.store(None).unwrap().supports_tags());
        assert!(!stores.store(Some("plain")).unwrap().supports_tags());
    }

    #[test]
    fn test_unknown_store_is_configuration_error() {
        let stores = CacheStores::single("memory", Arc::new(InMemoryCache::new()));

        let err = stores.store(Some("redis")).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(err.to_string().contains("[redis]"));
    }

    #[test]
    fn test_missing_default_store() {
        let stores = CacheStores::new("memory");

        assert!(stores.store(None).is_err());
        assert!(stores.names().is_empty());
    }

    #[test]
    fn test_config_default() {
        let config = CacheStoresConfig::default();

        assert_eq!(config.default, DEFAULT_STORE_NAME);
        assert!(config.stores.contains_key(DEFAULT_STORE_NAME));
    }
}
