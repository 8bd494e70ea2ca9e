//! Client repositories - source-of-truth stores and the caching decorator

mod cached_repository;
mod in_memory_repository;
mod postgres_repository;

pub use cached_repository::{
    CachedClientRepository, ClientCacheConfig, PersonalAccessClient, CLIENT_CACHE_TAG,
    DEFAULT_EXPIRES_IN_SECS,
};
pub use in_memory_repository::InMemoryClientRepository;
pub use postgres_repository::{PostgresClientRepository, PostgresConfig};
