//! Cache infrastructure - Cache store implementations

mod factory;
mod in_memory;
mod redis;
mod stores;
mod tagged;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
pub use stores::{CacheStores, CacheStoresConfig, DEFAULT_STORE_NAME};
pub use tagged::TaggedCache;
