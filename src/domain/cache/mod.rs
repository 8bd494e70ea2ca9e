//! Cache domain - Cache abstraction and client key derivation

mod key;
mod repository;

pub use key::{ClientCacheKeys, DEFAULT_KEY_PREFIX};
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
