//! Domain layer - Core entities, traits and errors

pub mod cache;
pub mod client;
pub mod error;

pub use cache::{Cache, CacheExt, ClientCacheKeys, DEFAULT_KEY_PREFIX};
pub use client::{Client, ClientId, ClientRepository, OwnerId};
pub use error::DomainError;
