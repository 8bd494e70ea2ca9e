//! Cache key derivation for client lookups

use crate::domain::client::{ClientId, OwnerId};

/// Prefix used when none is configured
pub const DEFAULT_KEY_PREFIX: &str = "default";

/// Derives the cache key of every client read pattern
///
/// Keys are pure functions of their inputs. Client and owner identifiers
/// cannot contain `:` or `_`, so distinct lookups never share a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCacheKeys {
    prefix: String,
}

impl Default for ClientCacheKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl ClientCacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of the by-id lookup
    pub fn for_entity(&self, id: &ClientId) -> String {
        format!("{}:for_entity:{}", self.prefix, id)
    }

    /// Key of the owner's client list
    pub fn for_owner(&self, owner_id: &OwnerId) -> String {
        format!("{}:for_owner:{}", self.prefix, owner_id)
    }

    /// Key of the by-id lookup restricted to an owner
    pub fn for_owner_entity(&self, owner_id: &OwnerId, id: &ClientId) -> String {
        format!("{}:for_owner_entity:{}_{}", self.prefix, owner_id, id)
    }
}
