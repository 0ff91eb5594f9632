//! Key-value capability shared by the affinity cache backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

/// `{get, set_with_ttl, delete}` over opaque byte values. Implementations
/// must never return an entry older than the TTL it was written with.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration)
    -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
