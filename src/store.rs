//! Cache store trait definition.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Cache store trait for different key/value backends.
///
/// The contract mirrors the memcached primitive set: plain `get`/`set` plus
/// the two atomic operations the versioning layer builds on, `add`
/// (create-if-absent) and `increment` (add-1-if-present). Values cross this
/// boundary as strings; the typed surface serializes above it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from the cache.
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(value))` if the key exists, `Ok(None)` if not found,
    /// or an error if the operation fails. A stored empty or zero value is
    /// `Some`, never `None`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value in the cache.
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key
    /// * `value` - The string value
    /// * `ttl` - Optional time-to-live duration; `None` means no expiry
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Store a value only if the key is absent.
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key
    /// * `value` - The string value
    ///
    /// # Returns
    ///
    /// Fails with [`CacheError::AlreadyExists`](crate::CacheError::AlreadyExists)
    /// when the key is already present. The check-and-set is atomic on the
    /// backend side.
    async fn add(&self, key: &str, value: String) -> CacheResult<()>;

    /// Atomically increment a numeric value.
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key
    /// * `delta` - The amount to increment by
    ///
    /// # Returns
    ///
    /// Returns the new value after incrementing. Fails with
    /// [`CacheError::NotFound`](crate::CacheError::NotFound) when the key
    /// does not exist; it is never created implicitly.
    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64>;

    /// Delete a key from the cache.
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key to delete
    async fn delete(&self, key: &str) -> CacheResult<()>;
}
