//! Memcached cache store implementation.

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;
use async_trait::async_trait;
use log::info;
use memcache::{CommandError, MemcacheError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Memcached cache store.
///
/// Note: The `memcache` crate doesn't have native async support,
/// so we wrap it with tokio's Mutex and use spawn_blocking for operations.
#[derive(Clone)]
pub struct MemcachedStore {
    client: Arc<Mutex<memcache::Client>>,
}

impl MemcachedStore {
    /// Connect to a memcached server.
    ///
    /// # Arguments
    ///
    /// * `url` - Server URL, `memcache://host:port` or plain `host:port`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vercache::MemcachedStore;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), vercache::CacheError> {
    ///     let store = MemcachedStore::connect("memcache://localhost:11211").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(url: impl Into<String>) -> CacheResult<Self> {
        let server_url = Self::parse_memcached_url(&url.into())?;

        // Create client in blocking context
        let url_for_log = server_url.clone();
        let client = tokio::task::spawn_blocking(move || memcache::connect(server_url.as_str()))
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to spawn task: {}", e)))?
            .map_err(|e| CacheError::Connection(format!("Failed to connect: {}", e)))?;

        info!("Connected to memcached at {}", url_for_log);

        Ok(Self {
            client: Arc::new(Mutex::new(client)),
        })
    }

    /// Parse a memcached URL to a connectable address.
    ///
    /// Accepts "memcache://host:port" as-is and prefixes plain "host:port".
    fn parse_memcached_url(url: &str) -> CacheResult<String> {
        if url.starts_with("memcache://") {
            Ok(url.to_string())
        } else if url.contains(':') {
            Ok(format!("memcache://{}", url))
        } else {
            Err(CacheError::InvalidUrl(format!(
                "Invalid Memcached URL: {}. Expected format: 'memcache://host:port' or 'host:port'",
                url
            )))
        }
    }

    /// Convert Duration to memcached expiration (in seconds, 0 = no expiry).
    fn duration_to_expiration(ttl: Option<Duration>) -> u32 {
        ttl.map(|d| d.as_secs() as u32).unwrap_or(0)
    }

    /// Map the command errors the versioning layer branches on to their
    /// typed variants; everything else passes through wrapped.
    fn map_err(err: MemcacheError, key: &str) -> CacheError {
        match err {
            MemcacheError::CommandError(CommandError::KeyExists) => {
                CacheError::AlreadyExists(key.to_string())
            }
            MemcacheError::CommandError(CommandError::KeyNotFound) => {
                CacheError::NotFound(key.to_string())
            }
            other => CacheError::Memcached(other),
        }
    }
}

#[async_trait]
impl CacheStore for MemcachedStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let key = key.to_string();
        let client = self.client.clone();

        let result = tokio::task::spawn_blocking(move || {
            let client = client.blocking_lock();
            client.get::<String>(&key)
        })
        .await
        .map_err(|e| CacheError::Other(format!("Task join error: {}", e)))?;

        result.map_err(CacheError::Memcached)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let key = key.to_string();
        let client = self.client.clone();
        let expiration = Self::duration_to_expiration(ttl);

        tokio::task::spawn_blocking(move || {
            let client = client.blocking_lock();
            client.set(&key, value, expiration)
        })
        .await
        .map_err(|e| CacheError::Other(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn add(&self, key: &str, value: String) -> CacheResult<()> {
        let owned_key = key.to_string();
        let client = self.client.clone();

        tokio::task::spawn_blocking(move || {
            let client = client.blocking_lock();
            client.add(&owned_key, value, 0)
        })
        .await
        .map_err(|e| CacheError::Other(format!("Task join error: {}", e)))?
        .map_err(|e| Self::map_err(e, key))
    }

    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let owned_key = key.to_string();
        let client = self.client.clone();

        let result = if delta >= 0 {
            let delta = delta as u64;
            tokio::task::spawn_blocking(move || {
                let client = client.blocking_lock();
                client.increment(&owned_key, delta)
            })
            .await
        } else {
            let delta = (-delta) as u64;
            tokio::task::spawn_blocking(move || {
                let client = client.blocking_lock();
                client.decrement(&owned_key, delta)
            })
            .await
        };

        result
            .map_err(|e| CacheError::Other(format!("Task join error: {}", e)))?
            .map(|v| v as i64)
            .map_err(|e| Self::map_err(e, key))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let key = key.to_string();
        let client = self.client.clone();

        tokio::task::spawn_blocking(move || {
            let client = client.blocking_lock();
            client.delete(&key)
        })
        .await
        .map_err(|e| CacheError::Other(format!("Task join error: {}", e)))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memcached_url() {
        assert_eq!(
            MemcachedStore::parse_memcached_url("memcache://localhost:11211").unwrap(),
            "memcache://localhost:11211"
        );

        assert_eq!(
            MemcachedStore::parse_memcached_url("localhost:11211").unwrap(),
            "memcache://localhost:11211"
        );

        assert!(MemcachedStore::parse_memcached_url("invalid").is_err());
    }

    #[test]
    fn test_duration_to_expiration() {
        assert_eq!(MemcachedStore::duration_to_expiration(None), 0);
        assert_eq!(
            MemcachedStore::duration_to_expiration(Some(Duration::from_secs(60))),
            60
        );
    }
}
