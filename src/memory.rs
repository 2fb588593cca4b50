//! In-memory cache store.

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory store with memcached-style `add`/`increment` semantics.
///
/// Useful for tests and as a process-local backend. Expired entries read as
/// absent; actual removal is deferred to [`InMemoryStore::purge_expired`].
pub struct InMemoryStore {
    data: Arc<RwLock<HashMap<String, Entry>>>,
}

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Option<tokio::time::Instant>,
}

impl Entry {
    fn is_expired(&self, now: tokio::time::Instant) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }
}

impl InMemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Remove expired entries.
    pub async fn purge_expired(&self) {
        let mut data = self.data.write().await;
        let now = tokio::time::Instant::now();
        data.retain(|_, entry| !entry.is_expired(now));
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let data = self.data.read().await;
        let now = tokio::time::Instant::now();
        data.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Whether the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryStore {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let data = self.data.read().await;
        match data.get(key) {
            Some(entry) if !entry.is_expired(tokio::time::Instant::now()) => {
                Ok(Some(entry.value.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl.map(|d| tokio::time::Instant::now() + d);
        let entry = Entry { value, expires_at };
        self.data.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn add(&self, key: &str, value: String) -> CacheResult<()> {
        let mut data = self.data.write().await;
        let now = tokio::time::Instant::now();
        match data.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                Err(CacheError::AlreadyExists(key.to_string()))
            }
            _ => {
                data.insert(
                    key.to_string(),
                    Entry {
                        value,
                        expires_at: None,
                    },
                );
                Ok(())
            }
        }
    }

    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut data = self.data.write().await;
        let now = tokio::time::Instant::now();
        let entry = match data.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => entry,
            _ => return Err(CacheError::NotFound(key.to_string())),
        };

        let current: i64 = entry
            .value
            .parse()
            .map_err(|_| CacheError::Other(format!("value at {key} is not numeric")))?;
        let new_value = current + delta;
        entry.value = new_value.to_string();

        Ok(new_value)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = InMemoryStore::new();

        store.set("k", "v".to_string(), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_fails_on_present_key() {
        let store = InMemoryStore::new();

        store.add("k", "1".to_string()).await.unwrap();
        let err = store.add("k", "2".to_string()).await.unwrap_err();
        assert!(matches!(err, CacheError::AlreadyExists(_)));

        // first write wins
        assert_eq!(store.get("k").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_increment_fails_on_absent_key() {
        let store = InMemoryStore::new();

        let err = store.increment("missing", 1).await.unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));

        store.set("n", "41".to_string(), None).await.unwrap();
        assert_eq!(store.increment("n", 1).await.unwrap(), 42);
        assert_eq!(store.get("n").await.unwrap(), Some("42".to_string()));
    }

    #[tokio::test]
    async fn test_increment_non_numeric_value() {
        let store = InMemoryStore::new();
        store.set("s", "abc".to_string(), None).await.unwrap();
        assert!(matches!(
            store.increment("s", 1).await.unwrap_err(),
            CacheError::Other(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_read_as_absent() {
        let store = InMemoryStore::new();
        store
            .set("k", "v".to_string(), Some(Duration::from_secs(10)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(matches!(
            store.increment("k", 1).await.unwrap_err(),
            CacheError::NotFound(_)
        ));

        // add treats the expired slot as free
        store.add("k", "fresh".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("fresh".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = InMemoryStore::new();
        store
            .set("a", "1".to_string(), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        store.set("b", "2".to_string(), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        store.purge_expired().await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("b").await.unwrap(), Some("2".to_string()));
    }
}
