//! Version counters for generation-based invalidation.

use crate::error::{CacheError, CacheResult};
use crate::keys::KeyCodec;
use crate::store::CacheStore;
use log::debug;
use std::sync::Arc;

/// Maps a logical name to a live version integer stored in the backend.
///
/// Versions are created lazily at 1 on first access and only ever move
/// forward. There is no coordination beyond the backend's own `add` and
/// `increment` atomicity: two concurrent first reads may both write 1
/// (idempotent), and two concurrent first bumps may collapse into one
/// (accepted, see [`bump`](VersionStore::bump)).
pub struct VersionStore<S: CacheStore> {
    store: Arc<S>,
    codec: KeyCodec,
    suffix: String,
}

impl<S: CacheStore> VersionStore<S> {
    /// Create a version store over a shared backend.
    pub fn new(store: Arc<S>, codec: KeyCodec, suffix: impl Into<String>) -> Self {
        Self {
            store,
            codec,
            suffix: suffix.into(),
        }
    }

    /// The backend key holding the version counter for `name`.
    pub fn version_key(&self, name: &str) -> String {
        format!("{}{}", self.codec.safe_key(name, false), self.suffix)
    }

    /// Get the current version for `name`, creating version 1 if absent.
    ///
    /// A present but non-positive or non-numeric value is treated as absent
    /// and recreated at 1. The counter is written with no expiry; a backend
    /// eviction silently resets the name to version 1, which is a tolerated
    /// degradation.
    pub async fn version(&self, name: &str) -> CacheResult<i64> {
        let vkey = self.version_key(name);
        let current = self
            .store
            .get(&vkey)
            .await?
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0);

        match current {
            Some(version) => Ok(version),
            None => {
                debug!("Creating version key {}", vkey);
                self.store.set(&vkey, "1".to_string(), None).await?;
                Ok(1)
            }
        }
    }

    /// Increment the version for `name`, creating version 1 if absent.
    ///
    /// The increment runs first because after warmup the counter almost
    /// always exists; creation is the cold-start path. When two cold bumps
    /// race, one `add` wins and the other's increment is absorbed: a rare
    /// lost invalidation event that the next mutation repairs. Any backend
    /// failure other than "absent"/"already exists" propagates.
    pub async fn bump(&self, name: &str) -> CacheResult<()> {
        let vkey = self.version_key(name);
        match self.store.increment(&vkey, 1).await {
            Ok(version) => {
                debug!("Incremented version key {} to {}", vkey, version);
                Ok(())
            }
            Err(CacheError::NotFound(_)) => match self.store.add(&vkey, "1".to_string()).await {
                Ok(()) => {
                    debug!("Created version key {}", vkey);
                    Ok(())
                }
                Err(CacheError::AlreadyExists(_)) => Ok(()),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}

impl<S: CacheStore> Clone for VersionStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            codec: self.codec.clone(),
            suffix: self.suffix.clone(),
        }
    }
}
