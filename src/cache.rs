//! Versioned cache: the core get/version/incr surface.

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::keys::KeyCodec;
use crate::store::CacheStore;
use crate::version::VersionStore;
use log::debug;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

/// Cache facade that tags keys with a per-name version counter.
///
/// Callers embed [`version`](VersionedCache::version) output into their key
/// names; [`incr`](VersionedCache::incr) then invalidates every entry built
/// on the old version in one counter write. Stale entries are never deleted,
/// they just become unreachable and age out through their TTL.
///
/// # Examples
///
/// ```
/// use vercache::{InMemoryStore, VersionedCache};
///
/// # async fn example() -> Result<(), vercache::CacheError> {
/// let cache = VersionedCache::new(InMemoryStore::new());
///
/// let key = cache.version("segments").await?;
/// let segments: Vec<String> = cache
///     .get(&key, || async { Ok(vec!["climbing".to_string()]) }, None)
///     .await?;
///
/// // Some segment changed: everything keyed under "segments" is stale now.
/// cache.incr("segments").await?;
/// # Ok(())
/// # }
/// ```
pub struct VersionedCache<S: CacheStore> {
    store: Arc<S>,
    versions: VersionStore<S>,
    codec: KeyCodec,
    default_ttl: Duration,
}

impl<S: CacheStore> VersionedCache<S> {
    /// Create a versioned cache with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, CacheConfig::default())
    }

    /// Create a versioned cache with a custom configuration.
    pub fn with_config(store: S, config: CacheConfig) -> Self {
        let store = Arc::new(store);
        let codec = config.key_codec();
        let versions = VersionStore::new(store.clone(), codec.clone(), config.version_suffix);
        Self {
            store,
            versions,
            codec,
            default_ttl: config.default_ttl,
        }
    }

    /// The underlying version store.
    pub fn versions(&self) -> &VersionStore<S> {
        &self.versions
    }

    /// Generate a key carrying the latest version number for `name`.
    ///
    /// Returns `"<safe key>:<version>"`. The version counter is created at 1
    /// on first use.
    pub async fn version(&self, name: &str) -> CacheResult<String> {
        let safe = self.codec.safe_key(name, false);
        let version = self.versions.version(name).await?;
        Ok(format!("{}:{}", safe, version))
    }

    /// Get an item from the cache, or compute and store it on a miss.
    ///
    /// Returns the item and a refreshed flag: `true` when the producer ran.
    /// Only backend absence counts as a miss: a cached `0`, empty string,
    /// empty list or empty map is a hit and the producer is not invoked.
    /// Producer failures propagate unmodified and nothing is cached.
    ///
    /// # Arguments
    ///
    /// * `key` - Logical cache key (normalized internally)
    /// * `producer` - Factory run on a miss to build the value
    /// * `ttl` - Item lifetime; `None` uses the configured default (23h)
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<Duration>,
    ) -> CacheResult<(T, bool)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        let safe_key = self.codec.safe_key(key, false);

        if let Some(json) = self.store.get(&safe_key).await? {
            let item = serde_json::from_str(&json)
                .map_err(|e| CacheError::Deserialization(e.to_string()))?;
            debug!("Found cached item at {}", safe_key);
            return Ok((item, false));
        }

        let item = producer().await?;
        let json =
            serde_json::to_string(&item).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.store
            .set(&safe_key, json, Some(ttl.unwrap_or(self.default_ttl)))
            .await?;
        debug!("Added item to cache at {}", safe_key);

        Ok((item, true))
    }

    /// Get an item from the cache, or compute and store it on a miss.
    ///
    /// Same as [`get_or_compute`](VersionedCache::get_or_compute) without
    /// the refreshed flag.
    pub async fn get<T, F, Fut>(&self, key: &str, producer: F, ttl: Option<Duration>) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        let (item, _refreshed) = self.get_or_compute(key, producer, ttl).await?;
        Ok(item)
    }

    /// Increment the version for `name`, invalidating all entries keyed
    /// under its previous version. Creates the counter if it doesn't exist.
    pub async fn incr(&self, name: &str) -> CacheResult<()> {
        self.versions.bump(name).await
    }
}

impl<S: CacheStore> Clone for VersionedCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            versions: self.versions.clone(),
            codec: self.codec.clone(),
            default_ttl: self.default_ttl,
        }
    }
}
