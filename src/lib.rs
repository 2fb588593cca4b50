//! Generation-based cache invalidation over memcached-style backends.
//!
//! Instead of deleting cache entries, every logical cache namespace carries
//! a monotonically incrementing version number stored in the same backend.
//! Cache keys are composed as `base_key:version`, so one cheap counter
//! increment invalidates everything tagged with the old version: stale
//! entries become unreachable and age out through their TTL. No enumeration,
//! no deletion sweeps.
//!
//! # Features
//!
//! - `memcached` - Enable the memcached backend (requires explicit opt-in)
//! - `memcached-tls` - TLS for the memcached backend (requires openssl)
//!
//! # Versioned caching
//!
//! ```
//! use vercache::{InMemoryStore, VersionedCache};
//!
//! # async fn example() -> Result<(), vercache::CacheError> {
//! let cache = VersionedCache::new(InMemoryStore::new());
//!
//! // "segments:1" on first use; the version counter is created lazily.
//! let key = cache.version("segments").await?;
//! let segments: Vec<String> = cache
//!     .get(&key, || async { Ok(vec!["alpine".to_string()]) }, None)
//!     .await?;
//!
//! // A segment changed somewhere: one counter write invalidates every
//! // entry keyed under "segments".
//! cache.incr("segments").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Entity-level caching
//!
//! ```
//! use vercache::{CacheManager, EntityKeys, InMemoryStore, VersionedCache};
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), vercache::CacheError> {
//! let manager = CacheManager::new(
//!     VersionedCache::new(InMemoryStore::new()),
//!     EntityKeys::new("widgets")
//!         .with_key_fields(["id"])
//!         .with_partition("owner"),
//! )?;
//!
//! // Single-item lookup against a declared field combination.
//! let widget: String = manager
//!     .get(&[("id", "1")], || async { Ok("widget #1".to_string()) })
//!     .await?;
//!
//! // After any create/update/delete, invalidate with the instance's
//! // current values; every declared slot for it is bumped.
//! let instance: HashMap<String, String> = [
//!     ("id".to_string(), "1".to_string()),
//!     ("owner".to_string(), "a".to_string()),
//! ]
//! .into_iter()
//! .collect();
//! manager.invalidate(&instance).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Memcached backend (requires `memcached` feature)
//!
//! ```ignore
//! use vercache::{MemcachedStore, VersionedCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vercache::CacheError> {
//!     let store = MemcachedStore::connect("memcache://localhost:11211").await?;
//!     let cache = VersionedCache::new(store);
//!
//!     let key = cache.version("accounts").await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod manager;
pub mod memory;
pub mod store;
pub mod version;

#[cfg(feature = "memcached")]
pub mod memcached_store;

pub use cache::VersionedCache;
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use keys::KeyCodec;
pub use manager::{CacheManager, EntityKeys, FieldSource};
pub use memory::InMemoryStore;
pub use store::CacheStore;
pub use version::VersionStore;

#[cfg(feature = "memcached")]
pub use memcached_store::MemcachedStore;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::VersionedCache;
    pub use crate::config::CacheConfig;
    pub use crate::error::{CacheError, CacheResult};
    pub use crate::manager::{CacheManager, EntityKeys, FieldSource};
    pub use crate::memory::InMemoryStore;
    pub use crate::store::CacheStore;

    #[cfg(feature = "memcached")]
    pub use crate::memcached_store::MemcachedStore;
}
