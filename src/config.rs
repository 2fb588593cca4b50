//! Cache configuration types.

use crate::keys::KeyCodec;
use std::time::Duration;

/// Default TTL for cached items: 23 hours, leaving headroom under a daily
/// refresh cycle.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 23);

/// Maximum backend key length. Memcached allows 250; headroom is reserved
/// for prefixes and the version suffix.
pub const DEFAULT_MAX_KEY_LEN: usize = 230;

/// Prefix kept when an over-long key is truncated. 197 + 1 (separator) + 32
/// (digest) adds up to the key limit.
pub const DEFAULT_HASH_PREFIX_LEN: usize = 197;

/// Suffix appended to a safe key to form its version-counter key.
pub const DEFAULT_VERSION_SUFFIX: &str = ".version";

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default TTL for cached items
    pub default_ttl: Duration,

    /// Maximum backend key length
    pub max_key_len: usize,

    /// Readable prefix length kept when truncating over-long keys
    pub hash_prefix_len: usize,

    /// Suffix for version-counter keys
    pub version_suffix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            hash_prefix_len: DEFAULT_HASH_PREFIX_LEN,
            version_suffix: DEFAULT_VERSION_SUFFIX.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a configuration with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default TTL for cached items.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the maximum backend key length.
    pub fn with_max_key_len(mut self, len: usize) -> Self {
        self.max_key_len = len;
        self
    }

    /// Set the readable prefix length for truncated keys.
    pub fn with_hash_prefix_len(mut self, len: usize) -> Self {
        self.hash_prefix_len = len;
        self
    }

    /// Set the version-counter key suffix.
    pub fn with_version_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.version_suffix = suffix.into();
        self
    }

    /// Build the key codec for these limits.
    pub fn key_codec(&self) -> KeyCodec {
        KeyCodec::new(self.max_key_len, self.hash_prefix_len)
    }
}
