//! Error types for cache operations.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Memcached-specific error
    #[cfg(feature = "memcached")]
    #[error("Memcached error: {0}")]
    Memcached(#[from] memcache::MemcacheError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Key not found (atomic increment on an absent key)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key already exists (create-if-absent on a present key)
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error (undeclared lookup fields, bad declarations).
    ///
    /// Signals a code/schema mismatch on the caller's side; must not be
    /// caught and silently ignored.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Generic error
    #[error("Cache error: {0}")]
    Other(String),
}
