//! Safe cache key normalization.
//!
//! Memcached-style backends restrict keys to short, printable,
//! whitespace-free byte strings. The codec maps arbitrary input onto that
//! space deterministically: lossy ASCII transliteration, length capping with
//! a readable prefix plus a digest tail, and a final sweep replacing
//! anything outside the printable range. The result only needs to be unique
//! enough for cache addressing, not round-trippable.

use sha2::{Digest, Sha256};

/// Hex digest width used for the truncation tail. Matches the prefix math:
/// prefix + separator + tail must add up to the key limit.
const TAIL_DIGEST_LEN: usize = 32;

/// Over-long keys are hashed over at most this many leading bytes. Two keys
/// sharing an identical 500-byte prefix may collide; accepted bound.
const HASHED_PREFIX_BYTES: usize = 500;

/// Key normalizer carrying the backend limits.
#[derive(Debug, Clone)]
pub struct KeyCodec {
    max_len: usize,
    hash_prefix_len: usize,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MAX_KEY_LEN,
            crate::config::DEFAULT_HASH_PREFIX_LEN,
        )
    }
}

impl KeyCodec {
    /// Create a codec with explicit limits.
    ///
    /// The prefix is clamped so a truncated key never exceeds `max_len`.
    pub fn new(max_len: usize, hash_prefix_len: usize) -> Self {
        Self {
            max_len,
            hash_prefix_len: hash_prefix_len.min(max_len.saturating_sub(TAIL_DIGEST_LEN + 1)),
        }
    }

    /// The configured maximum key length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Normalize `raw` into a backend-legal key.
    ///
    /// Non-ASCII bytes are dropped. If the transliterated key fits the
    /// limit it passes through (modulo the printable sweep); otherwise it is
    /// replaced by its first `hash_prefix_len` bytes, a `-`, and a hex
    /// digest of its first 500 bytes. With `no_limit` the whole key is
    /// replaced by the fixed-width digest of the full transliterated string.
    /// Finally, every byte outside `!`..=`~` becomes `-`.
    ///
    /// Pure and deterministic. Not a fixed point under double application
    /// in general; apply once per logical key.
    pub fn safe_key(&self, raw: &str, no_limit: bool) -> String {
        let mut key: String = raw.chars().filter(char::is_ascii).collect();

        if key.len() > self.max_len {
            if no_limit {
                key = full_digest(key.as_bytes());
            } else {
                let hashed = &key.as_bytes()[..key.len().min(HASHED_PREFIX_BYTES)];
                let tail = tail_digest(hashed);
                key.truncate(self.hash_prefix_len);
                key.push('-');
                key.push_str(&tail);
            }
        }

        key.chars()
            .map(|c| if ('!'..='~').contains(&c) { c } else { '-' })
            .collect()
    }
}

/// Hex digest truncated to the tail width.
fn tail_digest(data: &[u8]) -> String {
    let mut digest = full_digest(data);
    digest.truncate(TAIL_DIGEST_LEN);
    digest
}

/// Full-width hex digest.
fn full_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
