//! Cache key validation and versioning.

use crate::types::CompressionType;
use dialcache_core::{Error, Result};
use sha2::{Digest, Sha256};

/// Longest accepted key, in characters.
pub const MAX_KEY_LENGTH: usize = 512;

/// Most keys accepted by one restore, primary key included.
pub const MAX_RESTORE_KEYS: usize = 10;

/// Check a single key or restore prefix.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty".into()));
    }
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(Error::InvalidKey(format!(
            "key exceeds {} characters: {}",
            MAX_KEY_LENGTH, key
        )));
    }
    if key.contains(',') {
        return Err(Error::InvalidKey(format!(
            "key cannot contain commas: {}",
            key
        )));
    }
    Ok(())
}

/// Check a primary key together with its fallback prefixes.
pub fn validate_restore_keys(key: &str, restore_keys: &[String]) -> Result<()> {
    let count = 1 + restore_keys.len();
    if count > MAX_RESTORE_KEYS {
        return Err(Error::TooManyKeys {
            count,
            max: MAX_RESTORE_KEYS,
        });
    }
    validate_key(key)?;
    restore_keys.iter().try_for_each(|k| validate_key(k))
}

/// Version string scoping entries to a set of path patterns and a codec.
///
/// Two requests only see each other's entries when their versions match.
pub fn cache_version(paths: &[String], compression: CompressionType) -> String {
    let mut hasher = Sha256::new();
    for path in paths {
        hasher.update(path.as_bytes());
        hasher.update(b"|");
    }
    hasher.update(compression.as_str().as_bytes());

    let hash = hasher.finalize();
    hex::encode(&hash[..16])
}

/// Check if a key matches a prefix pattern.
pub fn matches_prefix(key: &str, prefix: &str) -> bool {
    key.starts_with(prefix)
}

/// File-name-safe identity of a key. Distinct keys never share a digest.
pub fn key_digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}
