//! PLT cache storage for dialcache.
//!
//! Entries are tar archives of glob-selected files, stored under an exact
//! key and found again by that key or by an ordered list of key prefixes.

pub mod archiver;
pub mod compression;
pub mod keys;
pub mod provider;
pub mod types;

pub use keys::{cache_version, key_digest, matches_prefix, validate_key, validate_restore_keys};
pub use provider::{CacheProvider, FilesystemProvider};
pub use types::{
    CacheEntry, CacheRestoreRequest, CacheSaveRequest, CompressionType, RestoreOutcome,
    RestoreResult, SaveOutcome, SaveResult,
};
