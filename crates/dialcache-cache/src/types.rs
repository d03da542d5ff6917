//! Cache types, requests and outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Request to restore a cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRestoreRequest {
    /// Primary cache key.
    pub key: String,
    /// Fallback prefixes tried in order if the primary key misses.
    #[serde(default)]
    pub restore_keys: Vec<String>,
    /// Glob patterns selecting the cached files, relative to `base_dir`.
    pub paths: Vec<String>,
    /// Directory the patterns resolve against and archives unpack into.
    pub base_dir: PathBuf,
    /// Compression the entry was saved with.
    #[serde(default)]
    pub compression: CompressionType,
}

/// Request to save a cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSaveRequest {
    /// Cache key.
    pub key: String,
    /// Glob patterns selecting the files to cache, relative to `base_dir`.
    pub paths: Vec<String>,
    /// Directory the patterns resolve against.
    pub base_dir: PathBuf,
    /// Compression algorithm.
    #[serde(default)]
    pub compression: CompressionType,
}

/// Compression algorithm.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    None,
    #[default]
    Zstd,
    Gzip,
    Lz4,
}

impl CompressionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionType::None => "none",
            CompressionType::Zstd => "zstd",
            CompressionType::Gzip => "gzip",
            CompressionType::Lz4 => "lz4",
        }
    }

    /// File extension used for archives in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            CompressionType::None => "tar",
            CompressionType::Zstd => "tar.zst",
            CompressionType::Gzip => "tar.gz",
            CompressionType::Lz4 => "tar.lz4",
        }
    }
}

impl std::fmt::Display for CompressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CompressionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CompressionType::None),
            "zstd" => Ok(CompressionType::Zstd),
            "gzip" => Ok(CompressionType::Gzip),
            "lz4" => Ok(CompressionType::Lz4),
            other => Err(format!("Unknown compression: {}", other)),
        }
    }
}

/// A stored cache entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    /// Cache key.
    pub key: String,
    /// Digest of the path patterns and compression.
    pub version: String,
    /// Archive size in bytes.
    pub size_bytes: u64,
    /// Number of files in the archive.
    pub file_count: u64,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// Compression used.
    pub compression: CompressionType,
    /// SHA-256 of the archive, hex encoded.
    pub checksum: String,
}

/// Outcome of a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// An entry was found and unpacked.
    Hit {
        entry: CacheEntry,
        /// Whether the primary key matched, as opposed to a fallback prefix.
        exact: bool,
    },
    /// Nothing matched; no files were written.
    Miss,
}

impl RestoreOutcome {
    /// The key of the restored entry, if any.
    pub fn matched_key(&self) -> Option<&str> {
        match self {
            RestoreOutcome::Hit { entry, .. } => Some(&entry.key),
            RestoreOutcome::Miss => None,
        }
    }
}

/// Outcome of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new entry was stored.
    Created(CacheEntry),
    /// An entry already exists under this key and was left untouched.
    AlreadyExists { key: String },
}

/// Result of a cache restore operation.
#[derive(Debug, Clone)]
pub struct RestoreResult {
    pub outcome: RestoreOutcome,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

/// Result of a cache save operation.
#[derive(Debug, Clone)]
pub struct SaveResult {
    pub outcome: SaveOutcome,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}
