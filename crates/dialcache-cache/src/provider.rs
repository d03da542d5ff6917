//! Cache storage provider trait and implementations.

use crate::archiver::{HashingWriter, checksum_reader, create_archive, extract_archive, resolve_paths};
use crate::keys::{cache_version, key_digest, matches_prefix, validate_key, validate_restore_keys};
use crate::types::{
    CacheEntry, CacheRestoreRequest, CacheSaveRequest, RestoreOutcome, RestoreResult, SaveOutcome,
    SaveResult,
};
use async_trait::async_trait;
use dialcache_core::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Trait for cache storage backends.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Restore the best entry for the request: the exact key first, then
    /// each restore key prefix in order.
    async fn restore(&self, request: &CacheRestoreRequest) -> Result<RestoreResult>;

    /// Save a new entry. An existing entry under the same key is left alone.
    async fn save(&self, request: &CacheSaveRequest) -> Result<SaveResult>;

    /// Check if a key exists.
    async fn exists(&self, key: &str, version: &str) -> Result<bool>;

    /// Delete a cache entry.
    async fn delete(&self, key: &str, version: &str) -> Result<()>;

    /// List entries whose key starts with `prefix`, newest first.
    async fn list(&self, prefix: &str, version: &str) -> Result<Vec<CacheEntry>>;
}

/// Directory-backed cache provider.
///
/// Entries live under `<root>/<version>/`. Each key has a JSON manifest
/// named by the key's digest; the archive it points at is named by the key
/// digest plus the archive checksum. Publishing the manifest is what makes
/// an entry exist, so an archive without a manifest is ignored.
#[derive(Debug, Clone)]
pub struct FilesystemProvider {
    root_dir: PathBuf,
}

impl FilesystemProvider {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Platform cache directory, falling back to the system temp dir.
    pub fn default_root() -> PathBuf {
        directories::ProjectDirs::from("io", "dialcache", "dialcache")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("dialcache"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn version_dir(&self, version: &str) -> PathBuf {
        self.root_dir.join(version)
    }

    fn manifest_path(&self, key: &str, version: &str) -> PathBuf {
        self.version_dir(version)
            .join(format!("{}.json", key_digest(key)))
    }

    fn archive_path(&self, entry: &CacheEntry) -> PathBuf {
        self.version_dir(&entry.version)
            .join(archive_name(entry))
    }

    async fn read_manifest(&self, key: &str, version: &str) -> Result<Option<CacheEntry>> {
        let entry = load_manifest(&self.manifest_path(key, version)).await?;
        Ok(entry.filter(|e| e.key == key))
    }

    async fn unpack(&self, entry: &CacheEntry, dest: &Path) -> Result<()> {
        let archive = self.archive_path(entry);
        let entry = entry.clone();
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let file = File::open(&archive).map_err(|e| Error::CorruptEntry {
                key: entry.key.clone(),
                reason: format!("archive unreadable: {}", e),
            })?;
            let checksum = checksum_reader(BufReader::new(file))?;
            if checksum != entry.checksum {
                return Err(Error::CorruptEntry {
                    key: entry.key.clone(),
                    reason: format!("checksum mismatch: expected {}, got {}", entry.checksum, checksum),
                });
            }

            let file = File::open(&archive)?;
            extract_archive(BufReader::new(file), &dest, entry.compression)
        })
        .await
        .map_err(|e| Error::Internal(format!("Restore task failed: {}", e)))?
    }
}

#[async_trait]
impl CacheProvider for FilesystemProvider {
    async fn restore(&self, request: &CacheRestoreRequest) -> Result<RestoreResult> {
        let start = Instant::now();
        validate_restore_keys(&request.key, &request.restore_keys)?;
        let version = cache_version(&request.paths, request.compression);

        let mut matched = self
            .read_manifest(&request.key, &version)
            .await?
            .map(|entry| (entry, true));

        if matched.is_none() {
            for prefix in &request.restore_keys {
                let entries = self.list(prefix, &version).await?;
                if let Some(entry) = entries.into_iter().next() {
                    debug!(prefix = %prefix, key = %entry.key, "Restore key matched");
                    matched = Some((entry, false));
                    break;
                }
            }
        }

        let outcome = match matched {
            Some((entry, exact)) => {
                self.unpack(&entry, &request.base_dir).await?;
                info!(key = %entry.key, exact, size_bytes = entry.size_bytes, "Cache restored");
                RestoreOutcome::Hit { entry, exact }
            }
            None => {
                info!(key = %request.key, "Cache not found");
                RestoreOutcome::Miss
            }
        };

        Ok(RestoreResult {
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn save(&self, request: &CacheSaveRequest) -> Result<SaveResult> {
        let start = Instant::now();
        validate_key(&request.key)?;
        let version = cache_version(&request.paths, request.compression);

        if self.exists(&request.key, &version).await? {
            info!(key = %request.key, "Cache entry already exists, skipping save");
            return Ok(SaveResult {
                outcome: SaveOutcome::AlreadyExists {
                    key: request.key.clone(),
                },
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        let dir = self.version_dir(&version);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create cache dir: {}", e)))?;

        let manifest_path = self.manifest_path(&request.key, &version);
        let request = request.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            write_entry(&request, version, &dir, &manifest_path)
        })
        .await
        .map_err(|e| Error::Internal(format!("Save task failed: {}", e)))??;

        match &outcome {
            SaveOutcome::Created(entry) => info!(
                key = %entry.key,
                files = entry.file_count,
                size_bytes = entry.size_bytes,
                "Cache saved"
            ),
            SaveOutcome::AlreadyExists { key } => {
                info!(key = %key, "Cache entry created concurrently, skipping save")
            }
        }

        Ok(SaveResult {
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn exists(&self, key: &str, version: &str) -> Result<bool> {
        Ok(self.read_manifest(key, version).await?.is_some())
    }

    async fn delete(&self, key: &str, version: &str) -> Result<()> {
        let Some(entry) = self.read_manifest(key, version).await? else {
            return Ok(());
        };

        for path in [self.manifest_path(key, version), self.archive_path(&entry)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::Storage(format!("Failed to delete cache: {}", e)));
                }
            }
        }
        debug!(key = %key, "Cache entry deleted");
        Ok(())
    }

    async fn list(&self, prefix: &str, version: &str) -> Result<Vec<CacheEntry>> {
        let search_dir = self.version_dir(version);
        if !tokio::fs::try_exists(&search_dir).await.unwrap_or(false) {
            return Ok(vec![]);
        }

        let mut read_dir = tokio::fs::read_dir(&search_dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to read cache dir: {}", e)))?;

        let mut entries = vec![];
        while let Some(dirent) = read_dir
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read entry: {}", e)))?
        {
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            if let Some(entry) = load_manifest(&path).await? {
                if matches_prefix(&entry.key, prefix) {
                    entries.push(entry);
                }
            }
        }

        // Newest first; key descending breaks ties.
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.key.cmp(&a.key))
        });

        Ok(entries)
    }
}

impl Default for FilesystemProvider {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

fn archive_name(entry: &CacheEntry) -> String {
    let checksum = &entry.checksum;
    format!(
        "{}-{}.{}",
        key_digest(&entry.key),
        &checksum[..checksum.len().min(16)],
        entry.compression.extension()
    )
}

/// Read one manifest. A missing file is `None`; an unparsable one is
/// logged and also treated as `None`, wherever it is read from.
async fn load_manifest(path: &Path) -> Result<Option<CacheEntry>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::Storage(format!(
                "Failed to read manifest {}: {}",
                path.display(),
                e
            )));
        }
    };

    match serde_json::from_slice::<CacheEntry>(&bytes) {
        Ok(entry) => Ok(Some(entry)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable manifest");
            Ok(None)
        }
    }
}

fn write_entry(
    request: &CacheSaveRequest,
    version: String,
    dir: &Path,
    manifest_path: &Path,
) -> Result<SaveOutcome> {
    let files = resolve_paths(&request.base_dir, &request.paths)?;
    if files.is_empty() {
        return Err(Error::NoMatchingPaths(request.paths.join(", ")));
    }
    debug!(count = files.len(), "Archiving files");

    let staged = tempfile::NamedTempFile::new_in(dir)?;
    let writer = HashingWriter::new(BufWriter::new(staged.as_file()));
    let writer = create_archive(writer, &request.base_dir, &files, request.compression)?;
    let (buffered, checksum, size_bytes) = writer.finalize();
    buffered
        .into_inner()
        .map_err(|e| Error::Storage(format!("Failed to flush archive: {}", e)))?
        .sync_all()?;

    let entry = CacheEntry {
        key: request.key.clone(),
        version,
        size_bytes,
        file_count: files.len() as u64,
        created_at: chrono::Utc::now(),
        compression: request.compression,
        checksum,
    };

    // Archive names carry the checksum, so replacing a leftover file with
    // the same name never changes what a published manifest points at.
    let archive_path = dir.join(archive_name(&entry));
    staged
        .persist(&archive_path)
        .map_err(|e| Error::Storage(format!("Failed to store archive: {}", e.error)))?;

    let publish = || -> Result<SaveOutcome> {
        let mut manifest = tempfile::NamedTempFile::new_in(dir)?;
        manifest.write_all(&serde_json::to_vec_pretty(&entry)?)?;

        let conflict = match manifest.persist_noclobber(manifest_path) {
            Ok(_) => return Ok(SaveOutcome::Created(entry.clone())),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => e.file,
            Err(e) => {
                return Err(Error::Storage(format!("Failed to store manifest: {}", e.error)));
            }
        };

        let existing = std::fs::read(manifest_path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<CacheEntry>(&bytes).ok());
        match existing {
            Some(existing) => {
                if dir.join(archive_name(&existing)) != archive_path {
                    let _ = std::fs::remove_file(&archive_path);
                }
                Ok(SaveOutcome::AlreadyExists {
                    key: request.key.clone(),
                })
            }
            None => {
                warn!(key = %entry.key, "Replacing unreadable manifest");
                conflict
                    .persist(manifest_path)
                    .map_err(|e| Error::Storage(format!("Failed to store manifest: {}", e.error)))?;
                Ok(SaveOutcome::Created(entry.clone()))
            }
        }
    };

    let outcome = publish();
    if outcome.is_err() {
        let _ = std::fs::remove_file(&archive_path);
    }
    outcome
}
