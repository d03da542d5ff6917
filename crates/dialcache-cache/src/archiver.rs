//! Tar archiving of glob-selected files.

use crate::compression::{Encoder, decoder};
use crate::types::CompressionType;
use dialcache_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Expand glob patterns under `base_dir` into the matching files.
///
/// Returned paths are relative to `base_dir`, sorted and deduplicated.
/// A pattern matching a directory contributes every file below it.
/// `base_dir` may be relative (`.`, `./`); it is resolved first because
/// glob drops leading `./` components from its matches.
pub fn resolve_paths(base_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let base_dir = base_dir.canonicalize()?;
    let base_dir = base_dir.as_path();
    let base = glob::Pattern::escape(&base_dir.to_string_lossy());
    let mut files = Vec::new();

    for pattern in patterns {
        let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
        let matches = glob::glob(&full)
            .map_err(|e| Error::InvalidPattern(format!("{}: {}", pattern, e)))?;

        for entry in matches {
            let path = entry.map_err(|e| Error::Io(e.into()))?;
            if path.is_dir() {
                let nested = format!("{}/**/*", glob::Pattern::escape(&path.to_string_lossy()));
                let inner = glob::glob(&nested)
                    .map_err(|e| Error::InvalidPattern(format!("{}: {}", pattern, e)))?;
                for child in inner {
                    let child = child.map_err(|e| Error::Io(e.into()))?;
                    if child.is_file() {
                        files.push(relative_to(base_dir, &child)?);
                    }
                }
            } else if path.is_file() {
                files.push(relative_to(base_dir, &path)?);
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn relative_to(base_dir: &Path, path: &Path) -> Result<PathBuf> {
    path.strip_prefix(base_dir)
        .map(Path::to_path_buf)
        .map_err(|_| {
            Error::Internal(format!(
                "{} is outside {}",
                path.display(),
                base_dir.display()
            ))
        })
}

/// Write `files` (relative to `base_dir`) as a compressed tar stream.
pub fn create_archive<W: Write>(
    writer: W,
    base_dir: &Path,
    files: &[PathBuf],
    compression: CompressionType,
) -> Result<W> {
    let encoder = Encoder::new(writer, compression)?;
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(true);

    for name in files {
        builder
            .append_path_with_name(base_dir.join(name), name)
            .map_err(|e| Error::Archive(format!("Failed to pack {}: {}", name.display(), e)))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| Error::Archive(format!("Failed to finish tar: {}", e)))?;
    encoder.finish()
}

/// Extract a compressed tar stream into `dest`.
pub fn extract_archive<R: Read>(reader: R, dest: &Path, compression: CompressionType) -> Result<()> {
    let mut archive = tar::Archive::new(decoder(reader, compression)?);
    archive.set_preserve_mtime(true);
    archive
        .unpack(dest)
        .map_err(|e| Error::Archive(format!("Failed to unpack archive: {}", e)))
}

/// Writer that records the SHA-256 and length of everything written through it.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
    bytes: u64,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    /// Return the inner writer, the hex digest and the byte count.
    pub fn finalize(self) -> (W, String, u64) {
        (self.inner, hex::encode(self.hasher.finalize()), self.bytes)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// SHA-256 of a reader's full contents, hex encoded.
pub fn checksum_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
