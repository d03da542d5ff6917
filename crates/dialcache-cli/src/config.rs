//! Resolved settings for one invocation.

use crate::commands::Cli;
use dialcache_cache::{
    CacheRestoreRequest, CacheSaveRequest, CompressionType, FilesystemProvider,
};
use dialcache_core::{InvocationConfig, PLT_PATH_PATTERN};
use std::path::PathBuf;

/// Everything a restore or save needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Keys read from the CI environment.
    pub invocation: InvocationConfig,
    /// Root of the directory store.
    pub cache_dir: PathBuf,
    /// Directory the PLT pattern resolves against.
    pub workspace: PathBuf,
    pub compression: CompressionType,
}

impl Settings {
    /// Combine parsed flags with the environment-derived keys.
    ///
    /// A relative workspace is anchored at the current directory.
    pub fn resolve(cli: &Cli, invocation: InvocationConfig) -> std::io::Result<Self> {
        let workspace = match &cli.workspace {
            Some(path) => std::path::absolute(path)?,
            None => std::env::current_dir()?,
        };

        Ok(Self {
            invocation,
            cache_dir: cli
                .cache_dir
                .clone()
                .unwrap_or_else(FilesystemProvider::default_root),
            workspace,
            compression: cli.compression,
        })
    }

    pub fn restore_request(&self) -> CacheRestoreRequest {
        CacheRestoreRequest {
            key: self.invocation.cache_key.clone(),
            restore_keys: self.invocation.restore_keys(),
            paths: vec![PLT_PATH_PATTERN.to_string()],
            base_dir: self.workspace.clone(),
            compression: self.compression,
        }
    }

    pub fn save_request(&self) -> CacheSaveRequest {
        CacheSaveRequest {
            key: self.invocation.cache_key.clone(),
            paths: vec![PLT_PATH_PATTERN.to_string()],
            base_dir: self.workspace.clone(),
            compression: self.compression,
        }
    }
}
