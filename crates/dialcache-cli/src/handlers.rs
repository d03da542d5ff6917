//! Command handlers.

use crate::config::Settings;
use console::style;
use dialcache_cache::{CacheProvider, RestoreOutcome, SaveOutcome};
use dialcache_core::Result;
use tracing::debug;

/// Restore the PLT. A miss is reported, not returned as an error.
pub async fn restore(provider: &dyn CacheProvider, settings: &Settings) -> Result<RestoreOutcome> {
    let request = settings.restore_request();
    debug!(
        key = %request.key,
        restore_keys = ?request.restore_keys,
        workspace = %request.base_dir.display(),
        "Restoring cache"
    );

    let result = provider.restore(&request).await?;
    debug!(
        matched = ?result.outcome.matched_key(),
        duration_ms = result.duration_ms,
        "Restore finished"
    );
    match &result.outcome {
        RestoreOutcome::Hit { entry, exact } => {
            let kind = if *exact { "exact" } else { "prefix" };
            eprintln!(
                "{} Restored {} ({} match, {} files, {} ms)",
                style("✓").green(),
                style(&entry.key).bold(),
                kind,
                entry.file_count,
                result.duration_ms
            );
        }
        RestoreOutcome::Miss => {
            eprintln!(
                "{} No cache entry for {}",
                style("!").yellow(),
                style(&request.key).bold()
            );
        }
    }

    Ok(result.outcome)
}

/// Save the PLT. An existing entry under the key is reported, not an error.
pub async fn save(provider: &dyn CacheProvider, settings: &Settings) -> Result<SaveOutcome> {
    let request = settings.save_request();
    debug!(
        key = %request.key,
        workspace = %request.base_dir.display(),
        "Saving cache"
    );

    let result = provider.save(&request).await?;
    match &result.outcome {
        SaveOutcome::Created(entry) => {
            eprintln!(
                "{} Saved {} ({} files, {} bytes, {} ms)",
                style("✓").green(),
                style(&entry.key).bold(),
                entry.file_count,
                entry.size_bytes,
                result.duration_ms
            );
        }
        SaveOutcome::AlreadyExists { key } => {
            eprintln!(
                "{} Cache entry {} already exists",
                style("!").yellow(),
                style(key).bold()
            );
        }
    }

    Ok(result.outcome)
}
