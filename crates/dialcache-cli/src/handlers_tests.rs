use crate::config::Settings;
use crate::handlers;
use async_trait::async_trait;
use dialcache_cache::{
    CacheEntry, CacheProvider, CacheRestoreRequest, CacheSaveRequest, CompressionType,
    FilesystemProvider, RestoreOutcome, RestoreResult, SaveOutcome, SaveResult,
};
use dialcache_core::{Error, InvocationConfig, Result};
use std::fs;
use std::path::Path;

const PLT: &str = "_build/dev/dialyxir_erlang-25.3_elixir-1.14.5_deps-dev.plt";
const PLT_HASH: &str = "_build/dev/dialyxir_erlang-25.3_elixir-1.14.5_deps-dev.plt.hash";

fn settings(store: &Path, workspace: &Path, invocation: InvocationConfig) -> Settings {
    Settings {
        invocation,
        cache_dir: store.to_path_buf(),
        workspace: workspace.to_path_buf(),
        compression: CompressionType::Zstd,
    }
}

fn build_plt(workspace: &Path, contents: &str) {
    let path = workspace.join(PLT);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
    fs::write(workspace.join(PLT_HASH), format!("{}-hash", contents)).unwrap();
}

#[tokio::test]
async fn test_cold_cache_then_save_then_prefix_restore() {
    let store = tempfile::tempdir().unwrap();
    let provider = FilesystemProvider::new(store.path());

    // Cold cache: restore misses and writes nothing.
    let first_run = tempfile::tempdir().unwrap();
    let config = InvocationConfig::new("v1-otp25-abc").with_otp_prefix("v1-otp25-");
    let outcome = handlers::restore(&provider, &settings(store.path(), first_run.path(), config.clone()))
        .await
        .expect("miss must not fail");
    assert_eq!(outcome, RestoreOutcome::Miss);
    assert!(!first_run.path().join(PLT).exists());

    // The build produces a PLT, which gets saved under the exact key.
    build_plt(first_run.path(), "success typings");
    let outcome = handlers::save(&provider, &settings(store.path(), first_run.path(), config.clone()))
        .await
        .unwrap();
    assert!(matches!(outcome, SaveOutcome::Created(ref entry) if entry.file_count == 2));

    // A later run with a different key falls back to the OTP prefix.
    let second_run = tempfile::tempdir().unwrap();
    let config = InvocationConfig::new("v1-otp25-xyz").with_otp_prefix("v1-otp25-");
    let outcome = handlers::restore(&provider, &settings(store.path(), second_run.path(), config))
        .await
        .unwrap();
    assert_eq!(outcome.matched_key(), Some("v1-otp25-abc"));
    assert_eq!(
        fs::read_to_string(second_run.path().join(PLT)).unwrap(),
        "success typings"
    );
    assert_eq!(
        fs::read_to_string(second_run.path().join(PLT_HASH)).unwrap(),
        "success typings-hash"
    );
}

#[tokio::test]
async fn test_repeated_save_reports_existing_entry() {
    let store = tempfile::tempdir().unwrap();
    let provider = FilesystemProvider::new(store.path());
    let ws = tempfile::tempdir().unwrap();
    build_plt(ws.path(), "success typings");
    let s = settings(store.path(), ws.path(), InvocationConfig::new("v1-otp25-abc"));

    assert!(matches!(
        handlers::save(&provider, &s).await.unwrap(),
        SaveOutcome::Created(_)
    ));
    let again = handlers::save(&provider, &s).await.unwrap();
    assert_eq!(
        again,
        SaveOutcome::AlreadyExists {
            key: "v1-otp25-abc".to_string()
        }
    );
}

#[tokio::test]
async fn test_otp_prefix_preferred_over_system_prefix() {
    let store = tempfile::tempdir().unwrap();
    let provider = FilesystemProvider::new(store.path());

    let otp = tempfile::tempdir().unwrap();
    build_plt(otp.path(), "otp");
    handlers::save(&provider, &settings(store.path(), otp.path(), InvocationConfig::new("v1-otp25-abc")))
        .await
        .unwrap();

    let system = tempfile::tempdir().unwrap();
    build_plt(system.path(), "system");
    handlers::save(
        &provider,
        &settings(store.path(), system.path(), InvocationConfig::new("v1-ubuntu-def")),
    )
    .await
    .unwrap();

    let ws = tempfile::tempdir().unwrap();
    let config = InvocationConfig::new("v1-otp25-new")
        .with_otp_prefix("v1-otp25-")
        .with_system_prefix("v1-ubuntu-");
    let outcome = handlers::restore(&provider, &settings(store.path(), ws.path(), config))
        .await
        .unwrap();

    assert_eq!(outcome.matched_key(), Some("v1-otp25-abc"));
    assert_eq!(fs::read_to_string(ws.path().join(PLT)).unwrap(), "otp");
}

#[tokio::test]
async fn test_save_without_plt_fails() {
    let store = tempfile::tempdir().unwrap();
    let provider = FilesystemProvider::new(store.path());
    let ws = tempfile::tempdir().unwrap();

    let err = handlers::save(&provider, &settings(store.path(), ws.path(), InvocationConfig::new("v1-otp25-abc")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoMatchingPaths(_)));
}

struct UnavailableProvider;

#[async_trait]
impl CacheProvider for UnavailableProvider {
    async fn restore(&self, _request: &CacheRestoreRequest) -> Result<RestoreResult> {
        Err(Error::Storage("cache service unavailable".into()))
    }

    async fn save(&self, _request: &CacheSaveRequest) -> Result<SaveResult> {
        Err(Error::Storage("quota exceeded".into()))
    }

    async fn exists(&self, _key: &str, _version: &str) -> Result<bool> {
        Ok(false)
    }

    async fn delete(&self, _key: &str, _version: &str) -> Result<()> {
        Ok(())
    }

    async fn list(&self, _prefix: &str, _version: &str) -> Result<Vec<CacheEntry>> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_provider_failures_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let s = settings(dir.path(), dir.path(), InvocationConfig::new("v1-otp25-abc"));

    let err = handlers::restore(&UnavailableProvider, &s).await.unwrap_err();
    assert_eq!(err.to_string(), "Storage error: cache service unavailable");

    let err = handlers::save(&UnavailableProvider, &s).await.unwrap_err();
    assert_eq!(err.to_string(), "Storage error: quota exceeded");
}
