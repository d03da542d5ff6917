//! Exit-code tests for the dialcache binary.

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const PLT: &str = "_build/dev/dialyxir_erlang-25.3_elixir-1.14.5_deps-dev.plt";
const PLT_HASH: &str = "_build/dev/dialyxir_erlang-25.3_elixir-1.14.5_deps-dev.plt.hash";

fn dialcache(store: &Path, workspace: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("dialcache");
    cmd.env_clear()
        .env("DIALCACHE_DIR", store)
        .env("DIALCACHE_WORKSPACE", workspace);
    cmd
}

#[test]
fn help_displays() {
    cargo_bin_cmd!("dialcache")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dialyzer PLT"));
}

#[test]
fn missing_cache_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    dialcache(dir.path(), dir.path())
        .arg("restore")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CACHE_KEY"));
}

#[test]
fn cold_restore_exits_zero() {
    let store = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();

    dialcache(store.path(), ws.path())
        .arg("restore")
        .env("CACHE_KEY", "v1-otp25-abc")
        .env("OTP_PREFIX", "v1-otp25-")
        .env("SYSTEM_PREFIX", "")
        .assert()
        .success()
        .stderr(predicate::str::contains("No cache entry"));

    assert!(!ws.path().join("_build").exists());
}

#[test]
fn save_twice_then_restore_by_prefix() {
    let store = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    fs::create_dir_all(ws.path().join("_build/dev")).unwrap();
    fs::write(ws.path().join(PLT), "success typings").unwrap();

    dialcache(store.path(), ws.path())
        .arg("save")
        .env("CACHE_KEY", "v1-otp25-abc")
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved"));

    dialcache(store.path(), ws.path())
        .arg("save")
        .env("CACHE_KEY", "v1-otp25-abc")
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));

    let fresh = tempfile::tempdir().unwrap();
    dialcache(store.path(), fresh.path())
        .arg("restore")
        .env("CACHE_KEY", "v1-otp25-xyz")
        .env("OTP_PREFIX", "v1-otp25-")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(fresh.path().join(PLT)).unwrap(),
        "success typings"
    );
}

#[test]
fn save_without_plt_fails() {
    let store = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();

    dialcache(store.path(), ws.path())
        .arg("save")
        .env("CACHE_KEY", "v1-otp25-abc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files matched"));
}

#[test]
fn relative_workspace_round_trip() {
    let store = tempfile::tempdir().unwrap();
    let ws = tempfile::tempdir().unwrap();
    fs::create_dir_all(ws.path().join("_build/dev")).unwrap();
    fs::write(ws.path().join(PLT), "success typings").unwrap();
    fs::write(ws.path().join(PLT_HASH), "deps hash").unwrap();

    for workspace in [".", "./"] {
        let mut cmd = dialcache(store.path(), Path::new(workspace));
        cmd.current_dir(ws.path())
            .arg("save")
            .env("CACHE_KEY", format!("v1-otp25-{}", workspace.len()))
            .assert()
            .success()
            .stderr(predicate::str::contains("Saved"));
    }

    let fresh = tempfile::tempdir().unwrap();
    dialcache(store.path(), Path::new("."))
        .current_dir(fresh.path())
        .arg("restore")
        .env("CACHE_KEY", "v1-otp25-1")
        .assert()
        .success()
        .stderr(predicate::str::contains("Restored"));

    assert_eq!(
        fs::read_to_string(fresh.path().join(PLT)).unwrap(),
        "success typings"
    );
    assert_eq!(
        fs::read_to_string(fresh.path().join(PLT_HASH)).unwrap(),
        "deps hash"
    );
}

#[test]
fn keys_differing_only_in_separators_stay_apart() {
    let store = tempfile::tempdir().unwrap();
    for (key, contents) in [("v1/otp25", "slash"), ("v1_otp25", "underscore")] {
        let ws = tempfile::tempdir().unwrap();
        fs::create_dir_all(ws.path().join("_build/dev")).unwrap();
        fs::write(ws.path().join(PLT), contents).unwrap();

        dialcache(store.path(), ws.path())
            .arg("save")
            .env("CACHE_KEY", key)
            .assert()
            .success()
            .stderr(predicate::str::contains("Saved"));
    }

    let fresh = tempfile::tempdir().unwrap();
    dialcache(store.path(), fresh.path())
        .arg("restore")
        .env("CACHE_KEY", "v1/otp25")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(fresh.path().join(PLT)).unwrap(), "slash");
}
