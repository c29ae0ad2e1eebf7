//! Integration tests for the gitsnap binary.
//!
//! These tests exercise the full CLI against temporary directories and a
//! throwaway config file, never the user's own configuration.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for running gitsnap with an isolated config location.
fn gitsnap(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gitsnap").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("GITSNAP_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    gitsnap(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gitsnap"));
}

#[test]
fn help_flag_works() {
    let home = TempDir::new().unwrap();
    gitsnap(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn normalize_prefixes_https() {
    let home = TempDir::new().unwrap();
    gitsnap(home.path())
        .args(["normalize", "github.com/org/repo"])
        .assert()
        .success()
        .stdout("https://github.com/org/repo\n");
}

#[test]
fn normalize_rejects_colon() {
    let home = TempDir::new().unwrap();
    gitsnap(home.path())
        .args(["normalize", "ht tp://foo.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("url parse error"))
        .stderr(predicate::str::contains(
            "first path segment in URL cannot contain colon",
        ));
}

#[test]
fn inspect_local_directory_json() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    fs::write(tree.path().join("main.tf"), "resource {}\n").unwrap();
    let target = tree.path().to_string_lossy().into_owned();

    let output = gitsnap(home.path())
        .args(["inspect", &target, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], target.as_str());
    assert_eq!(json["type"], "repository");
    let id = json["id"].as_str().unwrap();
    assert!(id.starts_with("sha256:"));
    assert_eq!(json["blob_ids"][0], id);
    assert!(tree.path().join("main.tf").exists());
}

#[test]
fn inspect_text_output() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    fs::write(tree.path().join("a.txt"), "a").unwrap();

    gitsnap(home.path())
        .args(["inspect", &tree.path().to_string_lossy()])
        .assert()
        .success()
        .stdout(predicate::str::contains("type:     repository"))
        .stdout(predicate::str::contains("id:       sha256:"));
}

#[test]
fn inspect_writes_cache() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    fs::write(tree.path().join("a.txt"), "a").unwrap();

    gitsnap(home.path())
        .args(["inspect", &tree.path().to_string_lossy(), "--cache-dir"])
        .arg(cache.path())
        .assert()
        .success();

    let blobs = cache.path().join("blobs/sha256");
    assert_eq!(fs::read_dir(blobs).unwrap().count(), 1);
}

#[test]
fn inspect_conflicting_selectors() {
    let home = TempDir::new().unwrap();
    gitsnap(home.path())
        .args(["inspect", "github.com/org/repo", "--branch", "main", "--commit", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn inspect_missing_remote_fails() {
    let home = TempDir::new().unwrap();
    let missing = TempDir::new().unwrap();
    let url = format!("file://{}", missing.path().join("unknown.git").display());

    gitsnap(home.path())
        .args(["inspect", &url, "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("repository not found"));
}

#[test]
fn inspect_rejects_zero_timeout() {
    let home = TempDir::new().unwrap();
    gitsnap(home.path())
        .args(["inspect", "github.com/org/repo", "--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout must be greater than zero"));
}

#[test]
fn inspect_accepts_huge_timeout() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    fs::write(tree.path().join("a.txt"), "a").unwrap();

    gitsnap(home.path())
        .args(["inspect", &tree.path().to_string_lossy()])
        .args(["--timeout", "18446744073709551615"])
        .assert()
        .success()
        .stdout(predicate::str::contains("id:       sha256:"));
}

#[test]
fn config_init_then_show() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("custom.toml");

    gitsnap(home.path())
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    assert!(path.exists());

    gitsnap(home.path())
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    gitsnap(home.path())
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"))
        .stdout(predicate::str::contains("progress = true"));
}

#[test]
fn config_show_defaults() {
    let home = TempDir::new().unwrap();
    gitsnap(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(defaults)"));
}

#[test]
fn invalid_config_is_reported() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("bad.toml");
    fs::write(&path, "timeout_secs = 0\n").unwrap();

    gitsnap(home.path())
        .args(["normalize", "github.com/org/repo", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs must be greater than zero"));
}

#[test]
fn completion_generates_script() {
    let home = TempDir::new().unwrap();
    gitsnap(home.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gitsnap"));
}
