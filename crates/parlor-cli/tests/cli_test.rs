//! End-to-end tests for the `parlor` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn parlor() -> Command {
    let mut cmd = Command::cargo_bin("parlor").unwrap();
    cmd.env_remove("PARLOR_EXTENSIONS").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_discover_lists_native_objects() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("libb.so"), b"").unwrap();
    std::fs::write(dir.path().join("liba.so"), b"").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

    parlor()
        .arg("discover")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("liba.so"))
        .stdout(predicate::str::contains("libb.so"))
        .stdout(predicate::str::contains("notes.txt").not());
}

#[test]
fn test_discover_rejects_missing_dir() {
    parlor()
        .args(["discover", "/nonexistent/parlor/ext"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}

#[test]
fn test_inspect_reports_load_failure() {
    parlor()
        .args(["inspect", "/nonexistent/libparlor_missing.so"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FAILED"));
}

#[test]
fn test_load_with_empty_config_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("extensions.toml");
    std::fs::write(&config, "extensions = []\n").unwrap();

    parlor()
        .arg("load")
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_load_reports_broken_entries() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("extensions.toml");
    std::fs::write(&config, "[[extensions]]\npath = \"missing.so\"\n").unwrap();

    parlor()
        .arg("load")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.so"));
}

#[test]
fn test_symbols_lists_host_api() {
    parlor()
        .arg("symbols")
        .assert()
        .success()
        .stdout(predicate::str::contains("parlor_send_message"))
        .stdout(predicate::str::contains("parlor_free_strings"));
}
