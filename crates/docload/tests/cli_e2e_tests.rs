//! End-to-end tests for the docload binary
//!
//! These tests exercise the CLI surface without a live document store:
//! - convert: artifact generation and decode failures
//! - load / ping: configuration validation and fail-fast connection errors
//! - help output

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

/// Build a docload command isolated from the host environment
fn docload(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docload").unwrap();
    cmd.current_dir(dir)
        .env_remove("DOCLOAD_URI")
        .env_remove("COSMOS_URI")
        .env_remove("DOCLOAD_DATABASE");
    cmd
}

/// Write a line-delimited JSON source file
fn write_source(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

// ============================================================================
// Convert Tests
// ============================================================================

#[test]
fn test_convert_writes_array_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "movies.json",
        &[
            r#"{"title": "Alpha"}"#,
            r#"{"title": "Beta"}"#,
            r#"{"title": "Gamma"}"#,
        ],
    );

    docload(dir.path())
        .arg("convert")
        .arg("movies.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("movies_array.json"))
        .stdout(predicate::str::contains("3 records"));

    let artifact = std::fs::read_to_string(dir.path().join("movies_array.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&artifact).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 3);
}

#[test]
fn test_convert_reports_malformed_line() {
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "movies.json",
        &[r#"{"title": "Alpha"}"#, "{broken", r#"{"title": "Gamma"}"#],
    );

    docload(dir.path())
        .arg("convert")
        .arg("movies.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));

    // Nothing decoded means nothing written
    assert!(!dir.path().join("movies_array.json").exists());
}

#[test]
fn test_convert_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    docload(dir.path())
        .arg("convert")
        .arg("nope.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}

// ============================================================================
// Load / Ping Configuration Tests
// ============================================================================

#[test]
fn test_load_requires_connection_string() {
    let dir = tempfile::tempdir().unwrap();

    docload(dir.path())
        .arg("load")
        .arg("movies")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOCLOAD_URI"));
}

#[test]
fn test_load_rejects_bad_target_spec() {
    let dir = tempfile::tempdir().unwrap();

    docload(dir.path())
        .arg("load")
        .arg("movies=")
        .arg("--uri")
        .arg("mongodb://127.0.0.1:27017/test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid collection target"));
}

#[test]
fn test_load_fails_fast_on_unreachable_store() {
    let dir = tempfile::tempdir().unwrap();

    docload(dir.path())
        .arg("load")
        .arg("movies")
        .arg("--uri")
        .arg("mongodb://127.0.0.1:9/test")
        .env("DOCLOAD_CONNECT_TIMEOUT_SECS", "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Connection failed"));
}

#[test]
fn test_load_requires_database_when_uri_has_none() {
    let dir = tempfile::tempdir().unwrap();

    docload(dir.path())
        .arg("load")
        .arg("movies")
        .arg("--uri")
        .arg("mongodb://127.0.0.1:9")
        .env("DOCLOAD_CONNECT_TIMEOUT_SECS", "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no database specified"));
}

#[test]
fn test_ping_fails_fast_on_unreachable_store() {
    let dir = tempfile::tempdir().unwrap();

    docload(dir.path())
        .arg("ping")
        .arg("--uri")
        .arg("mongodb://127.0.0.1:9/test")
        .env("DOCLOAD_CONNECT_TIMEOUT_SECS", "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Connection failed"));
}

// ============================================================================
// Help Output Tests
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();

    docload(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("ping"));
}

#[test]
fn test_load_help_documents_tunables() {
    let dir = tempfile::tempdir().unwrap();

    docload(dir.path())
        .arg("load")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--batch-size"))
        .stdout(predicate::str::contains("--max-retries"))
        .stdout(predicate::str::contains("--reuse-artifacts"));
}
