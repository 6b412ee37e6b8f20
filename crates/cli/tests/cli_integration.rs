//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `dairyops` binary and verify exit codes,
//! stdout content, and stderr content. Every test runs in a fresh temporary
//! directory with the dairyops environment variables cleared, so no local
//! `dairyops.toml` or shell setting leaks in.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A port nothing listens on.
const UNREACHABLE: &str = "http://127.0.0.1:9";

fn dairyops(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("dairyops");
    cmd.current_dir(dir.path())
        .env_remove("DAIRYOPS_API_URL")
        .env_remove("DAIRYOPS_TOKEN")
        .env_remove("DAIRYOPS_ROLE")
        .env_remove("DAIRYOPS_LOG");
    cmd
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("dairyops.toml");
    fs::write(&path, body).expect("write config");
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dairy farm operations records"));
}

#[test]
fn version_exits_0() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dairyops"));
}

#[test]
fn list_help_mentions_filters() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .args(["list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--search"))
        .stdout(predicate::str::contains("--facet"));
}

// ──────────────────────────────────────────────
// 2. Password check
// ──────────────────────────────────────────────

#[test]
fn strong_password_passes() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .args(["password", "check", "Abc123!@"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (4/4)"));
}

#[test]
fn weak_password_lists_missing_rules_in_order() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .args(["password", "check", "abc12345"])
        .assert()
        .failure()
        .code(1)
        .stdout(
            predicate::str::is_match("One uppercase letter[\\s\\S]*One special character")
                .unwrap(),
        )
        .stdout(predicate::str::contains("At least 8 characters").not());
}

#[test]
fn password_check_json() {
    let dir = TempDir::new().unwrap();
    let out = dairyops(&dir)
        .args(["--output", "json", "password", "check", "short"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["violations"][0], "At least 8 characters");
    assert_eq!(json["strength"], 0);
}

// ──────────────────────────────────────────────
// 3. Configuration and session errors
// ──────────────────────────────────────────────

#[test]
fn list_without_token_is_an_authentication_error() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .args(["list", "feed-stock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("authentication required"));
}

#[test]
fn json_errors_are_objects() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .args(["--output", "json", "summary", "milk-yield"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}

#[test]
fn quiet_suppresses_error_text() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .env("DAIRYOPS_LOG", "off")
        .args(["--quiet", "list", "attendance"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

#[test]
fn unreachable_backend_is_a_network_error() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .env("DAIRYOPS_API_URL", UNREACHABLE)
        .env("DAIRYOPS_TOKEN", "t-123")
        .args(["list", "purchase-request"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network error"));
}

#[test]
fn config_file_supplies_url_and_token() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &format!("[api]\nbase_url = \"{}\"\ntoken = \"from-file\"\n", UNREACHABLE),
    );
    dairyops(&dir)
        .arg("--config")
        .arg(&path)
        .args(["list", "feed-stock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network error"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .args(["--config", "nope.toml", "list", "feed-stock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read 'nope.toml'"));
}

#[test]
fn unknown_kind_is_rejected_by_argument_parsing() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .args(["list", "goat-cheese"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown record kind"));
}

#[test]
fn bad_date_is_rejected() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .args(["list", "feed-stock", "--from", "01/02/2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

// ──────────────────────────────────────────────
// 4. Account creation
// ──────────────────────────────────────────────

#[test]
fn supervisor_cannot_create_accounts() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .env("DAIRYOPS_TOKEN", "t-123")
        .env("DAIRYOPS_API_URL", UNREACHABLE)
        .args([
            "create-account",
            "--username",
            "milker",
            "--password",
            "Abc123!@",
            "--confirm-password",
            "Abc123!@",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not permitted"));
}

#[test]
fn mismatched_confirmation_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .env("DAIRYOPS_ROLE", "admin")
        .env("DAIRYOPS_TOKEN", "t-123")
        .env("DAIRYOPS_API_URL", UNREACHABLE)
        .args([
            "create-account",
            "--username",
            "milker",
            "--password",
            "Abc123!@",
            "--confirm-password",
            "Abc123!#",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "confirm_password: Passwords do not match.",
        ));
}

#[test]
fn weak_new_password_lists_policy_messages() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .env("DAIRYOPS_ROLE", "admin")
        .args([
            "create-account",
            "--username",
            "milker",
            "--password",
            "abc12345",
            "--confirm-password",
            "abc12345",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "password: One uppercase letter One special character",
        ));
}

#[test]
fn quiet_silences_account_field_errors_in_json() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .env("DAIRYOPS_LOG", "off")
        .env("DAIRYOPS_ROLE", "admin")
        .env("DAIRYOPS_TOKEN", "t-123")
        .env("DAIRYOPS_API_URL", UNREACHABLE)
        .args([
            "--quiet",
            "--output",
            "json",
            "create-account",
            "--username",
            "milker",
            "--password",
            "Abc123!@",
            "--confirm-password",
            "Abc123!#",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

#[test]
fn account_field_errors_in_json_carry_fields() {
    let dir = TempDir::new().unwrap();
    dairyops(&dir)
        .env("DAIRYOPS_LOG", "off")
        .env("DAIRYOPS_ROLE", "admin")
        .env("DAIRYOPS_TOKEN", "t-123")
        .env("DAIRYOPS_API_URL", UNREACHABLE)
        .args([
            "--output",
            "json",
            "create-account",
            "--username",
            "milker",
            "--password",
            "Abc123!@",
            "--confirm-password",
            "Abc123!#",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"confirm_password\""));
}
