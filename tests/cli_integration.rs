//! CLI Integration Tests
//!
//! Tests the command-line interface end-to-end. Nothing here reaches the
//! network: every invocation fails or finishes before the first request.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the binary to test, isolated from the caller's env and config.
fn boardflow(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("boardflow").unwrap();
    cmd.env_clear()
        .current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

fn with_credentials(cmd: &mut Command) -> &mut Command {
    cmd.env("MIRO_ACCESS_TOKEN", "miro-token")
        .env("OPENAI_API_KEY", "openai-key")
        .env("TARGET_API_BASE_URL", "http://127.0.0.1:9/api/v1")
        .env("TARGET_API_ACCESS_TOKEN", "tp-token")
}

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    boardflow(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyze whiteboard workflows"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    boardflow(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_analyze_help() {
    let home = TempDir::new().unwrap();
    boardflow(&home)
        .args(["analyze", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROJECT_ID"))
        .stdout(predicate::str::contains("--workflow-name"));
}

// ============================================================================
// Fail-fast Configuration Tests
// ============================================================================

#[test]
fn test_analyze_requires_project_id() {
    let home = TempDir::new().unwrap();
    boardflow(&home).arg("analyze").assert().failure();
}

#[test]
fn test_analyze_without_credentials() {
    let home = TempDir::new().unwrap();
    boardflow(&home)
        .args(["analyze", "42", "board-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("MIRO_ACCESS_TOKEN is not set"));
}

#[test]
fn test_analyze_missing_ai_key() {
    let home = TempDir::new().unwrap();
    boardflow(&home)
        .env("MIRO_ACCESS_TOKEN", "miro-token")
        .args(["analyze", "42", "board-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("OPENAI_API_KEY is not set"));
}

#[test]
fn test_analyze_invalid_project_id() {
    let home = TempDir::new().unwrap();
    let mut cmd = boardflow(&home);
    with_credentials(&mut cmd)
        .args(["analyze", "not-a-number", "board-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid project ID 'not-a-number'"));
}

#[test]
fn test_analyze_without_board_id() {
    let home = TempDir::new().unwrap();
    let mut cmd = boardflow(&home);
    with_credentials(&mut cmd)
        .env("PROJECT_ID", "42")
        .arg("analyze")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No board ID given"));
}

#[test]
fn test_gemini_provider_needs_gemini_key() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".boardflow.toml"), "[ai]\nprovider = \"gemini\"\n").unwrap();

    let mut cmd = boardflow(&home);
    with_credentials(&mut cmd)
        .args(["list", "42"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GEMINI_API_KEY is not set"));
}

#[test]
fn test_invalid_config_file() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".boardflow.toml"), "[server\nport = ").unwrap();

    boardflow(&home)
        .arg("config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse"));
}

// ============================================================================
// Config & Completions Tests
// ============================================================================

#[test]
fn test_config_shows_defaults() {
    let home = TempDir::new().unwrap();
    boardflow(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[board]"))
        .stdout(predicate::str::contains("https://api.miro.com/v2"))
        .stdout(predicate::str::contains("port = 3000"));
}

#[test]
fn test_config_port_override() {
    let home = TempDir::new().unwrap();
    boardflow(&home)
        .env("PORT", "4100")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 4100"));
}

#[test]
fn test_config_path_prefers_local_file() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".boardflow.toml"), "[output]\ndir = \"runs\"\n").unwrap();

    boardflow(&home)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".boardflow.toml"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    boardflow(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("boardflow"));
}

#[test]
fn test_unknown_subcommand() {
    let home = TempDir::new().unwrap();
    boardflow(&home).arg("frobnicate").assert().failure();
}
