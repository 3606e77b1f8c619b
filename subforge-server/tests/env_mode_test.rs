#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use predicates::str::contains;
use std::time::Duration;

/// Command with every `SUBFORGE_*` variable removed and a scratch working
/// directory, so a developer's `.env` cannot leak in.
fn subforge_cmd() -> Command {
    let mut cmd = Command::cargo_bin("subforge").unwrap();
    for var in [
        "SUBFORGE_ENV",
        "SUBFORGE_BIND_ADDR",
        "SUBFORGE_MONGO_URI",
        "SUBFORGE_DB_NAME",
        "SUBFORGE_STORAGE",
        "SUBFORGE_CORS_ORIGIN",
        "SUBFORGE_DB_MIN_POOL_SIZE",
        "SUBFORGE_DB_MAX_POOL_SIZE",
        "SUBFORGE_DB_CONNECT_TIMEOUT_MS",
        "SUBFORGE_DB_SOCKET_TIMEOUT_MS",
        "SUBFORGE_MAX_BODY_KB",
    ] {
        cmd.env_remove(var);
    }
    cmd.current_dir(std::env::temp_dir());
    cmd
}

#[test]
fn missing_mongo_uri_is_fatal() {
    subforge_cmd()
        .assert()
        .failure()
        .code(1)
        .stderr(contains("SUBFORGE_MONGO_URI is required"));
}

#[test]
fn unsupported_uri_scheme_is_fatal() {
    subforge_cmd()
        .env("SUBFORGE_MONGO_URI", "postgres://localhost:5432/app")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("mongodb://"));
}

#[test]
fn production_refuses_memory_storage() {
    subforge_cmd()
        .args(["--env", "production", "--storage", "memory"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("memory storage cannot be used in production"));
}

#[test]
fn unknown_environment_is_fatal() {
    subforge_cmd()
        .env("SUBFORGE_ENV", "staging")
        .env("SUBFORGE_STORAGE", "memory")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("SUBFORGE_ENV"));
}

#[test]
fn memory_storage_starts_and_logs_banner() {
    let output = subforge_cmd()
        .args(["--storage", "memory", "--bind-addr", "127.0.0.1:0"])
        .timeout(Duration::from_secs(3))
        .output()
        .expect("failed to run");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Subforge server running in development mode"),
        "expected startup banner, got: {}",
        stdout
    );
}
