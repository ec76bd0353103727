//! Integration tests for the `--migrate-db` flag.
//!
//! These tests spawn the service binary to verify exit behaviour and that a
//! migration-only run never needs GitHub or chat credentials. Startup
//! validation of the linked-account encryption password is covered too.

mod support;

use std::process::{Command, Output};

use rstest::rstest;

use support::create_temp_dir;

const SCHEMA_VERSION: &str = "20260110000200";

const SERVICE_ENV: [&str; 7] = [
    "INQUISITOR_DATABASE_URL",
    "INQUISITOR_ENCRYPTION_PASSWORD",
    "INQUISITOR_GITHUB_TOKEN",
    "INQUISITOR_DISCORD_TOKEN",
    "INQUISITOR_CHANNEL_ID",
    "INQUISITOR_ORGANIZATION",
    "GITHUB_TOKEN",
];

/// Returns the path to the built binary.
fn binary_path() -> std::path::PathBuf {
    let mut path = std::env::current_exe()
        .unwrap_or_else(|error| panic!("failed to get current exe path: {error}"));
    path.pop();
    path.pop();
    path.push("inquisitor");
    path
}

fn service_command() -> Command {
    let mut command = Command::new(binary_path());
    for key in SERVICE_ENV {
        command.env_remove(key);
    }
    command
}

fn run_migrate_db(database_url: Option<&str>, env: &[(&str, Option<&str>)]) -> Output {
    let mut command = service_command();
    command.arg("--migrate-db");
    if let Some(url) = database_url {
        command.args(["--database-url", url]);
    }
    for (key, value) in env {
        match value {
            Some(env_value) => {
                command.env(key, env_value);
            }
            None => {
                command.env_remove(key);
            }
        }
    }

    command
        .output()
        .unwrap_or_else(|error| panic!("failed to execute binary: {error}"))
}

fn assert_succeeds(output: &Output) {
    assert!(
        output.status.success(),
        "expected successful exit, got: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn migrate_db_succeeds_with_file_database() {
    let temp_dir = create_temp_dir();
    let db_path = temp_dir.path().join("inquisitor.sqlite");
    let db_url = db_path.to_string_lossy().to_string();

    assert_succeeds(&run_migrate_db(Some(&db_url), &[]));

    assert!(
        db_path.exists(),
        "database file should be created at {}",
        db_path.display()
    );
}

#[test]
fn migrate_db_needs_no_service_credentials() {
    let output = run_migrate_db(Some(":memory:"), &[]);

    assert_succeeds(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("is required"),
        "no credential should be demanded, got: {stderr}"
    );
}

#[test]
fn migrate_db_logs_schema_version() {
    let output = run_migrate_db(Some(":memory:"), &[]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("schema version recorded") && stderr.contains(SCHEMA_VERSION),
        "expected schema telemetry on stderr, got: {stderr}"
    );
}

#[rstest]
#[case::missing(None, &[], "database_url is required")]
#[case::blank_cli(Some("   "), &[], "database URL must not be blank")]
#[case::blank_env(None, &[("INQUISITOR_DATABASE_URL", Some("   "))], "database URL must not be blank")]
fn migrate_db_rejects_unusable_database_url(
    #[case] database_url: Option<&str>,
    #[case] env: &[(&str, Option<&str>)],
    #[case] expected_stderr: &str,
) {
    let output = run_migrate_db(database_url, env);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains(expected_stderr),
        "expected stderr to contain {expected_stderr:?}, got: {stderr}"
    );
}

#[test]
fn cli_database_url_overrides_environment() {
    let output = run_migrate_db(Some(":memory:"), &[("INQUISITOR_DATABASE_URL", Some("   "))]);

    assert_succeeds(&output);
}

#[test]
fn migrate_db_is_idempotent() {
    let temp_dir = create_temp_dir();
    let db_url = temp_dir
        .path()
        .join("inquisitor.sqlite")
        .to_string_lossy()
        .to_string();

    let first = run_migrate_db(Some(&db_url), &[]);
    let second = run_migrate_db(Some(&db_url), &[]);

    assert_succeeds(&first);
    assert_succeeds(&second);
    assert!(String::from_utf8_lossy(&second.stderr).contains(SCHEMA_VERSION));
}

#[test]
fn blank_encryption_password_stops_startup() {
    let output = service_command()
        .args(["--database-url", ":memory:"])
        .env("INQUISITOR_ENCRYPTION_PASSWORD", "   ")
        .output()
        .unwrap_or_else(|error| panic!("failed to execute binary: {error}"));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("encryption password must not be blank"),
        "expected the linked-account store to reject the password, got: {stderr}"
    );
}

#[test]
fn migrate_only_run_ignores_encryption_password() {
    let output = run_migrate_db(
        Some(":memory:"),
        &[("INQUISITOR_ENCRYPTION_PASSWORD", Some("   "))],
    );

    assert_succeeds(&output);
}
