use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper function to create a temporary directory for CLI tests
fn create_cli_test_environment() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Helper function to create a Command with --no-color and a clean environment
fn pw_cmd() -> Command {
    let mut cmd = Command::cargo_bin("pw").expect("Failed to find pw binary");
    cmd.env_remove("PLANWATCH_API_URL")
        .env_remove("PLANWATCH_API_KEY")
        .arg("--no-color");
    cmd
}

#[test]
fn test_cli_help_lists_commands() {
    pw_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("--api-url"));
}

#[test]
fn test_cli_watch_help_shows_polling_options() {
    pw_cmd()
        .args(["plan", "watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-attempts"))
        .stdout(predicate::str::contains("--interval-ms"))
        .stdout(predicate::str::contains("Ctrl-C"));
}

#[test]
fn test_cli_history_list_empty() {
    let temp_dir = create_cli_test_environment();
    let db_path = temp_dir.path().join("history.db");

    pw_cmd()
        .args([
            "--database-file",
            db_path.to_str().unwrap(),
            "history",
            "list",
            "--address",
            "0xabc",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No plan transactions found."));

    assert!(db_path.exists());
}

#[test]
fn test_cli_show_requires_api_url() {
    pw_cmd()
        .args(["plan", "show", "plan-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLANWATCH_API_URL"));
}

#[test]
fn test_cli_show_unreachable_service_fails() {
    pw_cmd()
        .args(["--api-url", "http://127.0.0.1:9", "plan", "show", "plan-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch plan plan-1"));
}

#[test]
fn test_cli_watch_rejects_unknown_chain_format() {
    pw_cmd()
        .args([
            "plan", "watch", "plan-1", "--step", "0", "--address", "0xabc", "--chain", "base",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid chain id"));
}
