use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

/// Command with a hermetic environment: config and state live under the
/// given directory and any ambient credentials are stripped.
fn postgram_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("postgram");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env_remove("POSTGRAM_API__ACCESS_TOKEN")
        .env_remove("POSTGRAM_API__USER_ID");
    cmd
}

#[test]
fn test_version() {
    let mut cmd = cargo_bin_cmd!("postgram");
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("postgram"));
}

#[test]
fn test_help_contains_all_commands() {
    let mut cmd = cargo_bin_cmd!("postgram");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("post"))
        .stdout(predicate::str::contains("pending"))
        .stdout(predicate::str::contains("resume"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("auth"));
}

#[test]
fn test_no_args_shows_help() {
    let mut cmd = cargo_bin_cmd!("postgram");
    cmd.assert().failure().code(predicate::eq(2));
}

#[test]
fn test_invalid_command() {
    let mut cmd = cargo_bin_cmd!("postgram");
    cmd.arg("invalidcmd")
        .assert()
        .failure()
        .code(predicate::eq(2));
}

#[test]
fn test_invalid_output_format() {
    let dir = tempfile::tempdir().unwrap();
    postgram_cmd(dir.path())
        .arg("stats")
        .arg("--output")
        .arg("xml")
        .assert()
        .failure()
        .code(predicate::eq(2))
        .stderr(predicate::str::contains("invalid").or(predicate::str::contains("format")));
}

#[test]
fn test_stats_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("api_state.json");

    let output = postgram_cmd(dir.path())
        .arg("stats")
        .arg("--state-file")
        .arg(&state_file)
        .arg("--output")
        .arg("json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("stats --output json should produce valid JSON");
    assert_eq!(parsed["stats"]["successful_posts"], 0);
    assert_eq!(parsed["pending_posts"], 0);
}

#[test]
fn test_stats_text_output() {
    let dir = tempfile::tempdir().unwrap();
    postgram_cmd(dir.path())
        .arg("stats")
        .arg("--state-file")
        .arg(dir.path().join("api_state.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Publish statistics"))
        .stdout(predicate::str::contains("State file"));
}

#[test]
fn test_pending_json_output_empty() {
    let dir = tempfile::tempdir().unwrap();

    let output = postgram_cmd(dir.path())
        .arg("pending")
        .arg("--state-file")
        .arg(dir.path().join("api_state.json"))
        .arg("--output")
        .arg("json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("pending --output json should produce valid JSON");
    assert!(parsed.is_array(), "pending JSON output should be an array");
}

#[test]
fn test_pending_text_output_empty() {
    let dir = tempfile::tempdir().unwrap();
    postgram_cmd(dir.path())
        .arg("pending")
        .arg("--state-file")
        .arg(dir.path().join("api_state.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending posts"));
}

#[test]
fn test_quiet_flag_suppresses_output() {
    let dir = tempfile::tempdir().unwrap();
    postgram_cmd(dir.path())
        .arg("pending")
        .arg("--state-file")
        .arg(dir.path().join("api_state.json"))
        .arg("--quiet")
        .assert()
        .success();
}

#[test]
fn test_post_without_credentials_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    postgram_cmd(dir.path())
        .arg("post")
        .arg("https://example.com/photo.jpg")
        .arg("--state-file")
        .arg(dir.path().join("api_state.json"))
        .assert()
        .failure()
        .code(predicate::eq(1))
        .stderr(predicate::str::contains("access_token"));
}

#[test]
fn test_auth_without_credentials_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    postgram_cmd(dir.path())
        .arg("auth")
        .assert()
        .failure()
        .code(predicate::eq(1))
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_resume_without_credentials_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    postgram_cmd(dir.path())
        .arg("resume")
        .arg("--state-file")
        .arg(dir.path().join("api_state.json"))
        .assert()
        .failure()
        .code(predicate::eq(1))
        .stderr(predicate::str::contains("Configuration error"));
}
