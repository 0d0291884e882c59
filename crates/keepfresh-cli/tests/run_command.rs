use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_keepfresh_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("keepfresh")
}

fn run_cmd() -> Command {
    let mut cmd = Command::new(get_keepfresh_bin());
    // Credentials from the developer's shell must not leak into tests
    for var in [
        "KEEPFRESH_USERNAME",
        "KEEPFRESH_PASSWORD",
        "KEEPFRESH_MOBILE",
        "KEEPFRESH_LOGIN_URL",
        "KEEPFRESH_PROFILE_URL",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_run_command_help() {
    let mut cmd = run_cmd();
    cmd.arg("run").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--action"))
        .stdout(predicate::str::contains("--resume"))
        .stdout(predicate::str::contains("--fail-on-error"))
        .stdout(predicate::str::contains("--artifacts-dir"))
        .stdout(predicate::str::contains("--headed"));
}

#[test]
fn test_run_refuses_to_start_without_credentials() {
    let mut cmd = run_cmd();
    cmd.arg("run");

    // Validation aborts before any browser launch
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("configuration incomplete"));
}

#[test]
fn test_run_reports_which_field_is_missing() {
    let mut cmd = run_cmd();
    cmd.arg("run")
        .arg("--username")
        .arg("someone@example.com")
        .arg("--password")
        .arg("secret");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("login_url"));
}

#[test]
fn test_run_rejects_malformed_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{ not json").unwrap();

    let mut cmd = run_cmd();
    cmd.arg("run").arg("--config").arg(&config);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("could not load config"));
}
