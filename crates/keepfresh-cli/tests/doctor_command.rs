use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_keepfresh_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("keepfresh")
}

#[test]
fn test_doctor_command_help() {
    let mut cmd = Command::new(get_keepfresh_bin());
    cmd.arg("doctor").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--chrome-path"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_doctor_fails_for_missing_chrome_path() {
    let mut cmd = Command::new(get_keepfresh_bin());
    cmd.arg("doctor").arg("--chrome-path").arg("/nonexistent/chrome");

    // A configured path is authoritative, so this fails even on hosts
    // with Chrome installed elsewhere.
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
