use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("livetree")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("view"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_view_help_shows_overrides() {
    cargo_bin_cmd!("livetree")
        .args(["view", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--address-url"))
        .stdout(predicate::str::contains("--interval-ms"))
        .stdout(predicate::str::contains("--layout"))
        .stdout(predicate::str::contains("--collapsed"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("livetree")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("livetree"));
}

#[test]
fn test_invalid_layout_is_rejected() {
    cargo_bin_cmd!("livetree")
        .args(["view", "--layout", "diagonal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown layout"));
}

#[test]
fn test_viewer_requires_terminal() {
    let dir = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("livetree")
        .env("LIVETREE_HOME", dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a terminal"));
}
