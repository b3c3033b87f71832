//! Smoke tests for the CLI surface.

use assert_cmd::Command;
use predicates::prelude::*;

/// Test: --help names every subcommand.
#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("drivechat")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("whoami"))
        .stdout(predicate::str::contains("folders"));
}

/// Test: --version prints the crate version.
#[test]
fn test_version() {
    Command::cargo_bin("drivechat")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
