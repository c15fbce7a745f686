// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! CLI tests for the procpipe binary

use assert_cmd::Command;
use predicates::prelude::*;

fn procpipe() -> Command {
    let mut cmd = Command::cargo_bin("procpipe").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_run_prints_each_line() {
    procpipe()
        .args(["run", "printf 'b\\na\\n' | sort"])
        .assert()
        .success()
        .stdout("a\nb\n");
}

#[test]
fn test_run_with_prefix() {
    procpipe()
        .args(["run", "--prefix", "> ", "echo hi"])
        .assert()
        .success()
        .stdout("> hi\n");
}

#[test]
fn test_run_with_env_override() {
    procpipe()
        .args(["run", "-e", "GREETING=hey", "echo $GREETING"])
        .assert()
        .success()
        .stdout("hey\n");
}

#[test]
fn test_run_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("only-file"), "").unwrap();

    procpipe()
        .arg("-C")
        .arg(dir.path())
        .args(["run", "ls"])
        .assert()
        .success()
        .stdout("only-file\n");
}

#[test]
fn test_run_from_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("pipe.yaml");
    std::fs::write(
        &config,
        "command: \"echo $WORD | tr a-z A-Z\"\nenv:\n  WORD: loud\ninherit_env: true\n",
    )
    .unwrap();

    procpipe()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout("LOUD\n");
}

#[test]
fn test_run_reports_terminal_exit() {
    procpipe()
        .args(["run", "echo x | false"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exited"));
}

#[test]
fn test_run_reports_missing_program() {
    procpipe()
        .args(["run", "echo x | /nonexistent/procpipe-missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to start"));
}

#[test]
fn test_run_reports_parse_error() {
    procpipe()
        .args(["run", "echo 'open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unterminated"));
}

#[test]
fn test_parse_json() {
    procpipe()
        .args(["parse", "--format", "json", "echo \"a b\" | wc -l"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"program\": \"wc\""))
        .stdout(predicate::str::contains("\"a b\""));
}

#[test]
fn test_parse_text() {
    procpipe()
        .args(["parse", "cat f | sort -u"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 stages"))
        .stdout(predicate::str::contains("sort"));
}
