use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_demo_run_prints_summary() {
    let mut cmd = Command::new(cargo_bin!("txflow"));
    cmd.args([
        "--workers",
        "4",
        "--count",
        "40",
        "--accounts",
        "5",
        "--base-delay-ms",
        "5",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"submitted\":40"))
        .stdout(predicate::str::contains("\"stored_states\":40"));
}

#[test]
fn test_rejects_zero_workers() {
    let mut cmd = Command::new(cargo_bin!("txflow"));
    cmd.args(["--workers", "0", "--count", "1"]);

    cmd.assert().failure();
}
