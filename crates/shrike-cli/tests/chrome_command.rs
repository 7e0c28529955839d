use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn chrome_reports_missing_binary() {
    Command::cargo_bin("shrike")
        .unwrap()
        .args(["chrome", "--chrome-path", "/nonexistent/chrome"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Chrome not found"));
}
