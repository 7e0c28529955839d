use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn completion_generates_bash_script() {
    Command::cargo_bin("shrike")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shrike"));
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("shrike")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("chrome"))
        .stdout(predicate::str::contains("completion"));
}
