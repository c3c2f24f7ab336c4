use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn a_nonexistent_source_path_exits_with_the_usage_code() {
    let mut cmd = Command::cargo_bin("caps").unwrap();
    cmd.arg("/nonexistent/does-not-exist.caps")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("I/O error"));
}
