use assert_cmd::Command;
use predicates::prelude::*;

const SRC_PATH: &str = "./demos/type_error.lox";

#[test]
fn adding_string_to_number_is_a_runtime_error() {
    Command::cargo_bin("loxide")
        .unwrap()
        .arg("--ui-testing")
        .arg("run")
        .arg(SRC_PATH)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("cannot add 'String' to 'Number'"));
}
