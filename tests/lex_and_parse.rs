use assert_cmd::Command;
use predicates::prelude::*;

const SRC_PATH: &str = "./demos/arithmetic.lox";

#[test]
fn lex_prints_one_line_per_token() {
    Command::cargo_bin("loxide")
        .unwrap()
        .arg("lex")
        .arg(SRC_PATH)
        .assert()
        .success()
        .stdout(predicate::str::contains("Var").and(predicate::str::contains("Eof")));
}

#[test]
fn parse_prints_an_s_expression_dump() {
    Command::cargo_bin("loxide")
        .unwrap()
        .arg("parse")
        .arg(SRC_PATH)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("(program"));
}
