use assert_cmd::Command;
use predicates::prelude::*;

/// A function referencing a not-yet-defined global resolves it dynamically
/// once later REPL input defines it — the global was never a local hop at
/// check time, so each fragment re-resolves it at call time.
#[test]
fn function_closes_over_a_later_defined_global() {
    let input = "fn f() { return x; }\nvar x = 42;\nprint(f());\n";
    Command::cargo_bin("loxide")
        .unwrap()
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("42"));
}
