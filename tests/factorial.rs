use assert_cmd::Command;

const SRC_PATH: &str = "./demos/factorial.lox";

#[test]
fn recursive_factorial() {
    Command::cargo_bin("loxide")
        .unwrap()
        .arg("run")
        .arg(SRC_PATH)
        .assert()
        .success()
        .stdout("120\n");
}
