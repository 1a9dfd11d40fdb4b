use assert_cmd::Command;

const SRC_PATH: &str = "./demos/arithmetic.lox";

#[test]
fn run_prints_product() {
    Command::cargo_bin("loxide")
        .unwrap()
        .arg("run")
        .arg(SRC_PATH)
        .assert()
        .success()
        .stdout("10\n");
}
