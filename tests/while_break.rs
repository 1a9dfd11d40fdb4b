use assert_cmd::Command;

const SRC_PATH: &str = "./demos/while_break.lox";

#[test]
fn break_stops_the_loop_early() {
    Command::cargo_bin("loxide")
        .unwrap()
        .arg("run")
        .arg(SRC_PATH)
        .assert()
        .success()
        .stdout("3\n");
}
