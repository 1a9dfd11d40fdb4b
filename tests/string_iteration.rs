use assert_cmd::Command;

const SRC_PATH: &str = "./demos/string_iteration.lox";

#[test]
fn for_loop_concatenates_each_byte() {
    Command::cargo_bin("loxide")
        .unwrap()
        .arg("run")
        .arg(SRC_PATH)
        .assert()
        .success()
        .stdout("a.b.c.\n");
}
