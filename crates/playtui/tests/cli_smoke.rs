use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_displays_usage() {
    Command::cargo_bin("playtui")
        .expect("binary exists")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn missing_root_is_rejected() {
    Command::cargo_bin("playtui")
        .expect("binary exists")
        .arg("/definitely/not/a/real/workspace")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot resolve workspace root"));
}

#[test]
fn file_root_is_rejected() {
    let file = tempfile::NamedTempFile::new().expect("temp file");

    Command::cargo_bin("playtui")
        .expect("binary exists")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}
