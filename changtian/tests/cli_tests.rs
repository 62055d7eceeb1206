//! CLI integration tests

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const ENTRY: &str = "<startl><comment>长天</comment><position>Char↑</position><constant>常驻</constant><content>正文</content><endl>";

fn changtian(project: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("changtian").unwrap();
    cmd.arg("--project").arg(project);
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("changtian")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("spec"))
        .stdout(predicate::str::contains("env"));
}

#[test]
fn test_example_is_convertible() {
    let tmp = tempfile::tempdir().unwrap();
    let out = changtian(tmp.path()).arg("example").output().unwrap();
    assert!(out.status.success());

    changtian(tmp.path())
        .args(["convert", "-"])
        .write_stdin(out.stdout)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"generator\": \"长天快速世界书\""))
        .stdout(predicate::str::contains("认知权限总纲"));
}

#[test]
fn test_convert_file_to_output() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("book.txt"), format!("{ENTRY}\n{ENTRY}")).unwrap();

    changtian(tmp.path())
        .args(["convert", "book.txt", "-o", "book.json", "--compact"])
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("book.json")).unwrap()).unwrap();
    let format = &json["tavo_format"];
    assert_eq!(format["statistics"]["total_entries"], 2);
    assert_eq!(format["statistics"]["entry_types"]["常驻"], 2);
    assert_eq!(format["entries"][1]["id"], 2);
}

#[test]
fn test_convert_without_entries_fails() {
    let tmp = tempfile::tempdir().unwrap();
    changtian(tmp.path())
        .arg("convert")
        .write_stdin("just some text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("未找到有效的XML条目"));
}

#[test]
fn test_spec_check() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("buildozer.spec"),
        "[app]\ntitle = Demo\npackage.name = demo\npackage.domain = org.test\nsource.main = main.py\n",
    )
    .unwrap();
    fs::write(tmp.path().join("bad.spec"), "[app]\nandroid.api = -3\n").unwrap();

    changtian(tmp.path()).args(["spec", "check"]).assert().success();
    changtian(tmp.path())
        .args(["spec", "check", "bad.spec"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("error: [app] title"));
}

#[test]
fn test_spec_check_reports_parse_error_line() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("buildozer.spec"), "title = Demo\n").unwrap();
    changtian(tmp.path())
        .args(["spec", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
}

#[test]
fn test_spec_set_then_get() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("buildozer.spec"),
        "[app]\n# keep me\ntitle = Demo\n",
    )
    .unwrap();

    changtian(tmp.path())
        .args(["spec", "set", "app", "android.api", "33"])
        .assert()
        .success();
    changtian(tmp.path())
        .args(["spec", "get", "app", "android.api"])
        .assert()
        .success()
        .stdout("33\n");

    let text = fs::read_to_string(tmp.path().join("buildozer.spec")).unwrap();
    assert!(text.contains("# keep me"));
}

#[test]
fn test_spec_show_json() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("buildozer.spec"),
        "[app]\nandroid.archs = arm64-v8a\n",
    )
    .unwrap();
    changtian(tmp.path())
        .args(["spec", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"arm64-v8a\""));
}

#[test]
fn test_config_schema() {
    let tmp = tempfile::tempdir().unwrap();
    changtian(tmp.path())
        .args(["config", "schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("command_timeout_secs"));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join(".changtian.toml"), "apk_dirs = 3\n").unwrap();
    changtian(tmp.path())
        .args(["spec", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config file"));
}

#[test]
fn test_check_result_without_apk() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("build.log"),
        "Aidl not found\nBUILD FAILED\n",
    )
    .unwrap();
    changtian(tmp.path())
        .args(["env", "check-result"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no APK found"))
        .stdout(predicate::str::contains("Aidl not found"))
        .stdout(predicate::str::contains("BUILD FAILED"));
}

#[test]
fn test_check_result_collects_apk() {
    let tmp = tempfile::tempdir().unwrap();
    let dists = tmp.path().join(".buildozer/android/platform/build/dists/demo");
    fs::create_dir_all(&dists).unwrap();
    fs::write(dists.join("demo-debug.apk"), vec![0u8; 1024]).unwrap();

    changtian(tmp.path())
        .args(["env", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo-debug.apk"))
        .stdout(predicate::str::contains("MiB"));
    assert!(tmp.path().join("bin/demo-debug.apk").is_file());
}

#[test]
fn test_setup_fails_without_sdk() {
    let tmp = tempfile::tempdir().unwrap();
    changtian(tmp.path())
        .env("ANDROID_HOME", tmp.path().join("no-sdk"))
        .args(["env", "setup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_check_result_without_log() {
    let tmp = tempfile::tempdir().unwrap();
    changtian(tmp.path())
        .args(["env", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no APK found"))
        .stdout(predicate::str::contains("No build log at"));
}
