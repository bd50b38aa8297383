use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const TEXT: &str = "Hello, world or 你好，世界 or καλημ ́ρα κóσμ or こんにちはせかい\n";

fn cio() -> Command {
    Command::cargo_bin("cio").unwrap()
}

#[test]
fn test_no_args_prints_usage() {
    cio()
        .assert()
        .failure()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_convert_and_cat() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("greeting");
    let packed = dir.path().join("greeting.gz");
    fs::write(&plain, TEXT).unwrap();

    cio()
        .arg("-i")
        .arg(&plain)
        .arg("-o")
        .arg(&packed)
        .arg("convert")
        .assert()
        .success();

    let raw = fs::read(&packed).unwrap();
    assert_eq!(&raw[0..2], &[0x1f, 0x8b]);

    cio().arg("cat").arg(&packed).assert().success().stdout(TEXT);
}

#[test]
fn test_cat_stdin_with_format() {
    let dir = tempdir().unwrap();
    let packed = dir.path().join("x.gz");

    cio()
        .arg("-o")
        .arg(&packed)
        .arg("convert")
        .write_stdin(TEXT)
        .assert()
        .success();

    cio()
        .args(["-f.gz", "cat"])
        .write_stdin(fs::read(&packed).unwrap())
        .assert()
        .success()
        .stdout(TEXT);
}

#[test]
fn test_cat_compresses_output() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("greeting");
    let packed = dir.path().join("both.gz");
    fs::write(&plain, TEXT).unwrap();

    cio()
        .arg("-o")
        .arg(&packed)
        .arg("cat")
        .arg(&plain)
        .arg(&plain)
        .assert()
        .success();

    let raw = fs::read(&packed).unwrap();
    assert_eq!(&raw[0..2], &[0x1f, 0x8b]);
    cio()
        .arg("cat")
        .arg(&packed)
        .assert()
        .success()
        .stdout(TEXT.repeat(2));

    // -F applies to stdout as well.
    let out = cio()
        .args(["-F.gz", "cat"])
        .arg(&plain)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(&out.stdout[0..2], &[0x1f, 0x8b]);
}

#[test]
fn test_cat_missing_file() {
    cio()
        .args(["cat", "a_file_not_there.gz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("a_file_not_there.gz"));
}

#[test]
fn test_bzip2_output_unsupported() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bz2");

    cio()
        .arg("-o")
        .arg(&out)
        .arg("convert")
        .write_stdin(TEXT)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bzip2 compression not supported"));
}

#[test]
fn test_unknown_subcommand() {
    cio()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown subcommand"));
}
