//! CLI end-to-end tests
//!
//! Tests for the lessonpack command-line interface. None of them need
//! ffmpeg or ffprobe to be installed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the lessonpack binary
#[allow(deprecated)]
fn lessonpack_cmd() -> Command {
    Command::cargo_bin("lessonpack").unwrap()
}

/// Write a corpus with a three-track course and an empty one.
fn write_corpus(root: &Path) {
    fs::write(root.join("list.txt"), "music\nsilence\n").unwrap();

    let music = root.join("courses/music");
    fs::create_dir_all(music.join("tracks")).unwrap();
    fs::write(music.join("list.txt"), "a.mp3\n\n  b.mp3  \nc.mp3\n").unwrap();
    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        fs::write(music.join("tracks").join(name), name).unwrap();
    }

    let silence = root.join("courses/silence");
    fs::create_dir_all(&silence).unwrap();
    fs::write(silence.join("list.txt"), "   \n").unwrap();
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = lessonpack_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = lessonpack_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lessonpack"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = lessonpack_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lessonpack"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = lessonpack_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = lessonpack_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_build_help() {
    let mut cmd = lessonpack_cmd();
    cmd.args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sharded output tree"))
        .stdout(predicate::str::contains("--clean"));
}

#[test]
fn test_cli_list_courses() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());

    let mut cmd = lessonpack_cmd();
    cmd.args(["list-courses", "--corpus"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Courses: 2"))
        .stdout(predicate::str::contains("music: 3 tracks"))
        .stdout(predicate::str::contains("course \"silence\" has no tracks"));
}

#[test]
fn test_cli_list_courses_json() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());

    let output = lessonpack_cmd()
        .args(["list-courses", "--json", "--corpus"])
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["id"], "music");
    assert_eq!(rows[0]["tracks"], 3);
    assert_eq!(rows[1]["id"], "silence");
    assert!(rows[1]["error"].is_string());
}

#[test]
fn test_cli_list_courses_missing_corpus() {
    let mut cmd = lessonpack_cmd();
    cmd.args(["list-courses", "--corpus", "/nonexistent/corpus-xyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_cli_remux_lesson_out_of_bounds() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());

    let mut cmd = lessonpack_cmd();
    cmd.args(["remux-lesson", "music", "3", "--corpus"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "lesson index 3 out of bounds for course \"music\" (3 tracks)",
        ));
}

#[test]
fn test_cli_low_quality_lesson_negative_index() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());

    let mut cmd = lessonpack_cmd();
    cmd.args(["low-quality-lesson", "music", "-1", "--corpus"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("lesson index -1 out of bounds"));
}

#[test]
fn test_cli_remux_lesson_empty_course() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());

    let mut cmd = lessonpack_cmd();
    cmd.args(["remux-lesson", "silence", "0", "--corpus"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no tracks"));
}

#[test]
fn test_cli_build_refuses_non_empty_output() {
    let temp = tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_corpus(&corpus);

    let output = temp.path().join("output");
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("stale.txt"), "old build").unwrap();

    let mut cmd = lessonpack_cmd();
    cmd.arg("build")
        .arg("--corpus")
        .arg(&corpus)
        .arg("--output")
        .arg(&output)
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not empty"));

    assert!(output.join("stale.txt").exists());
}

#[test]
fn test_cli_build_rejects_cache_inside_output() {
    let temp = tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_corpus(&corpus);

    let output = temp.path().join("output");
    let cache = output.join("cache");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("cache-entry"), "cached").unwrap();

    let mut cmd = lessonpack_cmd();
    cmd.arg("build")
        .arg("--clean")
        .arg("--corpus")
        .arg(&corpus)
        .arg("--output")
        .arg(&output)
        .arg("--cache-dir")
        .arg(&cache)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is inside output.dir"));

    assert!(cache.join("cache-entry").exists());
}

#[test]
fn test_cli_build_missing_corpus() {
    let temp = tempdir().unwrap();

    let mut cmd = lessonpack_cmd();
    cmd.args(["build", "--corpus", "/nonexistent/corpus-xyz", "--output"])
        .arg(temp.path().join("output"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_cli_validate_config_file() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("lessonpack.json");
    fs::write(
        &config_file,
        r#"{
            "corpus": {"root": "/data/core"},
            "pipeline": {"concurrency": 4, "on_course_failure": "abort"},
            "manifest": {"build_version": 3, "cas_base_url": "https://cdn.example.com/"}
        }"#,
    )
    .unwrap();

    let mut cmd = lessonpack_cmd();
    cmd.arg("validate")
        .arg(&config_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Concurrency: 4"))
        .stdout(predicate::str::contains("On course failure: abort"))
        .stdout(predicate::str::contains("Warnings").not());
}

#[test]
fn test_cli_validate_reports_warnings() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("lessonpack.json");
    fs::write(&config_file, "{}").unwrap();

    let mut cmd = lessonpack_cmd();
    cmd.arg("validate")
        .arg(&config_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("cas_base_url"));
}

#[test]
fn test_cli_validate_invalid_json() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("broken.json");
    fs::write(&config_file, "{ not json").unwrap();

    let mut cmd = lessonpack_cmd();
    cmd.arg("validate")
        .arg(&config_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config parse error"));
}

#[test]
fn test_cli_validate_missing_file() {
    let mut cmd = lessonpack_cmd();
    cmd.args(["validate", "/nonexistent/lessonpack.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
