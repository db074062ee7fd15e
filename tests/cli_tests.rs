use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Command with settings and state isolated under `home`
fn medialink(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("medialink").unwrap();
    cmd.env_remove("MEDIALINK_CONFIG")
        .env_remove("TMDB_API_KEY")
        .env_remove("PLEX_URL")
        .env_remove("PLEX_TOKEN")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(home.join("settings.json"))
        .arg("--state-dir")
        .arg(home.join("state"));
    cmd
}

struct Fixture {
    home: TempDir,
    source: TempDir,
    dest: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            home: tempdir().unwrap(),
            source: tempdir().unwrap(),
            dest: tempdir().unwrap(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = medialink(self.home.path());
        cmd.arg(self.source.path()).arg(self.dest.path()).arg("--auto");
        cmd
    }
}

#[test]
fn test_help_flag() {
    Command::cargo_bin("medialink")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("symlink media library"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("medialink")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_directories() {
    let home = tempdir().unwrap();

    medialink(home.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No source directory given"));
}

#[test]
fn test_missing_source_dir() {
    let fixture = Fixture::new();

    medialink(fixture.home.path())
        .arg(fixture.source.path().join("nope"))
        .arg(fixture.dest.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_source_is_file() {
    let fixture = Fixture::new();
    let file = fixture.source.path().join("file.mkv");
    std::fs::write(&file, "x").unwrap();

    medialink(fixture.home.path())
        .arg(&file)
        .arg(fixture.dest.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_invalid_settings_file() {
    let fixture = Fixture::new();
    std::fs::write(fixture.home.path().join("settings.json"), "not json").unwrap();

    fixture
        .command()
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Invalid settings file"));
}

#[test]
fn test_empty_source() {
    let fixture = Fixture::new();

    fixture
        .command()
        .assert()
        .success()
        .stdout(predicate::str::contains("No new links created"));
}

#[test]
fn test_destination_created() {
    let fixture = Fixture::new();
    let dest = fixture.dest.path().join("library");

    medialink(fixture.home.path())
        .arg(fixture.source.path())
        .arg(&dest)
        .arg("--auto")
        .assert()
        .success();

    assert!(dest.is_dir());
}

#[test]
fn test_non_video_is_ignore_listed() {
    let fixture = Fixture::new();
    std::fs::write(fixture.source.path().join("notes.txt"), "hello").unwrap();

    fixture.command().assert().success();

    let ignored =
        std::fs::read_to_string(fixture.home.path().join("state").join("ignored.json")).unwrap();
    assert!(ignored.contains("notes.txt"));

    // Second pass sees it as handled and leaves nothing new in the library
    fixture
        .command()
        .assert()
        .success()
        .stdout(predicate::str::contains("1 previously handled"));
    assert_eq!(std::fs::read_dir(fixture.dest.path()).unwrap().count(), 0);
}

#[test]
fn test_save_settings() {
    let fixture = Fixture::new();

    fixture.command().arg("--save-settings").assert().success();

    let saved =
        std::fs::read_to_string(fixture.home.path().join("settings.json")).unwrap();
    assert!(saved.contains("source_dir"));
    assert!(saved.contains("destination_dir"));

    // Saved directories are used when none are given
    medialink(fixture.home.path())
        .arg("--auto")
        .assert()
        .success();
}

#[test]
fn test_save_settings_leaves_out_environment() {
    let fixture = Fixture::new();

    fixture
        .command()
        .arg("--save-settings")
        .env("TMDB_API_KEY", "env-tmdb-secret")
        .env("PLEX_URL", "http://127.0.0.1:9")
        .env("PLEX_TOKEN", "env-plex-secret")
        .assert()
        .success();

    let saved =
        std::fs::read_to_string(fixture.home.path().join("settings.json")).unwrap();
    assert!(saved.contains("destination_dir"));
    assert!(!saved.contains("env-tmdb-secret"));
    assert!(!saved.contains("env-plex-secret"));
}

#[test]
fn test_verbose_flag() {
    let fixture = Fixture::new();

    fixture.command().arg("-vv").assert().success();
}
