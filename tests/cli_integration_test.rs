//! Integration tests for the command line interface.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

/// Command with its configuration isolated in `home`.
fn wildguard(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("wildguard"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("WILDGUARD_MODEL_PATH")
        .env_remove("WILDGUARD_LABELS_PATH")
        .env_remove("WILDGUARD_SINK");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    wildguard(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("camera"))
        .stdout(predicate::str::contains("identify"))
        .stdout(predicate::str::contains("tone"));
}

#[test]
fn test_no_command_prints_setup_guide() {
    let home = TempDir::new().unwrap();
    wildguard(&home)
        .assert()
        .success()
        .stdout(predicate::str::contains("wildguard config init"));
}

#[test]
fn test_species_table() {
    let home = TempDir::new().unwrap();
    wildguard(&home)
        .arg("species")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deer"))
        .stdout(predicate::str::contains("2-5 kHz"))
        .stdout(predicate::str::contains("3.5 kHz"))
        .stdout(predicate::str::contains("45-67 kHz"));
}

#[test]
fn test_tone_written_to_wav() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("deer.wav");

    wildguard(&home)
        .args(["tone", "deer", "--duration-ms", "500", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("3.5 kHz"));

    let reader = hound::WavReader::open(&out).unwrap();
    assert_eq!(reader.spec().sample_rate, 192_000);
    assert_eq!(reader.duration(), 96_000);
}

#[test]
fn test_tone_rejects_inverted_range() {
    let home = TempDir::new().unwrap();
    wildguard(&home)
        .args(["tone", "9-3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("9-3"));
}

#[test]
fn test_devices_lists_present_cameras() {
    let home = TempDir::new().unwrap();
    let frame = home.path().join("yard.jpg");
    std::fs::write(&frame, b"not decoded by enumeration").unwrap();

    wildguard(&home)
        .args(["devices", "--camera"])
        .arg(format!("yard={}", frame.display()))
        .arg("--camera")
        .arg(format!("porch={}", home.path().join("missing.jpg").display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("1. yard"))
        .stdout(predicate::str::contains("porch").not());
}

#[test]
fn test_camera_rejects_duplicate_camera_names() {
    let home = TempDir::new().unwrap();
    let first = home.path().join("a.jpg");
    let second = home.path().join("b.jpg");
    std::fs::write(&first, b"a").unwrap();
    std::fs::write(&second, b"b").unwrap();

    wildguard(&home)
        .args(["camera", "--camera"])
        .arg(format!("yard={}", first.display()))
        .arg("--camera")
        .arg(format!("yard={}", second.display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate camera name 'yard'"));
}

#[test]
fn test_identify_without_model_fails() {
    let home = TempDir::new().unwrap();
    let photo = home.path().join("photo.png");
    image::RgbImage::new(8, 8).save(&photo).unwrap();

    wildguard(&home)
        .arg("identify")
        .arg(&photo)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: "))
        .stderr(predicate::str::contains("no model configured"));
}

#[test]
fn test_identify_without_images_fails() {
    let home = TempDir::new().unwrap();

    wildguard(&home)
        .arg("identify")
        .arg(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid image files"));
}

#[test]
fn test_config_init_then_path() {
    let home = TempDir::new().unwrap();

    wildguard(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    wildguard(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    wildguard(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wildguard"));
}
