// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binary behaviour; rendering tests skip themselves without OpenSCAD

use scadlabel::OpenScad;
use std::process::Command;
use tempfile::TempDir;

fn scadlabel() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scadlabel"));
    // keep a developer's config and environment out of the way
    cmd.env_remove("OPENSCAD_PATH")
        .env_remove("SCADLABEL_OUTPUT_DIR")
        .env_remove("SCADLABEL_JOBS")
        .env("NO_COLOR", "1");
    cmd
}

fn openscad_available() -> bool {
    OpenScad::new("openscad", None)
        .and_then(|engine| engine.version())
        .is_ok()
}

#[test]
fn test_no_input_shows_help() {
    let tmp = TempDir::new().unwrap();
    let output = scadlabel().current_dir(tmp.path()).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "help missing: {}", stderr);
    assert!(stderr.contains("--csv"));
}

#[test]
fn test_text_and_csv_conflict() {
    let tmp = TempDir::new().unwrap();
    let output = scadlabel()
        .current_dir(tmp.path())
        .args(["DOCK", "--csv", "labels.csv"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be used with"), "unexpected error: {}", stderr);
}

#[test]
fn test_bad_diameter_rejected() {
    let tmp = TempDir::new().unwrap();
    let output = scadlabel()
        .current_dir(tmp.path())
        .args(["DOCK", "--diameter=-2"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid cable diameter"), "unexpected error: {}", stderr);
    assert!(!tmp.path().join("DOCK--2.stl").exists());
}

#[test]
fn test_missing_openscad_fails() {
    let tmp = TempDir::new().unwrap();
    let output = scadlabel()
        .current_dir(tmp.path())
        .args(["DOCK", "--openscad", "/nonexistent/openscad"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OpenSCAD"), "unexpected stderr: {}", stderr);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_render_with_openscad() {
    if !openscad_available() {
        println!("OpenSCAD not found, skipping");
        return;
    }

    let tmp = TempDir::new().unwrap();
    let output = scadlabel()
        .current_dir(tmp.path())
        .args(["SCREEN", "-d", "6.5", "-f", "Liberation Sans", "-o", "out"])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(tmp.path().join("out/SCREEN-6.5.stl").is_file());
}
