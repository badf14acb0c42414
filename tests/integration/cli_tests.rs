//! CLI integration tests
//!
//! These tests verify that the CLI works correctly with various options.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn resmerge(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("resmerge").expect("Binary should be built");
    cmd.current_dir(cwd);
    cmd
}

fn touch(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    resmerge(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("strings"))
        .stdout(predicate::str::contains("copy"))
        .stdout(predicate::str::contains("all"));
}

#[test]
fn test_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    resmerge(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("resmerge"));
}

#[test]
fn test_cli_print_default_config() {
    let temp_dir = TempDir::new().unwrap();
    resmerge(temp_dir.path())
        .arg("print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("missing_key: fail"))
        .stdout(predicate::str::contains("sponsorblock/layout"))
        .stdout(predicate::str::contains("revanced_sb_skip_sponsor_button.xml"));
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn test_cli_strings() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("generated");

    resmerge(temp_dir.path())
        .args(["--quiet", "strings", "--input"])
        .arg(fixtures_path().join("addresources"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let strings = fs::read_to_string(output.join("values/strings.xml")).unwrap();
    assert!(strings.contains(r#"<string name="revanced_reset">Reset</string>"#));
    assert!(!strings.contains("Reset to default"));
    assert!(output.join("values-de/strings.xml").exists());
    assert!(output.join("values/arrays.xml").exists());
}

#[test]
fn test_cli_copy_with_config_and_report() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("resources");
    let output = temp_dir.path().join("generated");
    let report = temp_dir.path().join("report.json");
    touch(&input.join("settings/layout/keep.xml"), "<keep/>");
    touch(&input.join("settings/layout/skip.xml"), "<skip/>");
    touch(&output.join("stale.png"), "stale");
    touch(
        &temp_dir.path().join("resmerge.yml"),
        "resources:\n  copy:\n    - source: settings/layout\n      exclude: [skip.xml]\n",
    );

    resmerge(temp_dir.path())
        .args(["--quiet", "copy", "--input", "resources", "--output", "generated", "--report"])
        .arg(&report)
        .assert()
        .success();

    assert!(output.join("layout/keep.xml").exists());
    assert!(!output.join("layout/skip.xml").exists());
    assert!(!output.join("stale.png").exists());

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["resources"]["copied"], 1);
    assert_eq!(value["resources"]["excluded"], 1);
}

#[test]
fn test_cli_all() {
    let temp_dir = TempDir::new().unwrap();
    let resources = temp_dir.path().join("resources");
    touch(&resources.join("settings/menu/menu.xml"), "<menu/>");

    resmerge(temp_dir.path())
        .arg("all")
        .arg("--strings-input")
        .arg(fixtures_path().join("addresources"))
        .args(["--strings-output", "gen/strings"])
        .args(["--resources-input", "resources"])
        .args(["--resources-output", "gen/res"])
        .args(["--parallel", "--atomic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("String tables"))
        .stdout(predicate::str::contains("Resources"));

    assert!(temp_dir.path().join("gen/strings/values-de/strings.xml").exists());
    assert!(temp_dir.path().join("gen/res/menu/menu.xml").exists());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_cli_malformed_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("in/values/strings.xml"), "<resources><app>");
    touch(
        &temp_dir.path().join("in/values/arrays.xml"),
        "<resources><app><patch/></app></resources>",
    );

    resmerge(temp_dir.path())
        .args(["strings", "--input", "in", "--output", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("strings.xml"));
}

#[test]
fn test_cli_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    touch(
        &temp_dir.path().join("bad.yml"),
        "resources:\n  copy:\n    - source: /absolute/drawable\n",
    );

    resmerge(temp_dir.path())
        .args(["--config", "bad.yml", "copy", "--input", "in", "--output", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("relative"));
}
