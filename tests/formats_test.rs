//! Integration tests for `treecompose formats` and the top-level CLI

mod common;

use common::TestProject;
use serde_json::Value;

#[test]
fn test_formats_lists_support() {
    let project = TestProject::new();

    let output = project.run(&["formats"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✓ raw"));
    assert!(stdout.contains("✓ qcow2"));
    assert!(stdout.contains("vmdk (not implemented)"));
    assert!(stdout.contains("xz"));
}

#[test]
fn test_formats_json() {
    let project = TestProject::new();

    let output = project.run(&["--json", "formats"]);
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let supported: Vec<&str> = report["formats"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["supported"] == true)
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(supported, vec!["raw", "qcow2"]);
    assert_eq!(report["compression"], serde_json::json!(["xz"]));
}

#[test]
fn test_no_subcommand_prints_help() {
    let project = TestProject::new();

    let output = project.run(&[]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}

#[test]
fn test_version_flag() {
    let project = TestProject::new();

    let output = project.run(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("treecompose"));
}
