//! CLI integration tests
//!
//! These tests run the deadexport binary against small Go modules.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// `pkg/a` exports Foo, B, StructA and NewFoo; `pkg/c` calls only `a.Foo()`
fn module() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "go.mod", "module example.com/mod\n\ngo 1.21\n");
    write(
        root,
        "pkg/a/a.go",
        "package a\n\nfunc Foo() {}\n\nvar B = 1\n\ntype StructA struct{}\n\n\
         func (s *StructA) MethodA() {}\n\nfunc NewFoo() *StructA { return &StructA{} }\n",
    );
    write(
        root,
        "pkg/c/c.go",
        "package c\n\nimport \"example.com/mod/pkg/a\"\n\nfunc Run() { a.Foo() }\n",
    );
    temp
}

fn deadexport() -> Command {
    Command::cargo_bin("deadexport").unwrap()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    deadexport()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--input"))
        .stdout(predicate::str::contains("--external"));
}

#[test]
fn test_cli_version() {
    deadexport()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deadexport"));
}

#[test]
fn test_missing_input_prints_usage() {
    let temp = module();
    deadexport()
        .arg("-C")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ============================================================================
// Analysis
// ============================================================================

#[test]
fn test_reports_unused_exports() {
    let temp = module();
    deadexport()
        .arg("-C")
        .arg(temp.path())
        .args(["-q", "-i", "./pkg/a", "-e", "./pkg/c"])
        .assert()
        .success()
        .stdout("pkg/a\n    B\n    NewFoo\n    StructA\n");
}

#[test]
fn test_show_kind() {
    let temp = module();
    deadexport()
        .arg("-C")
        .arg(temp.path())
        .args(["-q", "--show-kind", "-i", "./pkg/a", "-e", "./pkg/c"])
        .assert()
        .success()
        .stdout("pkg/a\n    B var\n    NewFoo function\n    StructA type\n");
}

#[test]
fn test_nothing_unused_prints_nothing() {
    let temp = module();
    write(
        temp.path(),
        "cmd/app/main.go",
        "package main\n\nimport \"example.com/mod/pkg/a\"\n\n\
         func main() { _ = a.B; _ = a.NewFoo() }\n",
    );
    deadexport()
        .arg("-C")
        .arg(temp.path())
        .args(["-q", "-i", "./pkg/a", "-e", "./pkg/c", "-e", "./cmd/..."])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_json_output() {
    let temp = module();
    let output = deadexport()
        .arg("-C")
        .arg(temp.path())
        .args(["-q", "-f", "json", "-i", "./pkg/a", "-e", "./pkg/c"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total"], 3);
    assert_eq!(value["packages"][0]["path"], "pkg/a");
    assert_eq!(value["packages"][0]["unused"][0]["name"], "B");
}

#[test]
fn test_config_file_supplies_patterns() {
    let temp = module();
    write(
        temp.path(),
        ".deadexport.yml",
        "input:\n  - ./pkg/a\nexternal:\n  - ./pkg/c\n",
    );
    deadexport()
        .arg("-C")
        .arg(temp.path())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("NewFoo"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_no_matching_packages_fails() {
    let temp = module();
    deadexport()
        .arg("-C")
        .arg(temp.path())
        .args(["-i", "./nothing/..."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("matched no packages"));
}

#[test]
fn test_missing_go_mod_fails() {
    let temp = TempDir::new().unwrap();
    deadexport()
        .arg("-C")
        .arg(temp.path())
        .args(["-i", "./..."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("go.mod"));
}
