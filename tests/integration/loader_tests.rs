//! Integration tests for loading Go modules from disk

use deadexport::config::{Config, LoaderConfig};
use deadexport::loader::{ErrorKind, GoLoader, PackageLoader};
use deadexport::syntax::ObjectKind;
use deadexport::{Error, UnusedExportFinder};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PKG_A: &str = r#"package a

// Foo does a thing.
func Foo() {}

var B = 1

type StructA struct{}

func (s *StructA) MethodA() {}

func NewFoo() *StructA { return &StructA{} }
"#;

const PKG_A_TEST: &str = r#"package a_test

import (
	"testing"

	"example.com/mod/pkg/a"
)

func TestB(t *testing.T) {
	_ = a.B
}
"#;

const PKG_C: &str = r#"package c

import (
	"fmt"

	"example.com/mod/pkg/a"
)

func Run() {
	a.Foo()
	fmt.Println("done")
}
"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Module `example.com/mod` with packages `pkg/a` (plus an external test)
/// and `pkg/c`, which calls `a.Foo`
fn module() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "go.mod", "module example.com/mod\n\ngo 1.21\n");
    write(root, "pkg/a/a.go", PKG_A);
    write(root, "pkg/a/a_test.go", PKG_A_TEST);
    write(root, "pkg/c/c.go", PKG_C);
    temp
}

fn patterns(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

#[test]
fn test_module_path_from_go_mod() {
    let temp = module();
    let loader = GoLoader::new(temp.path(), LoaderConfig::default()).unwrap();
    assert_eq!(loader.module_path(), "example.com/mod");
}

#[test]
fn test_missing_go_mod() {
    let temp = TempDir::new().unwrap();
    let err = GoLoader::new(temp.path(), LoaderConfig::default()).err().unwrap();
    assert!(matches!(err, Error::ModuleNotFound { .. }));
}

#[test]
fn test_recursive_pattern_matches_every_package() {
    let temp = module();
    let loader = GoLoader::new(temp.path(), LoaderConfig::default()).unwrap();

    let program = loader.load(&patterns(&["./pkg/..."]), false).unwrap();

    assert_eq!(program.roots, vec!["pkg/a", "pkg/c"]);
    assert_eq!(program.root_namespace.as_deref(), Some("example.com/mod"));
}

#[test]
fn test_import_path_pattern() {
    let temp = module();
    let loader = GoLoader::new(temp.path(), LoaderConfig::default()).unwrap();

    let program = loader.load(&patterns(&["example.com/mod/pkg/a"]), false).unwrap();

    assert_eq!(program.roots, vec!["pkg/a"]);
}

#[test]
fn test_local_imports_are_loaded_as_dependencies() {
    let temp = module();
    let loader = GoLoader::new(temp.path(), LoaderConfig::default()).unwrap();

    let program = loader.load(&patterns(&["./pkg/c"]), false).unwrap();

    assert_eq!(program.roots, vec!["pkg/c"]);
    assert!(program.package("pkg/a").is_some());

    let c = program.package("pkg/c").unwrap();
    assert_eq!(c.name, "c");
    assert_eq!(c.imports.len(), 1);
    assert_eq!(c.imports["example.com/mod/pkg/a"], "pkg/a");
}

#[test]
fn test_scope_and_test_files() {
    let temp = module();
    let loader = GoLoader::new(temp.path(), LoaderConfig::default()).unwrap();

    let program = loader.load(&patterns(&["./pkg/a"]), false).unwrap();
    let a = program.package("pkg/a").unwrap();
    assert_eq!(a.files.len(), 1);
    assert_eq!(a.scope.lookup("Foo"), Some(ObjectKind::Func));
    assert_eq!(a.scope.lookup("B"), Some(ObjectKind::Var));
    assert_eq!(a.scope.lookup("StructA"), Some(ObjectKind::TypeName));
    assert_eq!(a.scope.lookup("MethodA"), None);
    assert!(a.errors.is_empty());

    let program = loader.load(&patterns(&["./pkg/a"]), true).unwrap();
    let a = program.package("pkg/a").unwrap();
    assert_eq!(a.files.len(), 2);
    assert_eq!(a.name, "a");
    // the external test imports its own package
    assert!(a.imports.is_empty());
    assert!(a.errors.is_empty());
}

#[test]
fn test_syntax_errors_are_reported_per_package() {
    let temp = module();
    write(temp.path(), "pkg/broken/broken.go", "package broken\n\nfunc Oops( {\n");
    let loader = GoLoader::new(temp.path(), LoaderConfig::default()).unwrap();

    let program = loader.load(&patterns(&["./pkg/broken"]), false).unwrap();
    let broken = program.package("pkg/broken").unwrap();

    assert!(!broken.errors.is_empty());
    assert!(broken.errors.iter().all(|err| err.kind == ErrorKind::Parse));
}

#[test]
fn test_skip_packages_filters_roots() {
    let temp = module();
    let config = LoaderConfig {
        skip_packages: vec!["pkg/c".to_string()],
        ..LoaderConfig::default()
    };
    let loader = GoLoader::new(temp.path(), config).unwrap();

    let program = loader.load(&patterns(&["./..."]), false).unwrap();

    assert_eq!(program.roots, vec!["pkg/a"]);
}

#[test]
fn test_finder_over_module() {
    let temp = module();
    let config = Config::default();
    let loader = GoLoader::new(temp.path(), config.loader.clone()).unwrap();

    let unused = UnusedExportFinder::new(config)
        .run(&loader, &patterns(&["./pkg/a"]), &patterns(&["./pkg/c"]))
        .unwrap();

    // Foo is called by pkg/c, B by the external test
    let names: Vec<&str> = unused["pkg/a"].keys().map(String::as_str).collect();
    assert_eq!(names, vec!["NewFoo", "StructA"]);
}

#[test]
fn test_finder_without_matches() {
    let temp = module();
    let config = Config::default();
    let loader = GoLoader::new(temp.path(), config.loader.clone()).unwrap();

    let err = UnusedExportFinder::new(config)
        .run(&loader, &patterns(&["./cmd/..."]), &[])
        .unwrap_err();

    assert!(matches!(err, Error::NoPackages { .. }));
}

/// `pkg/a` declares Foo and B; `cmd/c` calls `a.Foo()`
fn module_named(module: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "go.mod", &format!("module {}\n\ngo 1.21\n", module));
    write(root, "pkg/a/a.go", "package a\n\nfunc Foo() {}\n\nvar B = 1\n");
    write(
        root,
        "cmd/c/main.go",
        &format!(
            "package main\n\nimport \"{}/pkg/a\"\n\nfunc main() {{ a.Foo() }}\n",
            module
        ),
    );
    temp
}

fn unused_names(root: &Path, subjects: &[&str], callers: &[&str]) -> Vec<(String, Vec<String>)> {
    let config = Config::default();
    let loader = GoLoader::new(root, config.loader.clone()).unwrap();
    let unused = UnusedExportFinder::new(config)
        .run(&loader, &patterns(subjects), &patterns(callers))
        .unwrap();
    unused
        .into_iter()
        .map(|(package, names)| (package, names.into_keys().collect()))
        .collect()
}

#[test]
fn test_module_under_excluded_namespace() {
    let expected = vec![("pkg/a".to_string(), vec!["B".to_string()])];

    let plain = module_named("example.com/acme/proj");
    assert_eq!(unused_names(plain.path(), &["./pkg/a"], &["./cmd/..."]), expected);

    let hosted = module_named("github.com/acme/proj");
    assert_eq!(unused_names(hosted.path(), &["./pkg/a"], &["./cmd/..."]), expected);
}

#[test]
fn test_package_name_differs_from_directory() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "go.mod", "module example.com/mod\n\ngo 1.21\n");
    write(
        root,
        "pkg/go-util/util.go",
        "package util\n\nfunc Foo() {}\n\nvar B = 1\n",
    );
    write(
        root,
        "cmd/c/main.go",
        "package main\n\nimport \"example.com/mod/pkg/go-util\"\n\nfunc main() { util.Foo() }\n",
    );

    assert_eq!(
        unused_names(root, &["./pkg/go-util"], &["./cmd/c"]),
        vec![("pkg/go-util".to_string(), vec!["B".to_string()])]
    );
}
