//! Integration tests for the two-stage unused export analysis
//!
//! Packages are built in memory so every scenario controls exactly which
//! declarations, files and references exist.

use deadexport::config::Config;
use deadexport::loader::{ErrorKind, Package, PackageError, PackageLoader, Program};
use deadexport::syntax::{Decl, Expr, File, FuncDecl, ObjectKind, Scope};
use deadexport::{DeclKind, Error, Result, UnusedExportFinder, UnusedExports};

const MODULE: &str = "example.com/mod";

/// Loader over a fixed set of packages; patterns match package paths exactly
struct MemoryLoader {
    packages: Vec<Package>,
    test_files: Vec<(String, File)>,
}

impl MemoryLoader {
    fn new(packages: Vec<Package>) -> Self {
        Self {
            packages,
            test_files: Vec::new(),
        }
    }

    fn with_test_file(mut self, package: &str, file: File) -> Self {
        self.test_files.push((package.to_string(), file));
        self
    }
}

impl PackageLoader for MemoryLoader {
    fn load(&self, patterns: &[String], include_tests: bool) -> Result<Program> {
        let mut program = Program {
            root_namespace: Some(MODULE.to_string()),
            ..Program::default()
        };

        for pattern in patterns {
            let Some(package) = self.packages.iter().find(|p| &p.path == pattern) else {
                continue;
            };
            let mut package = package.clone();
            if include_tests {
                package.files.extend(
                    self.test_files
                        .iter()
                        .filter(|(owner, _)| owner == pattern)
                        .map(|(_, file)| file.clone()),
                );
            }
            program = program.with_package(package, true);
        }

        Ok(program)
    }
}

fn import_path(package: &str) -> String {
    format!("{}/{}", MODULE, package)
}

fn patterns(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

/// Package A: `Foo()`, `var B`, `type StructA` with `MethodA`, `NewFoo() *StructA`
fn package_a() -> Package {
    let file = File::new("/mod/pkg/a/a.go", "a")
        .with_decl(Decl::Func(FuncDecl::new("Foo")))
        .with_decl(Decl::Func(
            FuncDecl::new("MethodA").with_recv(Expr::star(Expr::ident("StructA"))),
        ))
        .with_decl(Decl::Func(
            FuncDecl::new("NewFoo").with_result(Expr::star(Expr::ident("StructA"))),
        ));

    let scope = Scope::new()
        .with("Foo", ObjectKind::Func)
        .with("B", ObjectKind::Var)
        .with("StructA", ObjectKind::TypeName)
        .with("NewFoo", ObjectKind::Func);

    Package::new("pkg/a", "a").with_file(file).with_scope(scope)
}

/// Caller package importing `target` and referencing `alias.Name` for each use
fn caller(path: &str, target: &str, alias: Option<&str>, uses: &[&str]) -> Package {
    let name = path.rsplit('/').next().unwrap_or(path);
    let local = alias.unwrap_or_else(|| target.rsplit('/').next().unwrap_or(target));

    let body = uses
        .iter()
        .map(|used| Expr::call(Expr::qualified(local, used), vec![]))
        .collect();
    let file = File::new(format!("/mod/{}/main.go", path), name)
        .with_import(alias, &import_path(target))
        .with_decl(Decl::Func(FuncDecl::new("run").with_body(body)));

    Package::new(path, name)
        .with_file(file)
        .with_scope(Scope::new().with("run", ObjectKind::Func))
        .with_import(&import_path(target), target)
}

fn names<'u>(unused: &'u UnusedExports, package: &str) -> Vec<&'u str> {
    unused
        .get(package)
        .map(|names| names.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

fn run(loader: &MemoryLoader, subjects: &[&str], callers: &[&str]) -> Result<UnusedExports> {
    UnusedExportFinder::new(Config::default()).run(loader, &patterns(subjects), &patterns(callers))
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_calling_function_removes_only_that_function() {
    let loader = MemoryLoader::new(vec![package_a(), caller("pkg/c", "pkg/a", None, &["Foo"])]);

    let unused = run(&loader, &["pkg/a"], &["pkg/c"]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["B", "NewFoo", "StructA"]);
    assert_eq!(unused["pkg/a"]["B"], DeclKind::Var);
    assert_eq!(unused["pkg/a"]["StructA"], DeclKind::Type);
}

#[test]
fn test_calling_constructor_removes_constructed_type() {
    let loader = MemoryLoader::new(vec![package_a(), caller("pkg/c", "pkg/a", None, &["NewFoo"])]);

    let unused = run(&loader, &["pkg/a"], &["pkg/c"]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["B", "Foo"]);
}

#[test]
fn test_by_value_result_type_is_never_reported() {
    let file = File::new("/mod/pkg/thing/thing.go", "thing").with_decl(Decl::Func(
        FuncDecl::new("MakeThing").with_result(Expr::ident("ThingConfig")),
    ));
    let scope = Scope::new()
        .with("MakeThing", ObjectKind::Func)
        .with("ThingConfig", ObjectKind::TypeName)
        .with("Limit", ObjectKind::Const);
    let thing = Package::new("pkg/thing", "thing").with_file(file).with_scope(scope);

    let unused = run(&MemoryLoader::new(vec![thing]), &["pkg/thing"], &[]).unwrap();

    assert_eq!(names(&unused, "pkg/thing"), vec!["Limit", "MakeThing"]);
}

#[test]
fn test_nothing_unused_gives_empty_result() {
    let loader = MemoryLoader::new(vec![
        package_a(),
        caller("pkg/c", "pkg/a", None, &["Foo", "B", "NewFoo"]),
    ]);

    let unused = run(&loader, &["pkg/a"], &["pkg/c"]).unwrap();

    assert!(unused.is_empty());
}

#[test]
fn test_subjects_reference_each_other() {
    let loader = MemoryLoader::new(vec![package_a(), caller("pkg/b", "pkg/a", None, &["B"])]);

    let unused = run(&loader, &["pkg/a", "pkg/b"], &[]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["Foo", "NewFoo", "StructA"]);
    assert!(names(&unused, "pkg/b").is_empty());
}

#[test]
fn test_explicit_import_alias() {
    let loader = MemoryLoader::new(vec![
        package_a(),
        caller("pkg/c", "pkg/a", Some("pkga"), &["Foo", "B"]),
    ]);

    let unused = run(&loader, &["pkg/a"], &["pkg/c"]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["NewFoo", "StructA"]);
}

#[test]
fn test_test_files_count_as_callers() {
    let external_test = File::new("/mod/pkg/a/a_test.go", "a_test")
        .with_import(None, &import_path("pkg/a"))
        .with_decl(Decl::Func(FuncDecl::new("TestB").with_body(vec![Expr::call(
            Expr::ident("use"),
            vec![Expr::qualified("a", "B")],
        )])));
    let loader = MemoryLoader::new(vec![package_a()]).with_test_file("pkg/a", external_test);

    let unused = run(&loader, &["pkg/a"], &[]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["Foo", "NewFoo", "StructA"]);
}

#[test]
fn test_unnamed_import_uses_package_clause() {
    // directory go-util, package util
    let util = Package::new("pkg/go-util", "util")
        .with_file(File::new("/mod/pkg/go-util/util.go", "util"))
        .with_scope(
            Scope::new()
                .with("Foo", ObjectKind::Func)
                .with("B", ObjectKind::Var),
        );
    let file = File::new("/mod/cmd/c/main.go", "main")
        .with_import(None, &import_path("pkg/go-util"))
        .with_decl(Decl::Func(FuncDecl::new("main").with_body(vec![Expr::call(
            Expr::qualified("util", "Foo"),
            vec![],
        )])));
    let c = Package::new("cmd/c", "main")
        .with_file(file)
        .with_import(&import_path("pkg/go-util"), "pkg/go-util");
    let loader = MemoryLoader::new(vec![util, c]);

    let unused = run(&loader, &["pkg/go-util"], &["cmd/c"]).unwrap();

    assert_eq!(names(&unused, "pkg/go-util"), vec!["B"]);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_caller_order_does_not_matter() {
    let loader = MemoryLoader::new(vec![
        package_a(),
        caller("pkg/c1", "pkg/a", None, &["Foo"]),
        caller("pkg/c2", "pkg/a", None, &["NewFoo"]),
        caller("pkg/c3", "pkg/a", None, &["Foo", "B"]),
    ]);

    let forward = run(&loader, &["pkg/a"], &["pkg/c1", "pkg/c2", "pkg/c3"]).unwrap();
    let backward = run(&loader, &["pkg/a"], &["pkg/c3", "pkg/c2", "pkg/c1"]).unwrap();
    let parallel = UnusedExportFinder::new(Config::default())
        .with_parallel(true)
        .run(&loader, &patterns(&["pkg/a"]), &patterns(&["pkg/c2", "pkg/c1", "pkg/c3"]))
        .unwrap();

    assert!(forward.is_empty());
    assert_eq!(forward, backward);
    assert_eq!(forward, parallel);
}

#[test]
fn test_repeated_references_are_idempotent() {
    let loader = MemoryLoader::new(vec![
        package_a(),
        caller("pkg/c", "pkg/a", None, &["Foo", "Foo", "NewFoo"]),
        caller("pkg/d", "pkg/a", None, &["NewFoo"]),
    ]);

    let once = run(&loader, &["pkg/a"], &["pkg/c"]).unwrap();
    let twice = run(&loader, &["pkg/a"], &["pkg/c", "pkg/d", "pkg/c"]).unwrap();

    assert_eq!(names(&once, "pkg/a"), vec!["B"]);
    assert_eq!(once, twice);
}

#[test]
fn test_ambiguous_import_eliminates_nothing() {
    let util = |path: &str| {
        let file = File::new(format!("/mod/{}/util.go", path), "util");
        Package::new(path, "util")
            .with_file(file)
            .with_scope(Scope::new().with("Helper", ObjectKind::Func))
    };
    // "one/util" is a suffix of both subject paths
    let loader = MemoryLoader::new(vec![
        util("svc/one/util"),
        util("lib/one/util"),
        caller("cmd/tool", "one/util", None, &["Helper"]),
    ]);

    let unused = run(&loader, &["svc/one/util", "lib/one/util"], &["cmd/tool"]).unwrap();

    assert_eq!(names(&unused, "svc/one/util"), vec!["Helper"]);
    assert_eq!(names(&unused, "lib/one/util"), vec!["Helper"]);
}

#[test]
fn test_unmatched_import_eliminates_nothing() {
    let loader = MemoryLoader::new(vec![
        package_a(),
        caller("pkg/c", "pkg/elsewhere/a", None, &["Foo"]),
    ]);

    let unused = run(&loader, &["pkg/a"], &["pkg/c"]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["B", "Foo", "NewFoo", "StructA"]);
}

#[test]
fn test_external_namespaces_never_touch_registry() {
    let file = File::new("/mod/pkg/c/main.go", "c")
        .with_import(None, "fmt")
        .with_import(Some("a"), "github.com/other/pkg/a")
        .with_import(Some("json"), "encoding/json")
        .with_decl(Decl::Func(FuncDecl::new("run").with_body(vec![
            Expr::call(Expr::qualified("fmt", "Foo"), vec![]),
            Expr::call(Expr::qualified("a", "Foo"), vec![]),
            Expr::call(Expr::qualified("json", "B"), vec![]),
        ])));
    let c = Package::new("pkg/c", "c")
        .with_file(file)
        .with_scope(Scope::new().with("run", ObjectKind::Func));
    let loader = MemoryLoader::new(vec![package_a(), c]);

    let unused = run(&loader, &["pkg/a"], &["pkg/c"]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["B", "Foo", "NewFoo", "StructA"]);
}

#[test]
fn test_constructor_removes_exactly_its_result_types() {
    let file = File::new("/mod/pkg/pair/pair.go", "pair").with_decl(Decl::Func(
        FuncDecl::new("NewPair")
            .with_result(Expr::star(Expr::ident("Left")))
            .with_result(Expr::star(Expr::index(Expr::ident("Right"), Expr::ident("int"))))
            .with_result(Expr::ident("error")),
    ));
    let scope = Scope::new()
        .with("NewPair", ObjectKind::Func)
        .with("Left", ObjectKind::TypeName)
        .with("Right", ObjectKind::TypeName)
        .with("Unrelated", ObjectKind::TypeName);
    let pair = Package::new("pkg/pair", "pair").with_file(file).with_scope(scope);
    let loader = MemoryLoader::new(vec![pair, caller("pkg/c", "pkg/pair", None, &["NewPair"])]);

    let unused = run(&loader, &["pkg/pair"], &["pkg/c"]).unwrap();

    assert_eq!(names(&unused, "pkg/pair"), vec!["Unrelated"]);
}

#[test]
fn test_methods_in_mock_files_are_not_harvested() {
    // A receiver shape the harvester rejects, hidden in a mock file
    let mock = File::new("/mod/pkg/a/client_mock.go", "a").with_decl(Decl::Func(
        FuncDecl::new("Do").with_recv(Expr::qualified("other", "T")),
    ));
    let mut a = package_a();
    a.files.push(mock);

    let unused = run(&MemoryLoader::new(vec![a]), &["pkg/a"], &[]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["B", "Foo", "NewFoo", "StructA"]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unsupported_receiver_aborts_run() {
    let mut a = package_a();
    a.files.push(
        File::new("/mod/pkg/a/odd.go", "a").with_decl(Decl::Func(
            FuncDecl::new("Do").with_recv(Expr::qualified("other", "T")),
        )),
    );

    let err = run(&MemoryLoader::new(vec![a]), &["pkg/a"], &[]).unwrap_err();

    assert!(matches!(err, Error::UnsupportedConstruct { .. }), "got {:?}", err);
}

#[test]
fn test_unsupported_selector_base_aborts_run() {
    let func_lit = Expr::FuncLit {
        params: vec![],
        results: vec![],
        body: vec![],
    };
    let file = File::new("/mod/pkg/c/main.go", "c").with_decl(Decl::Func(
        FuncDecl::new("run").with_body(vec![Expr::selector(func_lit, "Field")]),
    ));
    let c = Package::new("pkg/c", "c").with_file(file);
    let loader = MemoryLoader::new(vec![package_a(), c]);

    let err = run(&loader, &["pkg/a"], &["pkg/c"]).unwrap_err();

    match err {
        Error::UnsupportedConstruct { construct, .. } => {
            assert!(construct.contains("function literal"), "got {}", construct)
        }
        other => panic!("expected unsupported construct, got {:?}", other),
    }
}

#[test]
fn test_no_subjects() {
    let err = run(&MemoryLoader::new(vec![package_a()]), &[], &["pkg/a"]).unwrap_err();
    assert!(matches!(err, Error::NoSubjects));
}

#[test]
fn test_no_matching_packages() {
    let err = run(&MemoryLoader::new(vec![package_a()]), &["pkg/missing"], &[]).unwrap_err();
    assert!(matches!(err, Error::NoPackages { .. }));
}

#[test]
fn test_parse_errors_are_tolerated() {
    let mut a = package_a();
    a.errors.push(PackageError::new(
        ErrorKind::Parse,
        "/mod/pkg/a/a.go:3:1: syntax error: unexpected }",
    ));
    a.errors.push(PackageError::new(
        ErrorKind::Type,
        "/mod/pkg/a/b.go:1:5: Foo redeclared in this block",
    ));

    let unused = run(&MemoryLoader::new(vec![a]), &["pkg/a"], &[]).unwrap();

    assert_eq!(names(&unused, "pkg/a"), vec!["B", "Foo", "NewFoo", "StructA"]);
}

#[test]
fn test_mixed_errors_abort_before_analysis() {
    let mut a = package_a();
    a.errors.push(PackageError::new(ErrorKind::Parse, "a.go:3:1: syntax error"));
    a.errors.push(PackageError::new(ErrorKind::List, "b.go: permission denied"));

    let err = run(&MemoryLoader::new(vec![a]), &["pkg/a"], &[]).unwrap_err();

    match err {
        Error::Loading { summary, details } => {
            assert_eq!(summary, "2 errors during loading");
            assert_eq!(details.len(), 2);
        }
        other => panic!("expected loading error, got {:?}", other),
    }
}
