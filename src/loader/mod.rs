//! Package loading collaborator.
//!
//! The analysis core never reads source from disk. It asks a [`PackageLoader`]
//! for a [`Program`]: parsed files, a package-level symbol table and the
//! import graph of every requested package and its local dependencies.

mod go_loader;

pub use go_loader::GoLoader;

use crate::error::{Error, Result};
use crate::syntax::{File, Scope};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Source of loaded packages
pub trait PackageLoader {
    /// Load the packages matching `patterns` plus the local packages they
    /// import. `_test.go` files are only included when `include_tests`.
    fn load(&self, patterns: &[String], include_tests: bool) -> Result<Program>;
}

/// Kind of a per-package loading error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Type,
    /// Anything else: unreadable files, conflicting package clauses
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PackageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One loaded package
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// Canonical path
    pub path: String,

    /// Name from the package clause
    pub name: String,

    pub dir: PathBuf,

    pub files: Vec<File>,

    /// Package-level objects declared by the non-test files
    pub scope: Scope,

    /// Import path -> canonical path, for imports that are loaded packages
    pub imports: BTreeMap<String, String>,

    pub errors: Vec<PackageError>,
}

impl Package {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: File) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_import(mut self, import_path: &str, canonical: &str) -> Self {
        self.imports
            .insert(import_path.to_string(), canonical.to_string());
        self
    }
}

/// Result of one load
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Every loaded package by canonical path
    pub packages: BTreeMap<String, Package>,

    /// Canonical paths of the packages matched by the patterns, in order
    pub roots: Vec<String>,

    /// Prefix stripped from import paths, the module path for Go
    pub root_namespace: Option<String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package; `root` marks it as matched by the patterns
    pub fn with_package(mut self, package: Package, root: bool) -> Self {
        if root && !self.roots.contains(&package.path) {
            self.roots.push(package.path.clone());
        }
        self.packages.insert(package.path.clone(), package);
        self
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    /// Every package error in the program, sorted by package
    pub fn errors(&self) -> impl Iterator<Item = (&str, &PackageError)> {
        self.packages
            .values()
            .flat_map(|pkg| pkg.errors.iter().map(move |err| (pkg.path.as_str(), err)))
    }
}

/// Apply the loading failure policy to a program.
///
/// No roots is `NoPackages`. Parse and type errors alone are tolerated with a
/// warning; any other error kind aborts the run.
pub fn check_errors(program: &Program, patterns: &[String]) -> Result<()> {
    if program.roots.is_empty() {
        return Err(Error::NoPackages {
            patterns: patterns.join(" "),
        });
    }

    let errors: Vec<(&str, &PackageError)> = program.errors().collect();
    if errors.is_empty() {
        return Ok(());
    }

    let details: Vec<String> = errors
        .iter()
        .map(|(pkg, err)| format!("{}: {}", pkg, err.message))
        .collect();

    let summary = if errors.len() > 1 {
        format!("{} errors during loading", errors.len())
    } else {
        "error during loading".to_string()
    };

    let tolerated = errors
        .iter()
        .all(|(_, err)| matches!(err.kind, ErrorKind::Parse | ErrorKind::Type));

    if tolerated {
        for detail in &details {
            warn!("{}", detail);
        }
        warn!("{}, continuing with partial syntax", summary);
        return Ok(());
    }

    Err(Error::Loading { summary, details })
}
