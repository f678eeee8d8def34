//! deadexport - find exported Go declarations that no caller references
//!
//! This library finds the exported package-level declarations of a set of
//! subject packages that a set of caller packages never mention, so the
//! public surface can be shrunk before a refactor.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Loading** - Discover `.go` files, parse them with tree-sitter and
//!    build per-package symbol tables and import graphs
//! 2. **Harvest** - Record exported declarations, methods and constructors
//!    of the subject packages in a shared registry
//! 3. **Elimination** - Resolve every qualified reference of subjects and
//!    callers and remove it from the registry
//! 4. **Reporting** - Output whatever survived
//!
//! Both passes run on a dependency-aware scheduler that executes each
//! (analyzer, package) action exactly once.

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod parser;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod scheduler;
pub mod syntax;

pub use analysis::UnusedExportFinder;
pub use config::Config;
pub use error::{Error, Result};
pub use loader::{GoLoader, PackageLoader, Program};
pub use registry::{DeclKind, SharedRegistry, UnusedExports};
pub use report::{ReportFormat, Reporter};
pub use resolver::{ReferenceResolver, Resolution};
pub use scheduler::{Analyzer, Pass, Scheduler};
