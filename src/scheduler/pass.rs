use crate::loader::{Package, Program};
use crate::syntax::{File, Scope};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Value produced by an analyzer for one package
pub type AnalyzerResult = Arc<dyn Any + Send + Sync>;

/// Finding reported by a pass; informational, never fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub analyzer: &'static str,
    pub package: String,
    pub location: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} [{}]", self.location, self.message, self.analyzer)
    }
}

/// Package facts shared between the actions of one scheduler
#[derive(Debug, Default)]
pub struct FactStore {
    facts: Mutex<HashMap<(String, TypeId), AnalyzerResult>>,
}

impl FactStore {
    fn insert<T: Any + Send + Sync>(&self, package: &str, fact: T) {
        self.facts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((package.to_string(), TypeId::of::<T>()), Arc::new(fact));
    }

    fn get<T: Any + Send + Sync>(&self, package: &str) -> Option<Arc<T>> {
        let fact = self
            .facts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(package.to_string(), TypeId::of::<T>()))
            .cloned()?;
        fact.downcast::<T>().ok()
    }

    pub fn len(&self) -> usize {
        self.facts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Context handed to an analyzer for one package
pub struct Pass<'a> {
    analyzer: &'static str,
    program: &'a Program,
    package: &'a Package,
    results: HashMap<&'static str, AnalyzerResult>,
    facts: &'a FactStore,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Pass<'a> {
    pub(super) fn new(
        analyzer: &'static str,
        program: &'a Program,
        package: &'a Package,
        results: HashMap<&'static str, AnalyzerResult>,
        facts: &'a FactStore,
    ) -> Self {
        Self {
            analyzer,
            program,
            package,
            results,
            facts,
            diagnostics: Vec::new(),
        }
    }

    pub fn package(&self) -> &'a Package {
        self.package
    }

    pub fn files(&self) -> &'a [File] {
        &self.package.files
    }

    pub fn scope(&self) -> &'a Scope {
        &self.package.scope
    }

    /// Loaded package behind an import path of the current package
    pub fn imported_package(&self, import_path: &str) -> Option<&'a Package> {
        let canonical = self.package.imports.get(import_path)?;
        self.program.package(canonical)
    }

    /// Import path under which the current package is known to the program,
    /// when the program has a root namespace
    pub fn own_import_path(&self) -> Option<String> {
        let root = self.program.root_namespace.as_deref()?;
        if self.package.path == root {
            Some(root.to_string())
        } else {
            Some(format!("{}/{}", root.trim_end_matches('/'), self.package.path))
        }
    }

    /// Result of a required analyzer on the same package
    pub fn result_of<T: Any + Send + Sync>(&self, analyzer: &str) -> Option<Arc<T>> {
        self.results
            .get(analyzer)
            .cloned()
            .and_then(|result| result.downcast::<T>().ok())
    }

    pub fn report(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            analyzer: self.analyzer,
            package: self.package.path.clone(),
            location: location.into(),
            message: message.into(),
        });
    }

    /// Attach a fact to the current package
    pub fn export_package_fact<T: Any + Send + Sync>(&self, fact: T) {
        self.facts.insert(&self.package.path, fact);
    }

    /// Fact of type `T` attached to `package`, when one was exported.
    /// Only packages this analyzer depends on are guaranteed to have run.
    pub fn import_package_fact<T: Any + Send + Sync>(&self, package: &str) -> Option<Arc<T>> {
        self.facts.get(package)
    }

    pub(super) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
