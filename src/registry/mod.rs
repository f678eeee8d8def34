//! Shared tables of harvested exports.
//!
//! The registry is filled by the harvest stage, sealed, and then only pruned
//! by the elimination stage. Whatever survives is the unused public surface.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Kind of an exported package-level declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Function,
    Const,
    Var,
    Type,
}

impl DeclKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            DeclKind::Function => "function",
            DeclKind::Const => "const",
            DeclKind::Var => "var",
            DeclKind::Type => "type",
        }
    }
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Everything harvested from one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageExports {
    /// Declaration name -> kind
    pub declarations: BTreeMap<String, DeclKind>,

    /// Receiver type name -> exported method names
    pub methods: BTreeMap<String, BTreeSet<String>>,

    /// Constructor name -> exported pointer-returned type names, in result order
    pub constructors: BTreeMap<String, Vec<String>>,
}

impl PackageExports {
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.methods.is_empty() && self.constructors.is_empty()
    }

    fn absorb(&mut self, other: PackageExports) {
        self.declarations.extend(other.declarations);
        for (ty, methods) in other.methods {
            self.methods.entry(ty).or_default().extend(methods);
        }
        for (ctor, types) in other.constructors {
            self.constructors.entry(ctor).or_default().extend(types);
        }
    }
}

/// Names removed by one elimination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Elimination {
    pub removed: Vec<String>,
}

/// Surviving declarations per package, only packages with at least one entry
pub type UnusedExports = BTreeMap<String, BTreeMap<String, DeclKind>>;

#[derive(Debug, Default)]
struct Registry {
    packages: BTreeMap<String, PackageExports>,
    sealed: bool,
}

impl Registry {
    fn eliminate(&mut self, package: &str, name: &str, removed: &mut Vec<String>) {
        let Some(exports) = self.packages.get_mut(package) else {
            return;
        };

        if exports.declarations.remove(name).is_some() {
            removed.push(name.to_string());
        }
        if let Some(types) = exports.constructors.get(name) {
            for ty in types {
                if exports.declarations.remove(ty).is_some() {
                    removed.push(ty.clone());
                }
            }
        }
    }
}

/// Registry shared by every pass action, guarded by a single mutex
#[derive(Debug, Default)]
pub struct SharedRegistry {
    inner: Mutex<Registry>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // Every mutation is a single insert or remove, so a poisoned lock
        // still guards consistent tables.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge a package's harvest. Empty harvests create no entry.
    pub fn merge(&self, package: &str, exports: PackageExports) -> Result<()> {
        let mut registry = self.lock();
        if registry.sealed {
            return Err(Error::RegistrySealed {
                package: package.to_string(),
            });
        }
        if exports.declarations.is_empty() && exports.methods.is_empty() {
            return Ok(());
        }
        registry
            .packages
            .entry(package.to_string())
            .or_default()
            .absorb(exports);
        Ok(())
    }

    /// Close the harvest stage; from here on entries can only be removed
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    /// Paths of every harvested package
    pub fn known_packages(&self) -> BTreeSet<String> {
        self.lock().packages.keys().cloned().collect()
    }

    /// Remove references to `name` in `package`.
    ///
    /// The name itself is removed from the declarations; when it is a
    /// constructor, each of its return types is removed too. Constructors of
    /// those types are left alone.
    pub fn eliminate(&self, package: &str, name: &str) -> Elimination {
        let mut removed = Vec::new();
        self.lock().eliminate(package, name, &mut removed);
        Elimination { removed }
    }

    /// Apply every `(package, name)` reference under one lock.
    /// Returns the removed names per package.
    pub fn eliminate_all<'r>(
        &self,
        references: impl IntoIterator<Item = (&'r str, &'r str)>,
    ) -> BTreeMap<String, Elimination> {
        let mut eliminated: BTreeMap<String, Elimination> = BTreeMap::new();
        let mut registry = self.lock();
        for (package, name) in references {
            let mut removed = Vec::new();
            registry.eliminate(package, name, &mut removed);
            if !removed.is_empty() {
                eliminated
                    .entry(package.to_string())
                    .or_default()
                    .removed
                    .extend(removed);
            }
        }
        eliminated
    }

    pub fn exports(&self, package: &str) -> Option<PackageExports> {
        self.lock().packages.get(package).cloned()
    }

    pub fn declaration_count(&self) -> usize {
        self.lock()
            .packages
            .values()
            .map(|p| p.declarations.len())
            .sum()
    }

    /// Snapshot of what survived, skipping packages with nothing left
    pub fn unused(&self) -> UnusedExports {
        self.lock()
            .packages
            .iter()
            .filter(|(_, exports)| !exports.declarations.is_empty())
            .map(|(path, exports)| (path.clone(), exports.declarations.clone()))
            .collect()
    }
}
