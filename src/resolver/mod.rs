//! Import path to canonical package resolution.
//!
//! Import strings seen in caller files are matched against the paths of the
//! harvested packages by suffix. The heuristic prefers missing a reference to
//! inventing one: only a single match counts.

use crate::config::ResolverConfig;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// Outcome of resolving an import path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one known package matches
    Resolved(String),
    /// Several known packages match; never treated as a match
    Ambiguous(Vec<String>),
    /// Excluded namespace or no match at all
    Unknown,
}

impl Resolution {
    pub fn path(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(path) => Some(path),
            _ => None,
        }
    }
}

/// Suffix-matching resolver over a fixed universe of package paths
#[derive(Debug)]
pub struct ReferenceResolver {
    known: BTreeSet<String>,
    root_namespace: Option<String>,
    excluded_prefixes: Vec<String>,
    excluded_paths: Vec<String>,
    cache: Mutex<HashMap<String, String>>,
}

impl ReferenceResolver {
    /// `module_root` is used as the root namespace unless the config sets one
    pub fn new(
        known: BTreeSet<String>,
        config: &ResolverConfig,
        module_root: Option<&str>,
    ) -> Self {
        let root_namespace = config
            .root_namespace
            .clone()
            .or_else(|| module_root.map(|m| format!("{}/", m.trim_end_matches('/'))))
            .filter(|root| !root.is_empty());

        Self {
            known,
            root_namespace,
            excluded_prefixes: config.excluded_prefixes.clone(),
            excluded_paths: config.excluded_paths.clone(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn known_packages(&self) -> &BTreeSet<String> {
        &self.known
    }

    /// Paths outside the analyzed code: no separator, or an excluded namespace
    pub fn is_excluded(&self, import_path: &str) -> bool {
        !import_path.contains('/')
            || self
                .excluded_prefixes
                .iter()
                .any(|prefix| import_path.starts_with(prefix.as_str()))
            || self.excluded_paths.iter().any(|path| path == import_path)
    }

    /// Import path with the root namespace stripped, for paths inside it.
    /// The root package itself keeps its full path.
    fn local_path<'i>(&self, import_path: &'i str) -> Option<&'i str> {
        let root = self.root_namespace.as_deref()?;
        if import_path == root.trim_end_matches('/') {
            return Some(import_path);
        }
        import_path.strip_prefix(root).filter(|rest| !rest.is_empty())
    }

    pub fn resolve(&self, import_path: &str) -> Resolution {
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(import_path)
        {
            return Resolution::Resolved(hit.clone());
        }

        // The analyzed module may itself live under an excluded namespace
        let short = match self.local_path(import_path) {
            Some(short) => short,
            None if self.is_excluded(import_path) => return Resolution::Unknown,
            None => import_path,
        };
        let suffix = format!("/{}", short);

        let matches: Vec<String> = self
            .known
            .iter()
            .filter(|path| path.as_str() == short || path.ends_with(&suffix))
            .cloned()
            .collect();

        match matches.len() {
            1 => {
                let resolved = matches[0].clone();
                trace!("Resolved {} -> {}", import_path, resolved);
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(import_path.to_string(), resolved.clone());
                Resolution::Resolved(resolved)
            }
            0 => Resolution::Unknown,
            _ => Resolution::Ambiguous(matches),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
