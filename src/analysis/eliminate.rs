// Elimination pass - removes every qualified reference from the registry
//
// Each `alias.Name` selector in a package is traced back to its import, the
// import is resolved to a harvested package, and `Name` is dropped from it.

use super::file_index::{self, FileIndex};
use crate::error::{Error, Result};
use crate::registry::{Elimination, SharedRegistry};
use crate::resolver::{ReferenceResolver, Resolution};
use crate::scheduler::{Analyzer, AnalyzerResult, Pass};
use crate::syntax::{Expr, File};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

pub const NAME: &str = "eliminate";

/// Names one package removed from the registry, per target package
#[derive(Debug, Clone, Default)]
pub struct Eliminated {
    pub references: usize,
    pub removed: BTreeMap<String, Elimination>,
}

pub struct EliminateAnalyzer {
    registry: Arc<SharedRegistry>,
    resolver: Arc<ReferenceResolver>,
}

impl EliminateAnalyzer {
    pub fn new(registry: Arc<SharedRegistry>, resolver: Arc<ReferenceResolver>) -> Self {
        Self { registry, resolver }
    }
}

impl Analyzer for EliminateAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn requires(&self) -> &[&'static str] {
        &[file_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<Option<AnalyzerResult>> {
        let index = pass
            .result_of::<FileIndex>(file_index::NAME)
            .ok_or_else(|| Error::MissingAnalyzer {
                name: file_index::NAME.to_string(),
            })?;

        let mut resolved: Vec<(String, &str)> = Vec::new();
        let mut ambiguous: Vec<(String, String)> = Vec::new();

        for (file, info) in pass.files().iter().zip(&index.files) {
            for (alias, name) in qualified_references(file)? {
                let Some(import_path) = info.imports.get(alias) else {
                    continue;
                };
                match self.resolver.resolve(import_path) {
                    Resolution::Resolved(package) => resolved.push((package, name)),
                    Resolution::Ambiguous(candidates) => ambiguous.push((
                        file.path.display().to_string(),
                        format!(
                            "{}.{}: import {} matches {} packages ({}), ignored",
                            alias,
                            name,
                            import_path,
                            candidates.len(),
                            candidates.join(", ")
                        ),
                    )),
                    Resolution::Unknown => trace!("{}.{}: {} is not harvested", alias, name, import_path),
                }
            }
        }

        for (location, message) in ambiguous {
            pass.report(location, message);
        }

        let removed = self
            .registry
            .eliminate_all(resolved.iter().map(|(package, name)| (package.as_str(), *name)));
        for (package, elimination) in &removed {
            debug!(
                "{} removes {}: {}",
                pass.package().path,
                package,
                elimination.removed.join(", ")
            );
        }

        Ok(Some(Arc::new(Eliminated {
            references: resolved.len(),
            removed,
        })))
    }
}

/// Every `(alias, name)` selector pair in the file, in traversal order
pub fn qualified_references(file: &File) -> Result<Vec<(&str, &str)>> {
    let mut references = Vec::new();
    let mut failure = None;

    file.inspect(&mut |expr| {
        if failure.is_some() {
            return false;
        }
        if let Expr::Selector { x, sel } = expr {
            match package_alias(x) {
                Ok(Some(alias)) => references.push((alias, sel.as_str())),
                Ok(None) => {}
                Err(construct) => {
                    failure = Some(Error::unsupported(
                        format!("selector base {}", construct),
                        format!("{}: .{}", file.path.display(), sel),
                    ));
                }
            }
        }
        true
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(references),
    }
}

/// Innermost identifier a selector base starts from.
///
/// `None` for bases that never name a package: dereferences and composite
/// literals, plus nodes the parser could not recover.
pub fn package_alias(expr: &Expr) -> std::result::Result<Option<&str>, String> {
    match expr {
        Expr::Ident(name) => Ok(Some(name.as_str())),
        Expr::Selector { x, .. }
        | Expr::Index { x, .. }
        | Expr::IndexList { x, .. }
        | Expr::Slice { x, .. }
        | Expr::TypeAssert { x, .. }
        | Expr::Paren(x)
        | Expr::Unary { x, .. } => package_alias(x),
        Expr::Call { fun, .. } => package_alias(fun),
        Expr::Star(_) | Expr::CompositeLit { .. } => Ok(None),
        Expr::Other { kind, .. } if kind == "ERROR" || kind == "missing" => Ok(None),
        other => Err(other.kind_name().to_string()),
    }
}
