// Harvest pass - records the exported surface of a subject package
//
// Declarations come from the package scope, methods and constructors from
// the syntax of the files the file index does not exclude.

use super::file_index::{self, FileIndex};
use crate::error::{Error, Result};
use crate::loader::Package;
use crate::registry::{DeclKind, PackageExports, SharedRegistry};
use crate::scheduler::{Analyzer, AnalyzerResult, Pass};
use crate::syntax::{is_exported, Expr, File, FuncDecl, ObjectKind, Scope};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "harvest";

pub struct HarvestAnalyzer {
    registry: Arc<SharedRegistry>,
}

impl HarvestAnalyzer {
    pub fn new(registry: Arc<SharedRegistry>) -> Self {
        Self { registry }
    }
}

impl Analyzer for HarvestAnalyzer {
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

        let exports = harvest(pass.package(), &index)?;
        debug!(
            "{}: {} declarations, {} receiver types, {} constructors",
            pass.package().path,
            exports.declarations.len(),
            exports.methods.len(),
            exports.constructors.len()
        );

        self.registry.merge(&pass.package().path, exports.clone())?;
        Ok(Some(Arc::new(exports)))
    }
}

/// Exported surface of one package, before it is merged into the registry
pub fn harvest(package: &Package, index: &FileIndex) -> Result<PackageExports> {
    let mut declarations = classify(&package.scope);
    let mut methods: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut constructors: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for file in index.harvestable(&package.files) {
        for func in file.func_decls() {
            if func.is_method() {
                let receiver = receiver_type_name(func, file)?;
                if is_exported(&func.name) {
                    methods
                        .entry(receiver.to_string())
                        .or_default()
                        .insert(func.name.clone());
                }
            } else if is_exported(&func.name) {
                let types = constructed_types(func);
                if !types.is_empty() {
                    constructors
                        .entry(func.name.clone())
                        .or_default()
                        .extend(types);
                }
            }
        }
    }

    let exposed = exposed_by_value(&package.files);
    declarations.retain(|name, _| !exposed.contains(name));
    methods.retain(|ty, _| !exposed.contains(ty));
    constructors.retain(|name, _| !exposed.contains(name));

    Ok(PackageExports {
        declarations,
        methods,
        constructors,
    })
}

/// Exported names of the package scope by declaration kind
fn classify(scope: &Scope) -> BTreeMap<String, DeclKind> {
    scope
        .iter()
        .filter(|(name, _)| is_exported(name))
        .map(|(name, object)| {
            let kind = match object {
                ObjectKind::Func => DeclKind::Function,
                ObjectKind::Const => DeclKind::Const,
                ObjectKind::Var => DeclKind::Var,
                ObjectKind::TypeName => DeclKind::Type,
            };
            (name.to_string(), kind)
        })
        .collect()
}

/// Base type name of a method receiver: `T`, `*T`, `T[A]`, `*T[A, B]`, `(T)`
fn receiver_type_name<'f>(func: &'f FuncDecl, file: &File) -> Result<&'f str> {
    let location = || format!("{}: method {}", file.path.display(), func.name);

    let fields = func.recv.as_deref().unwrap_or_default();
    if fields.len() != 1 {
        return Err(Error::unsupported(
            format!("receiver list with {} fields", fields.len()),
            location(),
        ));
    }

    let ty = &fields[0].ty;
    base_type_name(ty).ok_or_else(|| {
        Error::unsupported(format!("receiver of {} shape", ty.kind_name()), location())
    })
}

fn base_type_name(ty: &Expr) -> Option<&str> {
    match ty {
        Expr::Ident(name) => Some(name.as_str()),
        Expr::Star(inner) | Expr::Paren(inner) => base_type_name(inner),
        Expr::Index { x, .. } | Expr::IndexList { x, .. } => match x.as_ref() {
            Expr::Ident(name) => Some(name.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// Exported type names the function returns by pointer.
///
/// Only receiver-less functions are passed in; a method returning `*T`
/// never counts as a constructor.
fn constructed_types(func: &FuncDecl) -> Vec<String> {
    func.results
        .iter()
        .filter_map(|result| match &result.ty {
            Expr::Star(inner) => match inner.as_ref() {
                Expr::Ident(name) => Some(name),
                Expr::Index { x, .. } | Expr::IndexList { x, .. } => match x.as_ref() {
                    Expr::Ident(name) => Some(name),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .filter(|name| is_exported(name))
        .cloned()
        .collect()
}

/// Exported type names returned by value from any exported function or
/// method of the package. Generated and mock files count; test files are
/// not loaded for harvesting.
fn exposed_by_value(files: &[File]) -> BTreeSet<String> {
    files
        .iter()
        .flat_map(|file| file.func_decls())
        .filter(|func| is_exported(&func.name))
        .flat_map(|func| func.results.iter())
        .filter_map(|result| match &result.ty {
            Expr::Ident(name) if is_exported(name) => Some(name.clone()),
            _ => None,
        })
        .collect()
}
