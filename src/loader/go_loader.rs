use super::{ErrorKind, Package, PackageError, PackageLoader, Program};
use crate::config::LoaderConfig;
use crate::discovery::{FileFinder, FileType, PackageDir};
use crate::error::{Error, Result};
use crate::parser::{GoParser, Parser};
use crate::syntax::{Decl, File, ObjectKind, Scope, ValueKeyword};
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Loads Go packages of one module from disk
pub struct GoLoader {
    root: PathBuf,
    module: String,
    config: LoaderConfig,
}

impl GoLoader {
    /// Open the module rooted at `root`, which must contain a `go.mod`
    pub fn new(root: impl Into<PathBuf>, config: LoaderConfig) -> Result<Self> {
        let root = root.into();
        let go_mod = root.join("go.mod");
        if !go_mod.is_file() {
            return Err(Error::ModuleNotFound {
                root: root.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&go_mod).map_err(|e| Error::io(&go_mod, e))?;
        let module = module_path(&contents).ok_or_else(|| Error::ModuleNotFound {
            root: root.display().to_string(),
        })?;
        debug!("Module {} at {}", module, root.display());

        Ok(Self {
            root,
            module,
            config,
        })
    }

    pub fn module_path(&self) -> &str {
        &self.module
    }

    /// Canonical path of a package directory relative to the module root
    fn canonical(&self, relative: &str) -> String {
        if relative.is_empty() {
            self.module.clone()
        } else {
            relative.to_string()
        }
    }

    /// Module-relative directory of a local import path
    fn local_dir<'p>(&self, import_path: &'p str) -> Option<&'p str> {
        if import_path == self.module {
            return Some("");
        }
        import_path
            .strip_prefix(self.module.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Relative directories matched by the patterns, in pattern order
    fn match_patterns(&self, patterns: &[String], dirs: &BTreeMap<String, PackageDir>) -> Vec<String> {
        let mut matched: Vec<String> = Vec::new();

        for pattern in patterns {
            let pattern = pattern.trim();
            let (base, recursive) = match pattern.strip_suffix("...") {
                Some(base) => (base.trim_end_matches('/'), true),
                None => (pattern.trim_end_matches('/'), false),
            };
            let base = self
                .local_dir(base)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    let base = base.strip_prefix("./").unwrap_or(base);
                    if base == "." {
                        String::new()
                    } else {
                        base.to_string()
                    }
                });

            let hits: Vec<&String> = dirs
                .keys()
                .filter(|dir| {
                    if recursive {
                        base.is_empty() || **dir == base || dir.starts_with(&format!("{}/", base))
                    } else {
                        **dir == base
                    }
                })
                .collect();
            trace!("Pattern {} matched {} packages", pattern, hits.len());

            for hit in hits {
                if !matched.contains(hit) {
                    matched.push(hit.clone());
                }
            }
        }

        matched
    }

    fn load_package(&self, relative: &str, package_dir: &PackageDir) -> Package {
        let mut package = Package {
            path: self.canonical(relative),
            dir: package_dir.dir.clone(),
            ..Package::default()
        };

        let parsed: Vec<(bool, std::result::Result<(File, Vec<String>), String>)> = package_dir
            .files
            .par_iter()
            .map(|source| {
                let is_test = source.file_type == FileType::Test;
                let outcome = source
                    .read_contents()
                    .map_err(|e| format!("{}: {}", source.path.display(), e))
                    .and_then(|contents| {
                        GoParser::new()
                            .parse(&source.path, &contents)
                            .map(|result| (result.file, result.errors))
                            .map_err(|e| e.to_string())
                    });
                (is_test, outcome)
            })
            .collect();

        let mut sources: Vec<(bool, File)> = Vec::new();
        for (is_test, outcome) in parsed {
            match outcome {
                Ok((file, errors)) => {
                    package.errors.extend(
                        errors
                            .into_iter()
                            .map(|message| PackageError::new(ErrorKind::Parse, message)),
                    );
                    sources.push((is_test, file));
                }
                Err(message) => package
                    .errors
                    .push(PackageError::new(ErrorKind::List, message)),
            }
        }

        package.name = package_name(&sources, &mut package.errors);
        let non_test = sources.iter().filter(|(is_test, _)| !is_test).map(|(_, file)| file);
        package.scope = build_scope(non_test, &mut package.errors);
        package.files = sources.into_iter().map(|(_, file)| file).collect();
        package
    }
}

impl PackageLoader for GoLoader {
    fn load(&self, patterns: &[String], include_tests: bool) -> Result<Program> {
        let dirs = FileFinder::new(&self.config).find_packages(&self.root, include_tests);

        let roots: Vec<String> = self
            .match_patterns(patterns, &dirs)
            .into_iter()
            .filter(|dir| {
                let skip = self.config.should_skip_package(&self.canonical(dir));
                if skip {
                    debug!("Skipping package {}", self.canonical(dir));
                }
                !skip
            })
            .collect();

        let mut program = Program {
            root_namespace: Some(self.module.clone()),
            ..Program::default()
        };

        let mut seen: BTreeSet<String> = roots.iter().cloned().collect();
        let mut queue: VecDeque<String> = roots.iter().cloned().collect();

        while let Some(relative) = queue.pop_front() {
            let Some(package_dir) = dirs.get(&relative) else {
                continue;
            };
            let mut package = self.load_package(&relative, package_dir);

            let import_paths: BTreeSet<&str> = package
                .files
                .iter()
                .flat_map(|file| file.imports.iter().map(|spec| spec.path.as_str()))
                .collect();
            let mut imports = BTreeMap::new();
            for import_path in import_paths {
                let Some(dep) = self.local_dir(import_path) else {
                    continue;
                };
                // External test files import their own package
                if dep == relative || !dirs.contains_key(dep) {
                    continue;
                }
                imports.insert(import_path.to_string(), self.canonical(dep));
                if seen.insert(dep.to_string()) {
                    queue.push_back(dep.to_string());
                }
            }
            package.imports = imports;

            program.packages.insert(package.path.clone(), package);
        }

        program.roots = roots.iter().map(|dir| self.canonical(dir)).collect();

        info!(
            "Loaded {} packages ({} matched{})",
            program.packages.len(),
            program.roots.len(),
            if include_tests { ", with tests" } else { "" }
        );
        Ok(program)
    }
}

fn module_path(go_mod: &str) -> Option<String> {
    let re = Regex::new(r#"(?m)^\s*module\s+"?([^\s"]+)"?"#).ok()?;
    re.captures(go_mod)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Package name of the non-test files; conflicting clauses are list errors
fn package_name(sources: &[(bool, File)], errors: &mut Vec<PackageError>) -> String {
    let mut name: Option<(&str, &Path)> = None;

    for (is_test, file) in sources {
        if *is_test || file.package_name.is_empty() {
            continue;
        }
        match name {
            None => name = Some((file.package_name.as_str(), file.path.as_path())),
            Some((first, first_path)) if first != file.package_name => {
                errors.push(PackageError::new(
                    ErrorKind::List,
                    format!(
                        "found packages {} ({}) and {} ({})",
                        first,
                        first_path.display(),
                        file.package_name,
                        file.path.display()
                    ),
                ));
            }
            Some(_) => {}
        }
    }

    let name = match name {
        Some((name, _)) => name.to_string(),
        None => sources
            .iter()
            .map(|(_, file)| file.package_name.trim_end_matches("_test"))
            .find(|n| !n.is_empty())
            .unwrap_or_default()
            .to_string(),
    };

    for (is_test, file) in sources {
        let external = format!("{}_test", name);
        if *is_test && file.package_name != name && file.package_name != external {
            errors.push(PackageError::new(
                ErrorKind::List,
                format!(
                    "found packages {} and {} ({})",
                    name,
                    file.package_name,
                    file.path.display()
                ),
            ));
        }
    }

    name
}

/// Package-level symbol table from top-level declarations
fn build_scope<'a>(files: impl Iterator<Item = &'a File>, errors: &mut Vec<PackageError>) -> Scope {
    let mut scope = Scope::new();

    let mut declare = |name: &str, kind: ObjectKind, file: &File| {
        if name == "_" || (kind == ObjectKind::Func && name == "init") {
            return;
        }
        if scope.insert(name, kind).is_some() {
            errors.push(PackageError::new(
                ErrorKind::Type,
                format!("{}: {} redeclared in this block", file.path.display(), name),
            ));
        }
    };

    for file in files {
        for decl in &file.decls {
            match decl {
                Decl::Func(func) if !func.is_method() => declare(&func.name, ObjectKind::Func, file),
                Decl::Func(_) => {}
                Decl::Value(spec) => {
                    let kind = match spec.keyword {
                        ValueKeyword::Const => ObjectKind::Const,
                        ValueKeyword::Var => ObjectKind::Var,
                    };
                    for name in &spec.names {
                        declare(name, kind, file);
                    }
                }
                Decl::Type(spec) => declare(&spec.name, ObjectKind::TypeName, file),
            }
        }
    }

    scope
}
