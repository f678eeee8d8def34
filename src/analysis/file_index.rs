// Per-file facts shared by the harvest and elimination passes

use crate::config::HarvestConfig;
use crate::error::Result;
use crate::scheduler::{Analyzer, AnalyzerResult, Pass};
use crate::syntax::File;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

pub const NAME: &str = "file-index";

/// Why a file is left out of method and constructor harvesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    TestFile,
    MockFile,
    TestDir,
    Generated,
}

/// Local import name -> raw import path for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportAliasTable {
    aliases: BTreeMap<String, String>,
}

impl ImportAliasTable {
    /// Explicit names win; otherwise the imported package's own name from
    /// `package_names` (import path -> package clause), falling back to the
    /// last path element for packages that were not loaded.
    /// Blank and dot imports cannot be referenced through a selector.
    pub fn from_file(file: &File, package_names: &BTreeMap<String, String>) -> Self {
        let mut aliases = BTreeMap::new();
        for spec in &file.imports {
            let alias = match spec.name.as_deref() {
                Some("_") | Some(".") => continue,
                Some(name) => name,
                None => match package_names.get(&spec.path) {
                    Some(name) => name.as_str(),
                    None => spec.path.rsplit('/').next().unwrap_or(&spec.path),
                },
            };
            aliases.insert(alias.to_string(), spec.path.clone());
        }
        Self { aliases }
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub exclusion: Option<Exclusion>,
    pub imports: ImportAliasTable,
}

/// One [`FileInfo`] per file of the package, in file order
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    pub files: Vec<FileInfo>,
}

impl FileIndex {
    pub fn build(
        files: &[File],
        config: &HarvestConfig,
        package_names: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            files: files
                .iter()
                .map(|file| FileInfo {
                    exclusion: classify(file, config),
                    imports: ImportAliasTable::from_file(file, package_names),
                })
                .collect(),
        }
    }

    /// Files taking part in method and constructor harvesting
    pub fn harvestable<'f>(&'f self, files: &'f [File]) -> impl Iterator<Item = &'f File> + 'f {
        files
            .iter()
            .zip(&self.files)
            .filter(|(_, info)| info.exclusion.is_none())
            .map(|(file, _)| file)
    }
}

fn classify(file: &File, config: &HarvestConfig) -> Option<Exclusion> {
    let name = file.file_name();
    let path = file.slash_path();

    if let Some(suffix) = config.skip_suffixes.iter().find(|s| name.ends_with(s.as_str())) {
        return Some(if suffix == "_test.go" {
            Exclusion::TestFile
        } else {
            Exclusion::MockFile
        });
    }
    if config.test_dirs.iter().any(|dir| path.contains(dir.as_str())) {
        return Some(Exclusion::TestDir);
    }
    if file.generated
        || config
            .generated_suffixes
            .iter()
            .any(|s| name.ends_with(s.as_str()))
    {
        return Some(Exclusion::Generated);
    }
    None
}

pub struct FileIndexAnalyzer {
    config: HarvestConfig,
}

impl FileIndexAnalyzer {
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }
}

impl Analyzer for FileIndexAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<Option<AnalyzerResult>> {
        let index = FileIndex::build(pass.files(), &self.config, &package_names(pass));
        for (file, info) in pass.files().iter().zip(&index.files) {
            if let Some(exclusion) = info.exclusion {
                trace!("{} excluded from harvest: {:?}", file.path.display(), exclusion);
            }
        }
        Ok(Some(Arc::new(index)))
    }
}

/// Import path -> package clause for every loaded import of the package,
/// plus the package itself for external test files importing it
fn package_names(pass: &Pass<'_>) -> BTreeMap<String, String> {
    let mut names: BTreeMap<String, String> = pass
        .package()
        .imports
        .keys()
        .filter_map(|import_path| {
            let imported = pass.imported_package(import_path)?;
            (!imported.name.is_empty()).then(|| (import_path.clone(), imported.name.clone()))
        })
        .collect();

    if let Some(own) = pass.own_import_path() {
        if !pass.package().name.is_empty() {
            names.insert(own, pass.package().name.clone());
        }
    }
    names
}
