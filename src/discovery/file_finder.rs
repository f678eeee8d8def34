use crate::config::LoaderConfig;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Kind of Go source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Source,
    Test,
}

impl FileType {
    /// Determine file type from path
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        let file_name = path.file_name()?.to_str()?;

        if extension != "go" {
            return None;
        }
        if file_name.ends_with("_test.go") {
            Some(FileType::Test)
        } else {
            Some(FileType::Source)
        }
    }
}

/// Represents a discovered source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    pub file_type: FileType,
}

impl SourceFile {
    pub fn new(path: PathBuf, file_type: FileType) -> Self {
        Self { path, file_type }
    }

    pub fn read_contents(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

/// Go files of one directory, which is one package
#[derive(Debug, Clone)]
pub struct PackageDir {
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
}

/// File finder for discovering Go packages under a module root
pub struct FileFinder<'a> {
    config: &'a LoaderConfig,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a LoaderConfig) -> Self {
        Self { config }
    }

    /// Package directories under `root`, keyed by their path relative to it
    /// (`""` for the root itself). Test files are only kept when `with_tests`.
    pub fn find_packages(&self, root: &Path, with_tests: bool) -> BTreeMap<String, PackageDir> {
        debug!("Scanning for Go packages in: {}", root.display());

        let mut packages: BTreeMap<String, PackageDir> = BTreeMap::new();
        for file in self.scan_directory(root) {
            if file.file_type == FileType::Test && !with_tests {
                continue;
            }
            let Some(dir) = file.path.parent() else {
                continue;
            };
            let relative = dir
                .strip_prefix(root)
                .unwrap_or(dir)
                .to_string_lossy()
                .replace('\\', "/");

            packages
                .entry(relative)
                .or_insert_with(|| PackageDir {
                    dir: dir.to_path_buf(),
                    files: Vec::new(),
                })
                .files
                .push(file);
        }

        for package in packages.values_mut() {
            package.files.sort_by(|a, b| a.path.cmp(&b.path));
        }

        debug!("Found {} package directories", packages.len());
        packages
    }

    /// Scan a single directory for Go source files
    fn scan_directory(&self, dir: &Path) -> Vec<SourceFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)           // Skip hidden files
            .git_ignore(true)       // Respect .gitignore
            .git_global(true)       // Respect global gitignore
            .git_exclude(true)      // Respect .git/info/exclude
            .ignore(true)           // Respect .ignore files
            .parents(true)          // Check parent directories for ignore files
            .follow_links(false)    // Don't follow symlinks
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();

                if self.config.should_exclude(path) {
                    trace!("Excluding: {}", path.display());
                    return None;
                }

                let file_type = FileType::from_path(path)?;

                trace!("Found {:?}: {}", file_type, path.display());
                Some(SourceFile::new(path.to_path_buf(), file_type))
            })
            .collect()
    }
}
