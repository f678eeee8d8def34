use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a deadexport run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Subject package patterns, where unused exports are looked for
    pub input: Vec<String>,

    /// Caller package patterns, who may reference the subjects
    pub external: Vec<String>,

    /// Run independent pass actions on the rayon pool
    pub parallel: bool,

    /// Import path resolution
    pub resolver: ResolverConfig,

    /// File exclusions for method and constructor harvesting
    pub harvest: HarvestConfig,

    /// Package discovery
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Prefix shared by every import path of the analyzed universe.
    /// Defaults to the module path reported by the loader.
    pub root_namespace: Option<String>,

    /// Import path prefixes that never belong to the analyzed code
    pub excluded_prefixes: Vec<String>,

    /// Exact import paths that never belong to the analyzed code
    pub excluded_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// File name suffixes skipped entirely (tests, mocks)
    pub skip_suffixes: Vec<String>,

    /// Path fragments marking a test directory
    pub test_dirs: Vec<String>,

    /// File name suffixes of generated sources
    pub generated_suffixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Glob patterns of paths never loaded
    pub exclude: Vec<String>,

    /// Packages whose path contains one of these fragments are dropped
    pub skip_packages: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root_namespace: None,
            excluded_prefixes: vec![
                "k8s".to_string(),
                "golang.org".to_string(),
                "google.golang.org".to_string(),
                "github.com".to_string(),
                "gopkg.in".to_string(),
                "go.uber.org".to_string(),
                "cloud.google.com".to_string(),
            ],
            excluded_paths: vec![
                "encoding/gob".to_string(),
                "crypto/tls".to_string(),
                "hash/fnv".to_string(),
                "database/sql".to_string(),
                "encoding/json".to_string(),
                "net/http".to_string(),
            ],
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            skip_suffixes: vec!["_test.go".to_string(), "_mock.go".to_string()],
            test_dirs: vec!["/go/tests/".to_string()],
            generated_suffixes: vec![".pb.go".to_string()],
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "**/vendor/**".to_string(),
                "**/testdata/**".to_string(),
                "**/.git/**".to_string(),
            ],
            skip_packages: vec![],
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let parsed: std::result::Result<Self, String> = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
            "toml" => toml::from_str(&contents).map_err(|e| e.to_string()),
            _ => {
                // Try YAML first, then TOML
                serde_yaml::from_str(&contents)
                    .or_else(|_| toml::from_str(&contents))
                    .map_err(|e| e.to_string())
            }
        };

        parsed.map_err(|message| Error::Config {
            message: format!("{}: {}", path.display(), message),
        })
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".deadexport.yml",
            ".deadexport.yaml",
            ".deadexport.toml",
            "deadexport.yml",
            "deadexport.yaml",
            "deadexport.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }
}

impl LoaderConfig {
    /// Check if a path matches one of the exclusion globs
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    pub fn should_skip_package(&self, package: &str) -> bool {
        self.skip_packages
            .iter()
            .any(|fragment| package.contains(fragment.as_str()))
    }
}

/// Simple glob matching for patterns like "*_gen.go" or "**/vendor/**"
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.starts_with('*') && !pattern.contains('/') {
        // "*_gen.go" matches "model_gen.go"
        let suffix = &pattern[1..];
        return text.ends_with(suffix);
    }

    if pattern.ends_with('*') && !pattern.contains('/') {
        let prefix = &pattern[..pattern.len() - 1];
        return text.starts_with(prefix);
    }

    if pattern.contains("**") {
        // "**/vendor/**" must match a whole directory name: "/vendor/" but not "/vendored/"
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            let dir_name = pattern.replace("**/", "").replace("/**", "");
            let dir_name = dir_name.trim_matches('/');
            return text.contains(&format!("/{}/", dir_name))
                || text.starts_with(&format!("{}/", dir_name));
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }

            if prefix.is_empty() {
                return text.ends_with(suffix) || text.contains(&format!("/{}", suffix));
            }

            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("{}/", prefix));
            }

            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && (text.ends_with(suffix) || text.contains(&format!("/{}", suffix)));
        }
    }

    text == pattern
}
