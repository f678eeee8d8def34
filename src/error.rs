use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions of an analysis run.
///
/// There is no recoverable class: every variant aborts the run. The enum is
/// `Clone` so a one-shot action can hand the same outcome to every dependent.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum Error {
    #[error("unsupported construct {construct} in {location}")]
    #[diagnostic(
        code(deadexport::unsupported_construct),
        help("the analysis refuses to guess about shapes it does not recognize")
    )]
    UnsupportedConstruct { construct: String, location: String },

    #[error("no input packages given")]
    #[diagnostic(code(deadexport::no_subjects), help("pass at least one -i <PATTERN>"))]
    NoSubjects,

    #[error("{patterns} matched no packages")]
    #[diagnostic(code(deadexport::no_packages))]
    NoPackages { patterns: String },

    #[error("{summary}")]
    #[diagnostic(code(deadexport::loading))]
    Loading { summary: String, details: Vec<String> },

    #[error("import cycle through package {package}")]
    #[diagnostic(code(deadexport::import_cycle))]
    ImportCycle { package: String },

    #[error("analyzer `{name}` is required but was not registered")]
    #[diagnostic(code(deadexport::missing_analyzer))]
    MissingAnalyzer { name: String },

    #[error("registry is sealed: cannot harvest {package} after elimination started")]
    #[diagnostic(code(deadexport::registry_sealed))]
    RegistrySealed { package: String },

    #[error("no go.mod found in {root}")]
    #[diagnostic(code(deadexport::module_not_found), help("point --root at the module directory"))]
    ModuleNotFound { root: String },

    #[error("failed to read {path}: {message}")]
    #[diagnostic(code(deadexport::io))]
    Io { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(deadexport::config))]
    Config { message: String },
}

impl Error {
    pub fn unsupported(construct: impl Into<String>, location: impl Into<String>) -> Self {
        Error::UnsupportedConstruct {
            construct: construct.into(),
            location: location.into(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}
