use crate::registry::UnusedExports;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, unused: &UnusedExports) -> Result<()> {
        let json = self.render(unused)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            eprintln!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    pub fn render(&self, unused: &UnusedExports) -> Result<String> {
        let report = JsonReport::from_unused(unused);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    total: usize,
    packages: Vec<JsonPackage<'a>>,
}

#[derive(Serialize)]
struct JsonPackage<'a> {
    path: &'a str,
    unused: Vec<JsonDeclaration<'a>>,
}

#[derive(Serialize)]
struct JsonDeclaration<'a> {
    name: &'a str,
    kind: &'static str,
}

impl<'a> JsonReport<'a> {
    fn from_unused(unused: &'a UnusedExports) -> Self {
        let packages: Vec<JsonPackage<'a>> = unused
            .iter()
            .map(|(path, names)| JsonPackage {
                path,
                unused: names
                    .iter()
                    .map(|(name, kind)| JsonDeclaration {
                        name,
                        kind: kind.display_name(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION"),
            total: packages.iter().map(|p| p.unused.len()).sum(),
            packages,
        }
    }
}
