use crate::registry::UnusedExports;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

/// Terminal reporter: each package path, then its unused names indented
pub struct TerminalReporter {
    output_path: Option<PathBuf>,

    /// Append the declaration kind to each name
    show_kind: bool,
}

impl TerminalReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self {
            output_path,
            show_kind: false,
        }
    }

    pub fn with_kind(mut self, show: bool) -> Self {
        self.show_kind = show;
        self
    }

    pub fn report(&self, unused: &UnusedExports) -> Result<()> {
        if let Some(path) = &self.output_path {
            colored::control::set_override(false);
            std::fs::write(path, self.render(unused)).into_diagnostic()?;
            colored::control::unset_override();
        } else {
            print!("{}", self.render(unused));
        }
        Ok(())
    }

    /// Empty when nothing is unused
    pub fn render(&self, unused: &UnusedExports) -> String {
        let mut out = String::new();
        for (package, names) in unused {
            out.push_str(&format!("{}\n", package.cyan().bold()));
            for (name, kind) in names {
                if self.show_kind {
                    out.push_str(&format!("    {} {}\n", name, kind.to_string().dimmed()));
                } else {
                    out.push_str(&format!("    {}\n", name));
                }
            }
        }
        out
    }
}
