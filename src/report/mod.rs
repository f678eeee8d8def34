mod terminal;
mod json;

pub use terminal::TerminalReporter;
pub use json::JsonReporter;

use crate::registry::UnusedExports;
use miette::Result;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for outputting unused exports
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    show_kind: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            show_kind: false,
        }
    }

    /// Show declaration kinds in terminal output
    pub fn with_kind(mut self, show: bool) -> Self {
        self.show_kind = show;
        self
    }

    /// Report the surviving declarations
    pub fn report(&self, unused: &UnusedExports) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => {
                let reporter =
                    TerminalReporter::new(self.output_path.clone()).with_kind(self.show_kind);
                reporter.report(unused)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(unused)
            }
        }
    }
}
