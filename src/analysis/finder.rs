// Two-stage run: harvest the subjects, then eliminate every reference

use super::eliminate::{self, EliminateAnalyzer};
use super::file_index::FileIndexAnalyzer;
use super::harvest::{self, HarvestAnalyzer};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::loader::{check_errors, PackageLoader};
use crate::registry::{SharedRegistry, UnusedExports};
use crate::resolver::ReferenceResolver;
use crate::scheduler::{RunSummary, Scheduler};
use std::sync::Arc;
use tracing::{debug, info};

/// Finds exported declarations of subject packages nobody references
pub struct UnusedExportFinder {
    config: Config,
    parallel: bool,
}

impl UnusedExportFinder {
    pub fn new(config: Config) -> Self {
        let parallel = config.parallel;
        Self { config, parallel }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Harvest `subjects`, then eliminate every reference found in
    /// `subjects` and `callers` (test files included).
    pub fn run(
        &self,
        loader: &dyn PackageLoader,
        subjects: &[String],
        callers: &[String],
    ) -> Result<UnusedExports> {
        if subjects.is_empty() {
            return Err(Error::NoSubjects);
        }

        let registry = Arc::new(SharedRegistry::new());

        info!("Loading {} subject patterns...", subjects.len());
        let program = loader.load(subjects, false)?;
        check_errors(&program, subjects)?;

        let mut scheduler = Scheduler::new(&program)
            .with_analyzer(FileIndexAnalyzer::new(self.config.harvest.clone()))
            .with_analyzer(HarvestAnalyzer::new(Arc::clone(&registry)))
            .parallel(self.parallel);
        let summary = scheduler.run(harvest::NAME, &program.roots)?;
        log_diagnostics(&summary);

        registry.seal();
        info!(
            "Harvested {} exported declarations from {} packages",
            registry.declaration_count(),
            registry.known_packages().len()
        );

        let resolver = Arc::new(ReferenceResolver::new(
            registry.known_packages(),
            &self.config.resolver,
            program.root_namespace.as_deref(),
        ));

        let patterns: Vec<String> = subjects.iter().chain(callers).cloned().collect();
        info!("Loading {} patterns with tests...", patterns.len());
        let program = loader.load(&patterns, true)?;
        check_errors(&program, &patterns)?;

        let mut scheduler = Scheduler::new(&program)
            .with_analyzer(FileIndexAnalyzer::new(self.config.harvest.clone()))
            .with_analyzer(EliminateAnalyzer::new(Arc::clone(&registry), Arc::clone(&resolver)))
            .parallel(self.parallel);
        let summary = scheduler.run(eliminate::NAME, &program.roots)?;
        log_diagnostics(&summary);

        let unused = registry.unused();
        info!(
            "{} unused exported declarations in {} packages ({} resolved imports cached)",
            unused.values().map(|names| names.len()).sum::<usize>(),
            unused.len(),
            resolver.cached_len()
        );
        Ok(unused)
    }
}

fn log_diagnostics(summary: &RunSummary) {
    debug!("{} actions executed", summary.actions);
    for diagnostic in &summary.diagnostics {
        debug!("{}", diagnostic);
    }
}
