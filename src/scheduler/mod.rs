//! Dependency-aware execution of analyzers over packages.
//!
//! Every (analyzer, package) pair becomes one action in a petgraph arena.
//! Actions are built recursively and memoized: an analyzer's requirements
//! are added for the same package, and an analyzer that uses facts is also
//! added for every package imported by this one. Each action runs at most
//! once; its outcome is shared with every dependent.

mod pass;

pub use pass::{AnalyzerResult, Diagnostic, FactStore, Pass};

use crate::error::{Error, Result};
use crate::loader::Program;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// One analysis, run once per package
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Analyzers that must complete on the same package first
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    /// Whether this analyzer exchanges facts with the packages it imports
    fn uses_facts(&self) -> bool {
        false
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<Option<AnalyzerResult>>;
}

#[derive(Clone)]
struct Outcome {
    result: Result<Option<AnalyzerResult>>,
    diagnostics: Vec<Diagnostic>,
    duration: Duration,
}

struct Action {
    analyzer: usize,
    package: String,
    deps: Vec<NodeIndex>,
    outcome: OnceLock<Outcome>,
}

/// Diagnostics and counts of one scheduler run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Actions executed, prerequisites included
    pub actions: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds and executes the action graph for one program
pub struct Scheduler<'p> {
    program: &'p Program,
    analyzers: Vec<Arc<dyn Analyzer>>,
    by_name: HashMap<&'static str, usize>,
    graph: DiGraph<Action, ()>,
    actions: HashMap<(usize, String), NodeIndex>,
    facts: FactStore,
    parallel: bool,
}

impl<'p> Scheduler<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            analyzers: Vec::new(),
            by_name: HashMap::new(),
            graph: DiGraph::new(),
            actions: HashMap::new(),
            facts: FactStore::default(),
            parallel: false,
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.register(Arc::new(analyzer));
        self
    }

    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        self.by_name.insert(analyzer.name(), self.analyzers.len());
        self.analyzers.push(analyzer);
    }

    /// Run independent actions on the rayon pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    /// Run `analyzer` on every root package, prerequisites first.
    ///
    /// Roots are executed in order; the first failing root aborts the run.
    pub fn run(&mut self, analyzer: &str, roots: &[String]) -> Result<RunSummary> {
        let index = self.analyzer_index(analyzer)?;

        let mut root_nodes = Vec::with_capacity(roots.len());
        for root in roots {
            if self.program.package(root).is_none() {
                warn!("Package {} was not loaded, skipping", root);
                continue;
            }
            root_nodes.push(self.mk_action(index, root)?);
        }
        self.check_cycles()?;

        debug!(
            "Running {} on {} packages ({} actions)",
            analyzer,
            root_nodes.len(),
            self.graph.node_count()
        );

        if self.parallel {
            let outcomes: Vec<Outcome> = root_nodes.par_iter().map(|&node| self.execute(node)).collect();
            for outcome in outcomes {
                outcome.result?;
            }
        } else {
            for &node in &root_nodes {
                self.execute(node).result?;
            }
        }

        Ok(self.summary())
    }

    /// Result of an executed action
    pub fn result(&self, analyzer: &str, package: &str) -> Option<AnalyzerResult> {
        let index = *self.by_name.get(analyzer)?;
        let node = self.actions.get(&(index, package.to_string()))?;
        match &self.graph[*node].outcome.get()?.result {
            Ok(result) => result.clone(),
            Err(_) => None,
        }
    }

    fn analyzer_index(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::MissingAnalyzer {
                name: name.to_string(),
            })
    }

    fn mk_action(&mut self, analyzer: usize, package: &str) -> Result<NodeIndex> {
        let key = (analyzer, package.to_string());
        if let Some(&node) = self.actions.get(&key) {
            return Ok(node);
        }

        // Inserted before its dependencies so that a cycle terminates here
        let node = self.graph.add_node(Action {
            analyzer,
            package: package.to_string(),
            deps: Vec::new(),
            outcome: OnceLock::new(),
        });
        self.actions.insert(key, node);

        let definition = Arc::clone(&self.analyzers[analyzer]);
        for required in definition.requires() {
            let required = self.analyzer_index(required)?;
            let dep = self.mk_action(required, package)?;
            self.add_dep(node, dep);
        }

        if definition.uses_facts() {
            let imports: Vec<String> = self
                .program
                .package(package)
                .map(|pkg| {
                    pkg.imports
                        .values()
                        .filter(|canonical| self.program.package(canonical).is_some())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            for import in imports {
                let dep = self.mk_action(analyzer, &import)?;
                self.add_dep(node, dep);
            }
        }

        Ok(node)
    }

    fn add_dep(&mut self, node: NodeIndex, dep: NodeIndex) {
        self.graph[node].deps.push(dep);
        self.graph.add_edge(node, dep, ());
    }

    fn check_cycles(&self) -> Result<()> {
        toposort(&self.graph, None).map(|_| ()).map_err(|cycle| Error::ImportCycle {
            package: self.graph[cycle.node_id()].package.clone(),
        })
    }

    fn execute(&self, node: NodeIndex) -> Outcome {
        let action = &self.graph[node];
        if let Some(done) = action.outcome.get() {
            return done.clone();
        }

        let deps: Vec<(NodeIndex, Outcome)> = if self.parallel {
            action
                .deps
                .par_iter()
                .map(|&dep| (dep, self.execute(dep)))
                .collect()
        } else {
            action
                .deps
                .iter()
                .map(|&dep| (dep, self.execute(dep)))
                .collect()
        };

        action
            .outcome
            .get_or_init(|| self.run_action(action, deps))
            .clone()
    }

    fn run_action(&self, action: &Action, deps: Vec<(NodeIndex, Outcome)>) -> Outcome {
        let analyzer = &self.analyzers[action.analyzer];
        let failed = |err: Error| Outcome {
            result: Err(err),
            diagnostics: Vec::new(),
            duration: Duration::ZERO,
        };

        let mut results = HashMap::new();
        for (dep, outcome) in deps {
            let dep = &self.graph[dep];
            match outcome.result {
                Err(err) => return failed(err),
                Ok(Some(result)) if dep.package == action.package => {
                    results.insert(self.analyzers[dep.analyzer].name(), result);
                }
                Ok(_) => {}
            }
        }

        let Some(package) = self.program.package(&action.package) else {
            return failed(Error::NoPackages {
                patterns: action.package.clone(),
            });
        };

        let start = Instant::now();
        let mut pass = Pass::new(analyzer.name(), self.program, package, results, &self.facts);
        let result = analyzer.run(&mut pass);
        let duration = start.elapsed();
        trace!(
            "{} on {} finished in {:?}",
            analyzer.name(),
            action.package,
            duration
        );

        Outcome {
            result,
            diagnostics: pass.into_diagnostics(),
            duration,
        }
    }

    fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for action in self.graph.node_weights() {
            if let Some(outcome) = action.outcome.get() {
                summary.actions += 1;
                summary.diagnostics.extend(outcome.diagnostics.iter().cloned());
            }
        }
        let total: Duration = self
            .graph
            .node_weights()
            .filter_map(|action| action.outcome.get())
            .map(|outcome| outcome.duration)
            .sum();
        debug!("{} actions ran in {:?}", summary.actions, total);
        summary
    }
}
