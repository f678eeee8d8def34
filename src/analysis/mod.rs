//! Analyzers of the two stages and the run that ties them together.
//!
//! - [`file_index`] classifies files and builds their import alias tables.
//! - [`harvest`] records the exported surface of every subject package.
//! - [`eliminate`] removes each qualified reference from that surface.
//!
//! [`UnusedExportFinder`] schedules the harvest over the subjects, seals the
//! registry, then schedules elimination over subjects and callers.

pub mod eliminate;
pub mod file_index;
pub mod harvest;
mod finder;

pub use eliminate::{EliminateAnalyzer, Eliminated};
pub use file_index::{Exclusion, FileIndex, FileIndexAnalyzer, ImportAliasTable};
pub use finder::UnusedExportFinder;
pub use harvest::HarvestAnalyzer;
