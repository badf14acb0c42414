mod terminal;
mod json;

pub use terminal::TerminalReporter;
pub use json::JsonReporter;

use crate::resources::AggregateStats;
use crate::strings::GenerateStats;
use miette::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// String table generation, if it ran
    pub strings: Option<GenerateStats>,

    /// Resource aggregation, if it ran
    pub resources: Option<AggregateStats>,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

/// Prints the run summary and optionally writes it as JSON
pub struct Reporter {
    quiet: bool,
    verbose: bool,
    json_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(quiet: bool, verbose: bool, json_path: Option<PathBuf>) -> Self {
        Self {
            quiet,
            verbose,
            json_path,
        }
    }

    pub fn report(&self, summary: &RunSummary) -> Result<()> {
        if !self.quiet {
            TerminalReporter::new(self.verbose).report(summary);
        }
        if let Some(path) = &self.json_path {
            JsonReporter::new(path.clone()).report(summary)?;
        }
        Ok(())
    }
}
