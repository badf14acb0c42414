// Pipeline driver: runs the string generator and the resource aggregator
// for one build, alone or side by side.

use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::report::RunSummary;
use crate::resources::{AggregateError, ResourceTreeAggregator};
use crate::strings::{StringTableGenerator, UnwrapError};

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("String generation failed: {0}")]
    Strings(#[from] UnwrapError),
    #[error("Resource aggregation failed: {0}")]
    Resources(#[from] AggregateError),
}

/// Input and output directories of one component
#[derive(Debug, Clone)]
pub struct DirPair {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl DirPair {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Runs the configured components
pub struct Pipeline<'a> {
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Generate string tables only
    pub fn run_strings(&self, dirs: &DirPair) -> Result<RunSummary, PipelineError> {
        self.run_strings_with_progress(dirs, |_| {})
    }

    /// Generate string tables, reporting each finished variant
    pub fn run_strings_with_progress<F>(&self, dirs: &DirPair, on_variant: F) -> Result<RunSummary, PipelineError>
    where
        F: Fn(&str) + Sync,
    {
        let start = Instant::now();
        let stats = StringTableGenerator::new(&self.config.strings).generate_with_progress(
            &dirs.input,
            &dirs.output,
            on_variant,
        )?;
        Ok(RunSummary {
            strings: Some(stats),
            resources: None,
            elapsed: start.elapsed(),
        })
    }

    /// Aggregate resource directories only
    pub fn run_resources(&self, dirs: &DirPair) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();
        let stats = ResourceTreeAggregator::from_config(&self.config.resources).aggregate(
            &dirs.input,
            &dirs.output,
            &self.config.copy_spec(),
        )?;
        Ok(RunSummary {
            strings: None,
            resources: Some(stats),
            elapsed: start.elapsed(),
        })
    }

    /// Run both components concurrently; they share no state
    pub fn run_all(&self, strings: &DirPair, resources: &DirPair) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();
        info!("Running string generation and resource aggregation");

        let (strings_result, resources_result) =
            rayon::join(|| self.run_strings(strings), || self.run_resources(resources));

        let strings_summary = strings_result?;
        let resources_summary = resources_result?;

        Ok(RunSummary {
            strings: strings_summary.strings,
            resources: resources_summary.resources,
            elapsed: start.elapsed(),
        })
    }
}
