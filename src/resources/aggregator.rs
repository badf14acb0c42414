// Clean-slate resource tree aggregation

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use super::{CopyEntryError, CopySpec};
use crate::config::ResourcesConfig;

/// Aggregation errors
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Output directory has no file name: {0}")]
    InvalidOutput(PathBuf),
    #[error("Invalid copy entry: {0}")]
    InvalidEntry(#[from] CopyEntryError),
    #[error("Output directory {output} contains the input directory {input}")]
    OutputContainsInput { input: PathBuf, output: PathBuf },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> AggregateError + '_ {
    move |source| AggregateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Counts for one aggregation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    /// Files copied into the output tree
    pub copied: usize,
    /// Files skipped by an exclusion list
    pub excluded: usize,
    /// Copies that replaced a file from an earlier table entry
    pub overwritten: usize,
    /// Table entries whose source directory does not exist
    pub missing_sources: usize,
}

impl std::fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files copied ({} excluded, {} overwritten, {} missing sources)",
            self.copied, self.excluded, self.overwritten, self.missing_sources
        )
    }
}

/// Rebuilds an output tree from the directories named in a copy table
#[derive(Debug, Clone, Default)]
pub struct ResourceTreeAggregator {
    atomic: bool,
}

impl ResourceTreeAggregator {
    pub fn new() -> Self {
        Self { atomic: false }
    }

    pub fn from_config(config: &ResourcesConfig) -> Self {
        Self {
            atomic: config.atomic,
        }
    }

    /// Build into a staging directory and swap it in on success
    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Replace `output_dir` with the files selected by `spec` from `input_dir`
    pub fn aggregate(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        spec: &CopySpec,
    ) -> Result<AggregateStats, AggregateError> {
        info!(
            "Aggregating {} resource directories from {} into {}",
            spec.len(),
            input_dir.display(),
            output_dir.display()
        );

        let result = check_layout(input_dir, output_dir, spec).and_then(|_| {
            if self.atomic {
                self.aggregate_staged(input_dir, output_dir, spec)
            } else {
                clean(output_dir).and_then(|_| copy_entries(input_dir, output_dir, spec))
            }
        });

        match &result {
            Ok(stats) => info!("Resources: {}", stats),
            Err(e) => error!("Resource aggregation failed: {}", e),
        }
        result
    }

    /// Sibling directory `.<name>.staging` next to `output_dir`
    pub fn staging_dir(output_dir: &Path) -> Result<PathBuf, AggregateError> {
        let name = output_dir
            .file_name()
            .ok_or_else(|| AggregateError::InvalidOutput(output_dir.to_path_buf()))?;
        let staging_name = format!(".{}.staging", name.to_string_lossy());
        Ok(match output_dir.parent() {
            Some(parent) => parent.join(staging_name),
            None => PathBuf::from(staging_name),
        })
    }

    fn aggregate_staged(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        spec: &CopySpec,
    ) -> Result<AggregateStats, AggregateError> {
        let staging = Self::staging_dir(output_dir)?;
        debug!("Staging into {}", staging.display());

        let stats = match clean(&staging).and_then(|_| copy_entries(input_dir, &staging, spec)) {
            Ok(stats) => stats,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    warn!("Failed to remove {}: {}", staging.display(), cleanup);
                }
                return Err(e);
            }
        };

        if output_dir.exists() {
            fs::remove_dir_all(output_dir).map_err(io_error(output_dir))?;
        }
        fs::rename(&staging, output_dir).map_err(io_error(output_dir))?;
        Ok(stats)
    }
}

/// Reject tables and directory layouts that would write outside `output_dir`
/// or delete the sources before they are copied
fn check_layout(input_dir: &Path, output_dir: &Path, spec: &CopySpec) -> Result<(), AggregateError> {
    for entry in spec.entries() {
        entry.validate()?;
    }

    if let (Ok(input), Ok(output)) = (fs::canonicalize(input_dir), fs::canonicalize(output_dir)) {
        if input.starts_with(&output) {
            return Err(AggregateError::OutputContainsInput { input, output });
        }
    }
    Ok(())
}

fn clean(dir: &Path) -> Result<(), AggregateError> {
    if dir.exists() {
        debug!("Removing {}", dir.display());
        fs::remove_dir_all(dir).map_err(io_error(dir))?;
    }
    fs::create_dir_all(dir).map_err(io_error(dir))
}

fn copy_entries(input_dir: &Path, output_dir: &Path, spec: &CopySpec) -> Result<AggregateStats, AggregateError> {
    let mut stats = AggregateStats::default();

    for entry in spec.entries() {
        let source_dir = input_dir.join(&entry.source);
        if !source_dir.is_dir() {
            debug!("Source directory does not exist: {}", source_dir.display());
            stats.missing_sources += 1;
            continue;
        }

        let target_dir = output_dir.join(entry.target_dir());
        for file in list_files(&source_dir)? {
            let os_name = match file.file_name() {
                Some(name) => name,
                None => continue,
            };
            let file_name = os_name.to_string_lossy();

            if entry.is_excluded(&file_name) {
                trace!("Excluding {}", file.display());
                stats.excluded += 1;
                continue;
            }

            fs::create_dir_all(&target_dir).map_err(io_error(&target_dir))?;
            let destination = target_dir.join(os_name);
            if destination.exists() {
                debug!(
                    "{} overwrites an earlier {}/{}",
                    file.display(),
                    entry.target_dir(),
                    file_name
                );
                stats.overwritten += 1;
            }

            fs::copy(&file, &destination).map_err(io_error(&destination))?;
            stats.copied += 1;
        }
    }

    Ok(stats)
}

/// Regular files directly inside `dir`, sorted by name
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, AggregateError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
