//! Resource directory aggregation
//!
//! Copies files from a fixed table of patch resource directories into one
//! output tree, keyed by the final segment of each source path.

mod aggregator;

pub use aggregator::{AggregateError, AggregateStats, ResourceTreeAggregator};

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Copy table shipped with the tool: (source, excluded file names)
const DEFAULT_COPY_TABLE: &[(&str, &[&str])] = &[
    ("qualitybutton/drawable", &[]),
    ("settings/drawable", &[]),
    ("settings/menu", &[]),
    ("settings/layout", &["revanced_settings_with_toolbar.xml"]),
    ("sponsorblock/drawable", &[]),
    ("sponsorblock/layout", &["revanced_sb_skip_sponsor_button.xml"]),
    ("swipecontrols/drawable", &[]),
    ("copyvideourl/drawable", &[]),
    ("downloads/drawable", &[]),
    ("speedbutton/drawable", &[]),
];

/// A copy entry that cannot name a directory inside the output tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CopyEntryError {
    #[error("copy entry with an empty source path")]
    EmptySource,
    #[error("copy source must be relative: {0}")]
    Absolute(String),
    #[error("copy source has no usable final segment: {0}")]
    NoTarget(String),
}

/// One row of the copy table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyEntry {
    /// Source directory relative to the input root (e.g. `settings/drawable`)
    pub source: String,

    /// File names to skip; `None` copies everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

impl CopyEntry {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            exclude: None,
        }
    }

    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Output subdirectory: the last segment of the source path
    pub fn target_dir(&self) -> &str {
        self.source
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Check that the entry reads below the input root and writes below the output root
    pub fn validate(&self) -> Result<(), CopyEntryError> {
        let source = self.source.trim_end_matches('/');
        if source.is_empty() {
            return Err(CopyEntryError::EmptySource);
        }
        if source.starts_with('/') || Path::new(source).is_absolute() {
            return Err(CopyEntryError::Absolute(self.source.clone()));
        }
        match self.target_dir() {
            "" | "." | ".." => Err(CopyEntryError::NoTarget(self.source.clone())),
            _ => Ok(()),
        }
    }

    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude
            .as_ref()
            .map(|names| names.iter().any(|n| n == file_name))
            .unwrap_or(false)
    }
}

/// Ordered copy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySpec {
    entries: Vec<CopyEntry>,
}

impl CopySpec {
    pub fn new(entries: Vec<CopyEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CopyEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CopyEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CopySpec {
    fn default() -> Self {
        let entries = DEFAULT_COPY_TABLE
            .iter()
            .map(|(source, exclude)| {
                let entry = CopyEntry::new(*source);
                if exclude.is_empty() {
                    entry
                } else {
                    entry.with_exclude(exclude.iter().copied())
                }
            })
            .collect();
        Self { entries }
    }
}

impl FromIterator<CopyEntry> for CopySpec {
    fn from_iter<T: IntoIterator<Item = CopyEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
