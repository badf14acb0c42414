//! resmerge - build-time aggregation of Android resources from patch bundles
//!
//! This library assembles the generated resource input of an Android build
//! from independently maintained patch bundles.
//!
//! # Architecture
//!
//! The pipeline consists of two independent components:
//! 1. **String tables** - Unwrap patch-authoring `strings.xml`/`arrays.xml`
//!    documents into standard `<resources>` documents, first key wins
//! 2. **Resource trees** - Rebuild an output tree from a table of source
//!    directories, honoring per-directory exclusion lists
//!
//! Both are driven by [`Pipeline`], configured by [`Config`], and can be
//! rerun on change by the [`watch`] module.

pub mod config;
pub mod pipeline;
pub mod report;
pub mod resources;
pub mod strings;
pub mod watch;

pub use config::{Config, MissingKeyPolicy};
pub use pipeline::{DirPair, Pipeline, PipelineError};
pub use report::{Reporter, RunSummary};
pub use resources::{AggregateStats, CopyEntry, CopySpec, ResourceTreeAggregator};
pub use strings::{GenerateStats, ResourceNode, StringTableGenerator, StringTableUnwrapper};
