//! String table generation
//!
//! Turns the patch-authoring string bundles (`<input>/<variant>/strings.xml`
//! plus the shared `<input>/values/arrays.xml`) into standard resource
//! documents under the output directory.

mod node;
mod unwrap;

pub use node::{nodes_at_depth, ResourceNode, XmlError, ENTRY_DEPTH, KEY_ATTRIBUTE};
pub use unwrap::{
    DeduplicationSet, DocumentError, StringTableUnwrapper, UnwrapError, UnwrapStats, OUTPUT_ROOT,
};

use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::config::StringsConfig;

/// File name of each variant's string table
pub const STRINGS_FILE: &str = "strings.xml";

/// Shared array document, relative to the input and output directories
pub const SHARED_ARRAYS: &str = "values/arrays.xml";

/// Result of unwrapping one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantStats {
    pub variant: String,
    #[serde(flatten)]
    pub stats: UnwrapStats,
}

/// Result of a full generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateStats {
    pub variants: Vec<VariantStats>,
    pub arrays: UnwrapStats,
}

impl GenerateStats {
    pub fn total_entries(&self) -> usize {
        self.variants.iter().map(|v| v.stats.entries).sum::<usize>() + self.arrays.entries
    }

    pub fn total_duplicates(&self) -> usize {
        self.variants.iter().map(|v| v.stats.duplicates).sum::<usize>() + self.arrays.duplicates
    }
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} variants, {} entries written ({} duplicates dropped)",
            self.variants.len(),
            self.total_entries(),
            self.total_duplicates()
        )
    }
}

/// Generates every variant's string table plus the shared arrays
pub struct StringTableGenerator {
    unwrapper: StringTableUnwrapper,
    parallel: bool,
}

impl StringTableGenerator {
    pub fn new(config: &StringsConfig) -> Self {
        Self {
            unwrapper: StringTableUnwrapper::from_config(config),
            parallel: config.parallel,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Subdirectory names of `input_dir`, sorted
    pub fn find_variants(input_dir: &Path) -> Result<Vec<String>, UnwrapError> {
        let io_error = |source: std::io::Error| UnwrapError::Io {
            path: input_dir.to_path_buf(),
            source,
        };

        let mut variants = Vec::new();
        for entry in fs::read_dir(input_dir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            if entry.path().is_dir() {
                variants.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        variants.sort();
        Ok(variants)
    }

    pub fn generate(&self, input_dir: &Path, output_dir: &Path) -> Result<GenerateStats, UnwrapError> {
        self.generate_with_progress(input_dir, output_dir, |_| {})
    }

    /// Generate all documents, calling `on_variant` after each variant
    pub fn generate_with_progress<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        on_variant: F,
    ) -> Result<GenerateStats, UnwrapError>
    where
        F: Fn(&str) + Sync,
    {
        let result = self.run(input_dir, output_dir, &on_variant);
        if let Err(e) = &result {
            error!("String generation failed: {}", e);
        }
        result
    }

    fn run<F>(&self, input_dir: &Path, output_dir: &Path, on_variant: &F) -> Result<GenerateStats, UnwrapError>
    where
        F: Fn(&str) + Sync,
    {
        let variants = Self::find_variants(input_dir)?;
        info!(
            "Generating string tables for {} variants from {}",
            variants.len(),
            input_dir.display()
        );

        let unwrap_variant = |variant: &String| -> Result<VariantStats, UnwrapError> {
            let input = input_dir.join(variant).join(STRINGS_FILE);
            let output = output_dir.join(variant).join(STRINGS_FILE);
            debug!("Variant {}: {}", variant, input.display());
            let stats = self.unwrapper.unwrap(&input, &output)?;
            on_variant(variant);
            Ok(VariantStats {
                variant: variant.clone(),
                stats,
            })
        };

        let variants = if self.parallel {
            variants
                .par_iter()
                .map(unwrap_variant)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            variants
                .iter()
                .map(unwrap_variant)
                .collect::<Result<Vec<_>, _>>()?
        };

        let arrays = self
            .unwrapper
            .unwrap(&input_dir.join(SHARED_ARRAYS), &output_dir.join(SHARED_ARRAYS))?;

        let stats = GenerateStats { variants, arrays };
        info!("String tables: {}", stats);
        Ok(stats)
    }
}

impl Default for StringTableGenerator {
    fn default() -> Self {
        Self::new(&StringsConfig::default())
    }
}
