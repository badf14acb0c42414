use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::resources::{CopyEntry, CopySpec};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a resmerge run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// String table generation
    pub strings: StringsConfig,

    /// Resource directory aggregation
    pub resources: ResourcesConfig,
}

/// What to do with a resource entry that carries no `name` attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// Abort the document with a schema violation
    #[default]
    Fail,
    /// Keep the entry; it never collides with anything
    Keep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StringsConfig {
    /// Handling of entries without a dedup key
    pub missing_key: MissingKeyPolicy,

    /// Spaces per nesting level in generated XML
    pub indent: usize,

    /// Unwrap variants on the rayon pool
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Build into a staging directory and rename it into place
    pub atomic: bool,

    /// Ordered copy table
    pub copy: Vec<CopyEntry>,
}

impl Default for StringsConfig {
    fn default() -> Self {
        Self {
            missing_key: MissingKeyPolicy::Fail,
            indent: 4,
            parallel: false,
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            atomic: false,
            copy: CopySpec::default().into_entries(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)?,
            "toml" => toml::from_str(&contents)?,
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    config
                } else {
                    toml::from_str(&contents)?
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self, ConfigError> {
        let default_names = [
            ".resmerge.yml",
            ".resmerge.yaml",
            ".resmerge.toml",
            "resmerge.yml",
            "resmerge.yaml",
            "resmerge.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// The copy table as an aggregator spec
    pub fn copy_spec(&self) -> CopySpec {
        self.resources.copy.iter().cloned().collect()
    }

    /// Reject copy entries that cannot name a target directory
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in &self.resources.copy {
            entry
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }
}
