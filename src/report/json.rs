use super::RunSummary;
use crate::resources::AggregateStats;
use crate::strings::GenerateStats;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for build drivers
pub struct JsonReporter {
    output_path: PathBuf,
}

impl JsonReporter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    pub fn report(&self, summary: &RunSummary) -> Result<()> {
        let report = JsonReport::from_summary(summary);
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;

        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent).into_diagnostic()?;
        }
        std::fs::write(&self.output_path, &json)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write report: {}", self.output_path.display()))?;

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    strings: Option<&'a GenerateStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<&'a AggregateStats>,
}

impl<'a> JsonReport<'a> {
    fn from_summary(summary: &'a RunSummary) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            elapsed_ms: summary.elapsed.as_millis(),
            strings: summary.strings.as_ref(),
            resources: summary.resources.as_ref(),
        }
    }
}
