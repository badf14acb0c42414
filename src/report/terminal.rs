use super::RunSummary;
use colored::Colorize;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// List every variant instead of the totals only
    show_variants: bool,
}

impl TerminalReporter {
    pub fn new(show_variants: bool) -> Self {
        Self { show_variants }
    }

    pub fn report(&self, summary: &RunSummary) {
        println!();

        if let Some(strings) = &summary.strings {
            println!("{}", "String tables".cyan().bold());
            if self.show_variants {
                for variant in &strings.variants {
                    println!(
                        "  {} {:<20} {} entries{}",
                        "•".dimmed(),
                        variant.variant,
                        variant.stats.entries,
                        duplicates_suffix(variant.stats.duplicates)
                    );
                }
                println!(
                    "  {} {:<20} {} entries{}",
                    "•".dimmed(),
                    "values/arrays.xml",
                    strings.arrays.entries,
                    duplicates_suffix(strings.arrays.duplicates)
                );
            }
            println!("  {}", strings.to_string().green());
        }

        if let Some(resources) = &summary.resources {
            println!("{}", "Resources".cyan().bold());
            println!("  {}", resources.to_string().green());
            if resources.overwritten > 0 {
                println!(
                    "  {}",
                    format!(
                        "{} files replaced by later copy entries with the same target directory",
                        resources.overwritten
                    )
                    .yellow()
                );
            }
        }

        println!(
            "{}",
            format!("⏱  Completed in {:.2}s", summary.elapsed.as_secs_f64()).dimmed()
        );
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

fn duplicates_suffix(duplicates: usize) -> String {
    if duplicates == 0 {
        String::new()
    } else {
        format!(" ({} duplicates dropped)", duplicates)
            .dimmed()
            .to_string()
    }
}
