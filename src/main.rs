use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::info;

use resmerge::config::Config;
use resmerge::pipeline::{DirPair, Pipeline};
use resmerge::report::{Reporter, RunSummary};
use resmerge::resources::ResourceTreeAggregator;
use resmerge::strings::StringTableGenerator;
use resmerge::watch::FileWatcher;

/// resmerge - Build-time aggregation of Android resources from patch bundles
#[derive(Parser, Debug)]
#[command(name = "resmerge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Unwrap patch string tables into per-variant resource documents
    Strings {
        /// Directory holding <variant>/strings.xml and values/arrays.xml
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving the generated documents
        #[arg(short, long)]
        output: PathBuf,

        /// Process variants in parallel
        #[arg(long)]
        parallel: bool,

        /// Write a JSON run summary to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Rebuild a resource tree from the configured copy table
    Copy {
        /// Root of the patch resource directories
        #[arg(short, long)]
        input: PathBuf,

        /// Output tree; deleted and rebuilt on every run
        #[arg(short, long)]
        output: PathBuf,

        /// Build into a staging directory and swap it in on success
        #[arg(long)]
        atomic: bool,

        /// Write a JSON run summary to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Run string generation and resource aggregation together
    All {
        #[arg(long, value_name = "DIR")]
        strings_input: PathBuf,

        #[arg(long, value_name = "DIR")]
        strings_output: PathBuf,

        #[arg(long, value_name = "DIR")]
        resources_input: PathBuf,

        #[arg(long, value_name = "DIR")]
        resources_output: PathBuf,

        /// Process variants in parallel
        #[arg(long)]
        parallel: bool,

        /// Build the resource tree in a staging directory
        #[arg(long)]
        atomic: bool,

        /// Watch mode - regenerate when the inputs change
        #[arg(long)]
        watch: bool,

        /// Write a JSON run summary to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Print the effective configuration as YAML
    PrintConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("resmerge v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    let pipeline = Pipeline::new(&config);

    match &cli.command {
        Command::Strings { input, output, report, .. } => {
            let dirs = DirPair::new(input, output);
            let summary = run_strings(&pipeline, &dirs, &config, cli.quiet)?;
            Reporter::new(cli.quiet, cli.verbose, report.clone()).report(&summary)?;
        }
        Command::Copy { input, output, report, .. } => {
            let summary = pipeline
                .run_resources(&DirPair::new(input, output))
                .into_diagnostic()?;
            Reporter::new(cli.quiet, cli.verbose, report.clone()).report(&summary)?;
        }
        Command::All {
            strings_input,
            strings_output,
            resources_input,
            resources_output,
            watch,
            report,
            ..
        } => {
            let strings = DirPair::new(strings_input, strings_output);
            let resources = DirPair::new(resources_input, resources_output);
            let reporter = Reporter::new(cli.quiet, cli.verbose, report.clone());

            if *watch {
                run_watch_mode(&pipeline, &strings, &resources, &reporter)?;
            } else {
                let summary = pipeline.run_all(&strings, &resources).into_diagnostic()?;
                reporter.report(&summary)?;
            }
        }
        Command::PrintConfig => {
            let yaml = serde_yaml::to_string(&config).into_diagnostic()?;
            print!("{}", yaml);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load config file: {}", config_path.display()))?
    } else {
        // Try to load from default locations
        Config::from_default_locations(Path::new("."))
            .into_diagnostic()
            .wrap_err("Failed to load configuration")?
    };

    // Override with CLI arguments
    match &cli.command {
        Command::Strings { parallel, .. } => {
            config.strings.parallel |= *parallel;
        }
        Command::Copy { atomic, .. } => {
            config.resources.atomic |= *atomic;
        }
        Command::All { parallel, atomic, .. } => {
            config.strings.parallel |= *parallel;
            config.resources.atomic |= *atomic;
        }
        Command::PrintConfig => {}
    }

    Ok(config)
}

fn run_strings(pipeline: &Pipeline<'_>, dirs: &DirPair, config: &Config, quiet: bool) -> Result<RunSummary> {
    use indicatif::{ProgressBar, ProgressStyle};

    if quiet || config.strings.parallel {
        return pipeline.run_strings(dirs).into_diagnostic();
    }

    let total = StringTableGenerator::find_variants(&dirs.input)
        .map(|variants| variants.len())
        .unwrap_or(0);
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let result = pipeline.run_strings_with_progress(dirs, |variant| {
        pb.set_message(variant.to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();

    result.into_diagnostic()
}

fn run_watch_mode(
    pipeline: &Pipeline<'_>,
    strings: &DirPair,
    resources: &DirPair,
    reporter: &Reporter,
) -> Result<()> {
    let strings_input = absolute(&strings.input)?;
    let resources_input = absolute(&resources.input)?;
    let resources_output = absolute(&resources.output)?;

    let mut watcher = FileWatcher::new()
        .ignore(absolute(&strings.output)?)
        .ignore(resources_output.clone());
    if let Ok(staging) = ResourceTreeAggregator::staging_dir(&resources_output) {
        watcher = watcher.ignore(staging);
    }

    let mut watched: Vec<&Path> = vec![strings_input.as_path()];
    if resources_input != strings_input {
        watched.push(resources_input.as_path());
    }

    watcher
        .watch(&watched, || {
            match pipeline.run_all(strings, resources) {
                Ok(summary) => {
                    if let Err(e) = reporter.report(&summary) {
                        eprintln!("{}: {}", "Report error".red(), e);
                    }
                    println!();
                    println!("{}", "✓ Resources regenerated. Waiting for changes...".green());
                }
                Err(e) => {
                    eprintln!("{}: {}", "Pipeline error".red(), e);
                }
            }
            true // Continue watching
        })
        .map_err(|e| miette::miette!("Watch error: {}", e))?;

    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().into_diagnostic()?;
    Ok(cwd.join(path))
}
