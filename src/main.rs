use anyhow::{Context, Result};
use clap::Parser;
use recuperar::aggregate::aggregate_result_dirs;
use recuperar::cli::{Cli, Command, OutputFormat};
use recuperar::config::AnalysisConfig;
use recuperar::csv_output;
use recuperar::engine::{analyze, RunArtifacts};
use recuperar::json_output::JsonRunReport;
use recuperar::trace::ResultDir;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` turns on everything
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Analyze one result directory and print the report
fn run_analyze(
    resultdir: &Path,
    config: Option<&Path>,
    format: OutputFormat,
    no_write: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let dir = ResultDir::new(resultdir);

    let artifacts = RunArtifacts::load(&dir)
        .with_context(|| format!("Failed to load artifacts from {}", resultdir.display()))?;
    let report = analyze(&artifacts, &config)
        .with_context(|| format!("Analysis of {} failed", resultdir.display()))?;

    if !no_write {
        report
            .write_to(&dir)
            .with_context(|| format!("Failed to write metrics to {}", dir.data_dir().display()))?;
    }

    match format {
        OutputFormat::Text => print!("{}", report),
        OutputFormat::Json => println!("{}", JsonRunReport::from_report(resultdir, &report).to_json()?),
        OutputFormat::Csv => print!("{}", csv_output::metrics_to_csv(&report.metrics)),
    }
    Ok(())
}

/// Summarize previously written metrics across result directories
fn run_aggregate(dirs: &[PathBuf], format: OutputFormat) -> Result<()> {
    let report = aggregate_result_dirs(dirs)?;
    if report.runs.is_empty() {
        anyhow::bail!("None of the {} result directories contain data/metrics.csv", dirs.len());
    }

    match format {
        OutputFormat::Text => print!("{}", report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => print!("{}", csv_output::aggregate_to_csv(&report)),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    match args.command {
        Command::Analyze {
            resultdir,
            config,
            format,
            no_write,
        } => run_analyze(&resultdir, config.as_deref(), format, no_write),
        Command::Aggregate { dirs, format } => run_aggregate(&dirs, format),
    }
}
