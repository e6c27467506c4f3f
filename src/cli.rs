//! CLI argument parsing for Recuperar

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for printed reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "recuperar")]
#[command(version)]
#[command(about = "Recovery metrics (RTO, RPO, steady-state factors) for fault-injected benchmark runs", long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one result directory and write data/metrics.csv
    Analyze {
        /// Result directory containing data/trace.csv and friends
        #[arg(long = "resultdir", value_name = "DIR")]
        resultdir: PathBuf,

        /// TOML file overriding analysis thresholds
        #[arg(long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format (text, json or csv)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,

        /// Print the report without writing metrics files
        #[arg(long = "no-write")]
        no_write: bool,
    },

    /// Average the metrics of several analyzed result directories
    Aggregate {
        /// Result directories (each with data/metrics.csv)
        #[arg(required = true, value_name = "DIR")]
        dirs: Vec<PathBuf>,

        /// Output format (text, json or csv)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
