//! CLI argument parsing for uso

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the campaign summary
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "uso")]
#[command(version)]
#[command(about = "Cluster node-usage reports and plots from SLURM accounting data", long_about = None)]
pub struct Cli {
    /// Comma-separated list of users to consider (all users if omitted)
    #[arg(short, long, conflicts_with = "jobs")]
    pub users: Option<String>,

    /// Comma-separated list of job ids to consider
    #[arg(short, long)]
    pub jobs: Option<String>,

    /// Comma-separated job ids to keep in the report even though they failed
    #[arg(short = 'F', long, requires = "jobs")]
    pub failed: Option<String>,

    /// Plot title (no title if omitted)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Output basename for the plot; ".svg" is appended
    #[arg(short, long, default_value = "usage")]
    pub name: String,

    /// Color-code the plot by job category
    #[arg(short, long)]
    pub color: bool,

    /// JSON file mapping job-name prefixes to category names
    #[arg(short, long, value_name = "FILE")]
    pub mapping: Option<PathBuf>,

    /// Number of histogram buckets
    #[arg(short, long, default_value = "800")]
    pub resolution: usize,

    /// Summary output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the histogram to a data file for later replotting
    #[arg(long = "data-out", value_name = "FILE")]
    pub data_out: Option<PathBuf>,

    /// Replot from a histogram data file instead of querying accounting
    #[arg(
        short = 'd',
        long = "data",
        value_name = "FILE",
        conflicts_with_all = ["users", "jobs", "failed", "mapping", "data_out"]
    )]
    pub data: Option<PathBuf>,

    /// Accounting command to invoke
    #[arg(long = "sacct", value_name = "PATH", default_value = "sacct")]
    pub sacct: String,
}
