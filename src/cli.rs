use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Per-region epidemic growth trend estimation.
#[derive(Parser)]
#[command(
    name = "epitrend",
    version,
    about = "Bayesian local-level trend estimation for daily case counts"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Fit every region and write the trend table.
    Estimate(EstimateArgs),
    /// Write the gap-filled daily series without fitting.
    Preprocess(PreprocessArgs),
}

/// Arguments for the `estimate` subcommand.
#[derive(clap::Args)]
pub struct EstimateArgs {
    /// Path to TOML configuration file; defaults apply when it is absent.
    #[arg(short, long, default_value = "epitrend.toml")]
    pub config: PathBuf,

    /// Override the raw table location (URL or path) from config.
    #[arg(long)]
    pub source: Option<String>,

    /// Override the trend table path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the sampler seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Override the number of regions fitted concurrently.
    #[arg(short, long)]
    pub workers: Option<usize>,
}

/// Arguments for the `preprocess` subcommand.
#[derive(clap::Args)]
pub struct PreprocessArgs {
    /// Path to TOML configuration file; defaults apply when it is absent.
    #[arg(short, long, default_value = "epitrend.toml")]
    pub config: PathBuf,

    /// Override the raw table location (URL or path) from config.
    #[arg(long)]
    pub source: Option<String>,

    /// Path of the series table (`.csv` or `.parquet`).
    #[arg(short, long)]
    pub output: PathBuf,
}
