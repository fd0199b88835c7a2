//! Command-line parsing for the Brent change-point analyser.
//!
//! Argument parsing and command dispatch stay separate from the modelling code;
//! `app` turns these structs into the plain config types in `domain`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Frequency;
use crate::logging::LogFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "brent-cp", version, about = "Bayesian change-point analysis of Brent crude prices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Default log filter when RUST_LOG is unset (e.g. `info`, `brent_cp::model=debug`).
    #[arg(long, global = true, env = "BRENT_CP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, env = "BRENT_CP_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Also append JSON log lines to this file.
    #[arg(long, global = true, env = "BRENT_CP_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the single change-point model to log-returns and report the break.
    Detect(DetectArgs),
    /// Quantify price impact around given change-point indices and match events.
    Impact(ImpactArgs),
    /// Write the log-return modelling table.
    Returns(ReturnsArgs),
}

/// Sampler settings shared by anything that fits the model.
#[derive(Debug, Args, Clone)]
pub struct SamplerArgs {
    /// Retained draws per chain.
    #[arg(long, env = "BRENT_CP_DRAWS", default_value_t = 1000)]
    pub draws: usize,

    /// Warm-up iterations per chain (discarded).
    #[arg(long, env = "BRENT_CP_TUNE", default_value_t = 500)]
    pub tune: usize,

    /// Number of independent chains.
    #[arg(long, env = "BRENT_CP_CHAINS", default_value_t = 2)]
    pub chains: usize,

    /// Acceptance rate the sigma step size adapts toward during warm-up.
    #[arg(long, env = "BRENT_CP_TARGET_ACCEPT", default_value_t = 0.9)]
    pub target_accept: f64,

    /// Seed for all chains.
    #[arg(long, env = "BRENT_CP_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Prior scale for both regime means and sigma.
    #[arg(long, env = "BRENT_CP_PRIOR_SCALE", default_value_t = 0.05)]
    pub prior_scale: f64,
}

#[derive(Debug, Args, Clone)]
pub struct DetectArgs {
    /// Price CSV with `Date` and `Price` columns.
    #[arg(long, value_name = "CSV", env = "BRENT_CP_PRICES")]
    pub prices: PathBuf,

    /// Aggregate prices to period ends before computing returns.
    #[arg(long, value_enum)]
    pub aggregate: Option<Frequency>,

    #[command(flatten)]
    pub sampler: SamplerArgs,

    /// Export the change-point report (single row) to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the detected event in the `{Date, ChangePoint, MeanBefore, MeanAfter, StdDev}` schema.
    #[arg(long = "export-events", value_name = "CSV")]
    pub export_events: Option<PathBuf>,

    /// Export the full run (settings, report, posterior summary) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ImpactArgs {
    /// Price CSV with `Date` and `Price` columns.
    #[arg(long, value_name = "CSV", env = "BRENT_CP_PRICES")]
    pub prices: PathBuf,

    /// Event CSV with `Date`, `Label` (or `Event`) and optional `Category`.
    #[arg(long, value_name = "CSV", env = "BRENT_CP_EVENTS")]
    pub events: PathBuf,

    /// Change-point index into the price series (repeatable or comma separated).
    #[arg(long = "tau", value_name = "N", required = true, num_args = 1.., value_delimiter = ',')]
    pub taus: Vec<usize>,

    /// Days on either side of the change-point date to search for events.
    #[arg(long, default_value_t = crate::impact::DEFAULT_EVENT_WINDOW_DAYS)]
    pub window_days: u32,

    /// Export the impact table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ReturnsArgs {
    /// Price CSV with `Date` and `Price` columns.
    #[arg(long, value_name = "CSV", env = "BRENT_CP_PRICES")]
    pub prices: PathBuf,

    /// Aggregate prices to period ends before computing returns.
    #[arg(long, value_enum)]
    pub aggregate: Option<Frequency>,

    /// Output CSV (`Date, Price, LogReturn`).
    #[arg(long, value_name = "CSV")]
    pub export: PathBuf,
}
