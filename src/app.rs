//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - runs the requested pipeline
//! - prints the terminal summary

use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Command, DetectArgs, ImpactArgs, ReturnsArgs, SamplerArgs};
use crate::domain::{DetectConfig, ImpactConfig, ReturnsConfig, SamplerConfig};
use crate::error::AppError;
use crate::logging::{LogConfig, init_logging};

pub mod pipeline;

/// Entry point for the `brent-cp` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is the common case.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _log_guard = init_logging(&LogConfig {
        level: cli.log_level.clone(),
        format: cli.log_format,
        file: cli.log_file.clone(),
    })?;
    debug!(command = ?cli.command, "parsed command line");

    match cli.command {
        Command::Detect(args) => handle_detect(&args),
        Command::Impact(args) => handle_impact(&args),
        Command::Returns(args) => handle_returns(&args),
    }
}

fn handle_detect(args: &DetectArgs) -> Result<(), AppError> {
    let config = detect_config_from_args(args);
    let run = pipeline::run_detect(&config)?;
    println!(
        "{}",
        crate::report::format_run_summary(&run.returns, config.aggregate, &config.sampler, &run.summary, &run.report)
    );
    Ok(())
}

fn handle_impact(args: &ImpactArgs) -> Result<(), AppError> {
    let config = impact_config_from_args(args);
    let rows = pipeline::run_impact(&config)?;
    println!("{}", crate::report::format_impact_table(&rows));
    Ok(())
}

fn handle_returns(args: &ReturnsArgs) -> Result<(), AppError> {
    let config = returns_config_from_args(args);
    let returns = pipeline::run_returns(&config)?;
    println!("Wrote {} returns to {}", returns.len(), config.export.display());
    Ok(())
}

pub fn sampler_config_from_args(args: &SamplerArgs) -> SamplerConfig {
    SamplerConfig {
        draws: args.draws,
        tune: args.tune,
        chains: args.chains,
        target_accept: args.target_accept,
        random_seed: args.seed,
        prior_scale: args.prior_scale,
    }
}

pub fn detect_config_from_args(args: &DetectArgs) -> DetectConfig {
    DetectConfig {
        prices_path: args.prices.clone(),
        aggregate: args.aggregate,
        sampler: sampler_config_from_args(&args.sampler),
        export_report: args.export.clone(),
        export_events: args.export_events.clone(),
        export_json: args.export_json.clone(),
    }
}

pub fn impact_config_from_args(args: &ImpactArgs) -> ImpactConfig {
    ImpactConfig {
        prices_path: args.prices.clone(),
        events_path: args.events.clone(),
        taus: args.taus.clone(),
        window_days: args.window_days,
        export: args.export.clone(),
    }
}

pub fn returns_config_from_args(args: &ReturnsArgs) -> ReturnsConfig {
    ReturnsConfig {
        prices_path: args.prices.clone(),
        aggregate: args.aggregate,
        export: args.export.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_give_default_sampler_config() {
        let cli = Cli::try_parse_from(["brent-cp", "detect", "--prices", "p.csv", "--export-json", "run.json"]).unwrap();
        let Command::Detect(args) = cli.command else {
            panic!("expected detect");
        };
        let config = detect_config_from_args(&args);
        assert_eq!(config.sampler, SamplerConfig::default());
        assert_eq!(config.export_json.as_deref(), Some(std::path::Path::new("run.json")));
        assert!(config.export_report.is_none());
    }
}
