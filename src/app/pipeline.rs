//! Shared pipelines behind the CLI subcommands.
//!
//! Each function runs one workflow end to end and returns everything it
//! computed, so the front-end only decides what to print:
//! load prices -> returns -> fit -> diagnostics -> report -> exports

use tracing::{info, info_span};

use crate::domain::{
    ChangePointReport, ChangePointSummary, DetectConfig, DetectedEvent, ImpactConfig, Posterior, PricePoint,
    ReturnPoint, ReturnsConfig,
};
use crate::error::AppError;
use crate::io::{RunFile, export_change_point_summaries, export_detected_events, export_report, export_returns};
use crate::model::PosteriorSummary;

/// All computed outputs of a single `detect` run.
#[derive(Debug, Clone)]
pub struct DetectRun {
    pub prices: Vec<PricePoint>,
    pub returns: Vec<ReturnPoint>,
    pub posterior: Posterior,
    pub summary: PosteriorSummary,
    pub report: ChangePointReport,
    pub detected: DetectedEvent,
}

/// Load, fit and report; then write whichever exports the config asks for.
pub fn run_detect(config: &DetectConfig) -> Result<DetectRun, AppError> {
    let _span = info_span!("detect", prices = %config.prices_path.display()).entered();

    let prices = crate::io::load_prices(&config.prices_path)?;
    let run = detect_on_prices(prices, config)?;

    if let Some(path) = &config.export_report {
        export_report(&run.report, path)?;
    }
    if let Some(path) = &config.export_events {
        export_detected_events(std::slice::from_ref(&run.detected), path)?;
    }
    if let Some(path) = &config.export_json {
        let file = RunFile {
            tool: env!("CARGO_PKG_NAME").to_string(),
            prices_path: config.prices_path.clone(),
            aggregate: config.aggregate,
            n_returns: run.returns.len(),
            sampler: config.sampler.clone(),
            report: run.report.clone(),
            posterior: run.summary.clone(),
        };
        crate::io::write_run_json(path, &file)?;
    }

    Ok(run)
}

/// The in-memory part of `detect`, for callers that already hold a price series.
pub fn detect_on_prices(prices: Vec<PricePoint>, config: &DetectConfig) -> Result<DetectRun, AppError> {
    let returns = crate::preprocess::compute_returns(&prices, config.aggregate)?;
    let posterior = crate::model::fit(&returns, &config.sampler)?;
    let summary = crate::model::summarize_posterior(&posterior);
    let report = crate::report::build_report(&returns, &posterior)?;
    let detected = DetectedEvent::from_report(&report, &posterior);

    info!(
        tau = report.index,
        date = %report.date,
        confidence = report.confidence,
        "change point detected"
    );

    Ok(DetectRun {
        prices,
        returns,
        posterior,
        summary,
        report,
        detected,
    })
}

/// Impact rows for each requested τ, exported when configured.
pub fn run_impact(config: &ImpactConfig) -> Result<Vec<ChangePointSummary>, AppError> {
    let _span = info_span!("impact", taus = config.taus.len()).entered();

    let prices = crate::io::load_prices(&config.prices_path)?;
    let events = crate::io::load_events(&config.events_path)?;
    let rows = crate::impact::summarize_change_points(&prices, &events, &config.taus, config.window_days)?;

    if let Some(path) = &config.export {
        export_change_point_summaries(&rows, path)?;
    }
    Ok(rows)
}

/// Compute and export the modelling table.
pub fn run_returns(config: &ReturnsConfig) -> Result<Vec<ReturnPoint>, AppError> {
    let prices = crate::io::load_prices(&config.prices_path)?;
    let returns = crate::preprocess::compute_returns(&prices, config.aggregate)?;
    export_returns(&returns, &config.export)?;
    Ok(returns)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::{Days, NaiveDate};

    use super::*;
    use crate::domain::SamplerConfig;

    /// 60 daily prices: drift up for 30 days, then down.
    fn write_prices(dir: &tempfile::TempDir) -> PathBuf {
        let start = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
        let mut body = String::from("Date,Price\n");
        let mut price = 100.0_f64;
        for i in 0..60u64 {
            let date = start.checked_add_days(Days::new(i)).unwrap();
            body.push_str(&format!("{date},{price:.6}\n"));
            let wiggle: f64 = if i % 2 == 0 { 0.002 } else { -0.002 };
            let drift = if i < 30 { 0.02 } else { -0.02 };
            price *= (drift + wiggle).exp();
        }
        let path = dir.path().join("prices.csv");
        fs::write(&path, body).unwrap();
        path
    }

    fn quick_sampler() -> SamplerConfig {
        SamplerConfig {
            draws: 300,
            tune: 200,
            ..SamplerConfig::default()
        }
    }

    #[test]
    fn detect_finds_the_drift_reversal_and_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetectConfig {
            prices_path: write_prices(&dir),
            aggregate: None,
            sampler: quick_sampler(),
            export_report: Some(dir.path().join("out/report.csv")),
            export_events: Some(dir.path().join("out/detected_events.csv")),
            export_json: Some(dir.path().join("out/run.json")),
        };
        let run = run_detect(&config).unwrap();

        assert_eq!(run.returns.len(), 59);
        assert!((27..=31).contains(&run.report.index), "tau {}", run.report.index);
        assert!(run.report.mean_before > 0.0 && run.report.mean_after < 0.0);
        assert_eq!(run.detected.change_point, run.report.index);

        let events = fs::read_to_string(dir.path().join("out/detected_events.csv")).unwrap();
        assert!(events.starts_with("Date,ChangePoint,MeanBefore,MeanAfter,StdDev\n"));
        let saved = crate::io::read_run_json(&dir.path().join("out/run.json")).unwrap();
        assert_eq!(saved.report, run.report);
        assert_eq!(saved.n_returns, 59);
    }

    #[test]
    fn impact_reads_events_and_exports_rows() {
        let dir = tempfile::tempdir().unwrap();
        let events = dir.path().join("events.csv");
        fs::write(&events, "Date,Label,Category\n2014-01-28,OPEC meeting,Policy\n2013-06-01,Old news,Other\n").unwrap();
        let config = ImpactConfig {
            prices_path: write_prices(&dir),
            events_path: events,
            taus: vec![30, 5],
            window_days: 7,
            export: Some(dir.path().join("impact.csv")),
        };
        let rows = run_impact(&config).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].events, "OPEC meeting");
        assert_eq!(rows[1].events, crate::impact::NO_EVENTS);
        assert!(rows[0].change.is_finite() && rows[1].before_mean.is_finite());
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2014, 1, 31).unwrap());
        assert!(dir.path().join("impact.csv").exists());
    }

    #[test]
    fn returns_are_exported_with_one_row_fewer() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReturnsConfig {
            prices_path: write_prices(&dir),
            aggregate: None,
            export: dir.path().join("returns.csv"),
        };
        let returns = run_returns(&config).unwrap();
        assert_eq!(returns.len(), 59);
        let text = fs::read_to_string(&config.export).unwrap();
        assert_eq!(text.lines().count(), 60);
        assert!(text.starts_with("Date,Price,LogReturn\n"));
    }
}
