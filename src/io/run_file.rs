//! Read/write run JSON files.
//!
//! A run file is the portable record of one `detect` run:
//! - input description (source path, aggregation, number of returns)
//! - the sampler settings used
//! - the change-point report and the posterior summary table

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{ChangePointReport, Frequency, SamplerConfig};
use crate::error::AppError;
use crate::io::export::ensure_parent_dir;
use crate::model::PosteriorSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub tool: String,
    pub prices_path: PathBuf,
    pub aggregate: Option<Frequency>,
    pub n_returns: usize,
    pub sampler: SamplerConfig,
    pub report: ChangePointReport,
    pub posterior: PosteriorSummary,
}

/// Write a run JSON file.
pub fn write_run_json(path: &Path, run: &RunFile) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| AppError::io(path, "Failed to create run JSON", e))?;
    serde_json::to_writer_pretty(file, run).map_err(|e| AppError::io(path, "Failed to write run JSON", e.into()))?;
    Ok(())
}

/// Read a run JSON file.
pub fn read_run_json(path: &Path) -> Result<RunFile, AppError> {
    let file = File::open(path).map_err(|e| AppError::io(path, "Failed to open run JSON", e))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::validation(format!("Invalid run JSON '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::ParameterSummary;

    fn run() -> RunFile {
        RunFile {
            tool: "brent-cp".to_string(),
            prices_path: PathBuf::from("data/raw/BrentOilPrices.csv"),
            aggregate: Some(Frequency::Weekly),
            n_returns: 1800,
            sampler: SamplerConfig::default(),
            report: ChangePointReport {
                index: 1100,
                date: NaiveDate::from_ymd_opt(2008, 7, 13).unwrap(),
                mean_before: 0.002,
                mean_after: -0.001,
                delta: -0.003,
                percent_change: -150.0,
                confidence: 0.21,
            },
            posterior: PosteriorSummary {
                chains: 2,
                total_draws: 2000,
                parameters: vec![ParameterSummary {
                    name: "tau".to_string(),
                    mean: 1100.4,
                    sd: 3.1,
                    q03: 1094.0,
                    q97: 1106.0,
                    r_hat: 1.01,
                }],
                sigma_acceptance: vec![0.88, 0.91],
            },
        }
    }

    #[test]
    fn run_file_survives_a_write_read_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs/latest.json");
        let mut run = run();
        // Values that only survive with exact float parsing.
        run.report.percent_change = -199.562_192_113_174_46;
        run.report.confidence = 0.996_666_666_666_666_7;
        write_run_json(&path, &run).unwrap();
        assert_eq!(read_run_json(&path).unwrap(), run);
    }

    #[test]
    fn nan_fields_are_stored_as_null_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut run = run();
        run.report.mean_before = 0.0;
        run.report.percent_change = f64::NAN;
        run.posterior.parameters[0].r_hat = f64::NAN;
        write_run_json(&path, &run).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"percent_change\": null"), "{text}");

        let saved = read_run_json(&path).unwrap();
        assert!(saved.report.percent_change.is_nan());
        assert!(saved.posterior.parameters[0].r_hat.is_nan());
        assert_eq!(saved.report.index, run.report.index);
        assert_eq!(saved.report.delta, run.report.delta);
        assert_eq!(saved.posterior.parameters[0].mean, run.posterior.parameters[0].mean);
    }
}
