//! Posterior → point report reduction.
//!
//! - τ estimate: median of all τ draws, rounded half-to-even, clamped to the series
//! - regime means: posterior means of μ_pre / μ_post over every draw (not conditioned on τ)
//! - confidence: share of τ draws equal to the estimate

pub mod format;

pub use format::*;

use tracing::info;

use crate::domain::{ChangePointReport, DetectedEvent, Posterior, ReturnPoint};
use crate::error::AppError;
use crate::math::{mean, median};

/// Reduce a posterior to a single change-point report.
///
/// Deterministic in its inputs: building twice from the same posterior yields
/// identical reports.
pub fn build_report(returns: &[ReturnPoint], posterior: &Posterior) -> Result<ChangePointReport, AppError> {
    if posterior.is_empty() {
        return Err(AppError::validation("Posterior is empty; nothing to report."));
    }
    if returns.is_empty() {
        return Err(AppError::validation("Return series is empty; cannot date the change point."));
    }

    let taus: Vec<f64> = posterior.samples().map(|s| s.tau as f64).collect();
    let index = tau_estimate(&taus, returns.len());

    let pre: Vec<f64> = posterior.samples().map(|s| s.pre_mean).collect();
    let post: Vec<f64> = posterior.samples().map(|s| s.post_mean).collect();
    let mean_before = mean(&pre).unwrap_or(f64::NAN);
    let mean_after = mean(&post).unwrap_or(f64::NAN);
    let delta = mean_after - mean_before;

    let confidence = taus.iter().filter(|&&t| t == index as f64).count() as f64 / taus.len() as f64;

    let report = ChangePointReport {
        index,
        date: returns[index].date,
        mean_before,
        mean_after,
        delta,
        percent_change: percent_change(delta, mean_before),
        confidence,
    };

    info!(
        index = report.index,
        date = %report.date,
        delta = report.delta,
        confidence = report.confidence,
        "change point report built"
    );
    Ok(report)
}

/// `delta / |base| × 100`, or `NaN` when `base == 0`.
pub fn percent_change(delta: f64, base: f64) -> f64 {
    if base == 0.0 {
        f64::NAN
    } else {
        delta / base.abs() * 100.0
    }
}

/// Median τ rounded half-to-even and clamped to `[0, len − 1]`.
fn tau_estimate(taus: &[f64], len: usize) -> usize {
    let m = median(taus).unwrap_or(0.0).round_ties_even();
    let max = (len - 1) as f64;
    m.clamp(0.0, max) as usize
}

impl DetectedEvent {
    /// Integration record for the change-point query service.
    ///
    /// `change_point` is the τ index into the return series and `std_dev` the
    /// posterior mean of σ.
    pub fn from_report(report: &ChangePointReport, posterior: &Posterior) -> Self {
        let sigmas: Vec<f64> = posterior.samples().map(|s| s.sigma).collect();
        Self {
            date: report.date,
            change_point: report.index,
            mean_before: report.mean_before,
            mean_after: report.mean_after,
            std_dev: mean(&sigmas).unwrap_or(f64::NAN),
        }
    }
}
