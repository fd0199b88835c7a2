//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during sampling and report building
//! - exported to CSV/JSON
//! - handed to downstream consumers without re-deriving anything

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Resampling frequency applied before computing returns.
///
/// Each period keeps its last observation; periods without observations are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One observation per calendar day (collapses intraday duplicates).
    Daily,
    /// Weeks ending on Sunday; the period is labelled by that Sunday.
    Weekly,
    /// Calendar months; the period is labelled by the last day of the month.
    Monthly,
}

impl Frequency {
    pub fn display_name(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

/// One observed price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// One log-return, stamped with the date (and price) of the later observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub log_return: f64,
}

/// A single joint draw from the change-point posterior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSample {
    /// Last index (into the return series) of the pre-change regime.
    pub tau: usize,
    pub pre_mean: f64,
    pub post_mean: f64,
    pub sigma: f64,
}

/// Posterior draws, kept per chain so convergence diagnostics can compare chains.
///
/// For report building the chains are treated as one unordered multiset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Posterior {
    chains: Vec<Vec<PosteriorSample>>,
    sigma_acceptance: Vec<f64>,
}

impl Posterior {
    /// Posterior from a flat list of draws (treated as a single chain).
    pub fn from_samples(samples: Vec<PosteriorSample>) -> Self {
        Self {
            chains: vec![samples],
            sigma_acceptance: Vec::new(),
        }
    }

    /// Posterior from independently sampled chains plus their sigma acceptance rates.
    pub fn from_chains(chains: Vec<Vec<PosteriorSample>>, sigma_acceptance: Vec<f64>) -> Self {
        Self {
            chains,
            sigma_acceptance,
        }
    }

    pub fn len(&self) -> usize {
        self.chains.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn chains(&self) -> &[Vec<PosteriorSample>] {
        &self.chains
    }

    /// Per-chain acceptance rate of the sigma Metropolis step (empty for hand-built posteriors).
    pub fn sigma_acceptance(&self) -> &[f64] {
        &self.sigma_acceptance
    }

    /// All draws, chain-major.
    pub fn samples(&self) -> impl Iterator<Item = &PosteriorSample> + '_ {
        self.chains.iter().flatten()
    }

    pub fn tau_samples(&self) -> Vec<usize> {
        self.samples().map(|s| s.tau).collect()
    }
}

/// Sampler settings.
///
/// Defaults reproduce the production run: 1000 draws and 500 tuning sweeps per
/// chain, 2 chains, 0.9 target acceptance, seed 42, prior scale 0.05.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Retained draws per chain.
    pub draws: usize,
    /// Discarded adaptation sweeps per chain.
    pub tune: usize,
    pub chains: usize,
    /// Acceptance rate the sigma step size is adapted towards during tuning.
    pub target_accept: f64,
    pub random_seed: u64,
    /// Scale shared by the Normal mean priors and the HalfNormal sigma prior.
    pub prior_scale: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            draws: 1000,
            tune: 500,
            chains: 2,
            target_accept: 0.9,
            random_seed: 42,
            prior_scale: 0.05,
        }
    }
}

/// Point summary of a change-point posterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePointReport {
    /// Estimated τ (index into the return series).
    pub index: usize,
    pub date: NaiveDate,
    pub mean_before: f64,
    pub mean_after: f64,
    pub delta: f64,
    /// `NaN` when `mean_before == 0`.
    #[serde(with = "crate::domain::nan_as_null")]
    pub percent_change: f64,
    /// Share of τ draws equal to `index`. Not a credible-interval probability.
    pub confidence: f64,
}

/// Row shape expected by the downstream change-point query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvent {
    pub date: NaiveDate,
    pub change_point: usize,
    pub mean_before: f64,
    pub mean_after: f64,
    pub std_dev: f64,
}

/// A dated reference event (read-only input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub date: NaiveDate,
    pub label: String,
    pub category: String,
}

/// Descriptive before/after price statistics around a split index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    /// `NaN` when the before slice is empty (`tau == 0`).
    pub before_mean: f64,
    pub after_mean: f64,
    pub change: f64,
    pub percent_change: f64,
}

/// One row of a multi-τ impact table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePointSummary {
    pub tau: usize,
    pub date: NaiveDate,
    /// Associated event labels joined with `"; "`, or `"None"`.
    pub events: String,
    pub before_mean: f64,
    pub after_mean: f64,
    pub change: f64,
    pub percent_change: f64,
}

/// A full `detect` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct DetectConfig {
    pub prices_path: PathBuf,
    pub aggregate: Option<Frequency>,
    pub sampler: SamplerConfig,

    pub export_report: Option<PathBuf>,
    pub export_events: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Configuration for an `impact` run.
#[derive(Debug, Clone)]
pub struct ImpactConfig {
    pub prices_path: PathBuf,
    pub events_path: PathBuf,
    pub taus: Vec<usize>,
    pub window_days: u32,
    pub export: Option<PathBuf>,
}

/// Configuration for a `returns` run.
#[derive(Debug, Clone)]
pub struct ReturnsConfig {
    pub prices_path: PathBuf,
    pub aggregate: Option<Frequency>,
    pub export: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tau: usize) -> PosteriorSample {
        PosteriorSample {
            tau,
            pre_mean: 0.0,
            post_mean: 0.0,
            sigma: 1.0,
        }
    }

    #[test]
    fn posterior_flattens_chains_in_order() {
        let posterior = Posterior::from_chains(
            vec![vec![sample(1), sample(2)], vec![sample(3)]],
            vec![0.5, 0.6],
        );
        assert_eq!(posterior.len(), 3);
        assert_eq!(posterior.chain_count(), 2);
        assert_eq!(posterior.tau_samples(), vec![1, 2, 3]);
    }

    #[test]
    fn default_sampler_config_matches_documented_values() {
        let cfg = SamplerConfig::default();
        assert_eq!(cfg.draws, 1000);
        assert_eq!(cfg.tune, 500);
        assert_eq!(cfg.chains, 2);
        assert!((cfg.target_accept - 0.9).abs() < 1e-12);
        assert_eq!(cfg.random_seed, 42);
        assert!((cfg.prior_scale - 0.05).abs() < 1e-12);
    }
}
