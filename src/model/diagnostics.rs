//! Posterior summary table and convergence diagnostics.
//!
//! For each parameter: mean, sd, 3% / 97% quantiles and split-R̂ across chains.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Posterior, PosteriorSample};
use crate::math::{mean, quantile_sorted, sample_variance};

/// Split-R̂ above this value is reported as a convergence warning.
pub const RHAT_WARN_THRESHOLD: f64 = 1.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    pub name: String,
    #[serde(with = "crate::domain::nan_as_null")]
    pub mean: f64,
    #[serde(with = "crate::domain::nan_as_null")]
    pub sd: f64,
    #[serde(with = "crate::domain::nan_as_null")]
    pub q03: f64,
    #[serde(with = "crate::domain::nan_as_null")]
    pub q97: f64,
    /// `NaN` when chains are too short to split.
    #[serde(with = "crate::domain::nan_as_null")]
    pub r_hat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    pub chains: usize,
    pub total_draws: usize,
    pub parameters: Vec<ParameterSummary>,
    pub sigma_acceptance: Vec<f64>,
}

impl PosteriorSummary {
    pub fn parameter(&self, name: &str) -> Option<&ParameterSummary> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// True when every finite R̂ is at or below the warning threshold.
    pub fn converged(&self) -> bool {
        self.parameters
            .iter()
            .all(|p| !p.r_hat.is_finite() || p.r_hat <= RHAT_WARN_THRESHOLD)
    }
}

type Extractor = fn(&PosteriorSample) -> f64;

const PARAMETERS: [(&str, Extractor); 4] = [
    ("tau", |s: &PosteriorSample| s.tau as f64),
    ("pre_mean", |s: &PosteriorSample| s.pre_mean),
    ("post_mean", |s: &PosteriorSample| s.post_mean),
    ("sigma", |s: &PosteriorSample| s.sigma),
];

/// Summarise every model parameter. Logs a warning for poorly mixed parameters.
pub fn summarize_posterior(posterior: &Posterior) -> PosteriorSummary {
    let parameters = PARAMETERS
        .iter()
        .map(|&(name, extract)| {
            let chains: Vec<Vec<f64>> = posterior
                .chains()
                .iter()
                .map(|c| c.iter().map(extract).collect())
                .collect();
            let summary = summarize_parameter(name, &chains);
            if summary.r_hat.is_finite() && summary.r_hat > RHAT_WARN_THRESHOLD {
                warn!(
                    parameter = name,
                    r_hat = summary.r_hat,
                    "chains disagree; consider more tuning or draws"
                );
            }
            summary
        })
        .collect();

    PosteriorSummary {
        chains: posterior.chain_count(),
        total_draws: posterior.len(),
        parameters,
        sigma_acceptance: posterior.sigma_acceptance().to_vec(),
    }
}

fn summarize_parameter(name: &str, chains: &[Vec<f64>]) -> ParameterSummary {
    let mut all: Vec<f64> = chains.iter().flatten().copied().collect();
    let m = mean(&all).unwrap_or(f64::NAN);
    let sd = sample_variance(&all).map(f64::sqrt).unwrap_or(f64::NAN);
    all.sort_by(|a, b| a.total_cmp(b));

    ParameterSummary {
        name: name.to_string(),
        mean: m,
        sd,
        q03: quantile_sorted(&all, 0.03).unwrap_or(f64::NAN),
        q97: quantile_sorted(&all, 0.97).unwrap_or(f64::NAN),
        r_hat: split_r_hat(chains),
    }
}

/// Gelman–Rubin R̂ on chains split in half (the middle draw of odd chains is dropped).
pub fn split_r_hat(chains: &[Vec<f64>]) -> f64 {
    let half = match chains.iter().map(Vec::len).min() {
        Some(len) => len / 2,
        None => return f64::NAN,
    };
    if half < 2 {
        return f64::NAN;
    }

    let mut halves: Vec<&[f64]> = Vec::with_capacity(chains.len() * 2);
    for c in chains {
        halves.push(&c[..half]);
        halves.push(&c[c.len() - half..]);
    }

    let means: Vec<f64> = halves.iter().filter_map(|h| mean(h)).collect();
    let within = mean(
        &halves
            .iter()
            .filter_map(|h| sample_variance(h))
            .collect::<Vec<_>>(),
    )
    .unwrap_or(0.0);
    let between = sample_variance(&means).unwrap_or(0.0) * half as f64;

    if within <= 0.0 {
        // Constant within every half: identical halves agree perfectly.
        return if between <= 0.0 { 1.0 } else { f64::INFINITY };
    }

    let l = half as f64;
    let var_hat = (l - 1.0) / l * within + between / l;
    (var_hat / within).sqrt()
}
