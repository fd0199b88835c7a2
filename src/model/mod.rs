//! Bayesian single change-point model.
//!
//! Responsibilities:
//!
//! - validate the return series and sampler settings
//! - run independent chains (parallel) and merge them in chain order
//! - summarise the posterior for diagnostics

pub mod diagnostics;
pub mod likelihood;
pub mod sampler;

pub use diagnostics::*;
pub use likelihood::*;
pub use sampler::*;

use rayon::prelude::*;
use tracing::info;

use crate::domain::{Posterior, ReturnPoint, SamplerConfig};
use crate::error::AppError;

/// Shortest return series the model will be fitted on.
pub const MIN_RETURNS: usize = 10;

/// Sample the change-point posterior for a return series.
pub fn fit(returns: &[ReturnPoint], config: &SamplerConfig) -> Result<Posterior, AppError> {
    let values: Vec<f64> = returns.iter().map(|r| r.log_return).collect();
    fit_values(&values, config)
}

/// Sample the change-point posterior for raw log-return values.
///
/// Chains are independent units of work sharing only the read-only input and
/// config; collecting them in chain order keeps the merged posterior
/// reproducible for a given seed.
pub fn fit_values(values: &[f64], config: &SamplerConfig) -> Result<Posterior, AppError> {
    validate_config(config)?;
    validate_values(values)?;

    info!(
        n = values.len(),
        draws = config.draws,
        tune = config.tune,
        chains = config.chains,
        seed = config.random_seed,
        "sampling change-point posterior"
    );

    let sums = SegmentSums::new(values);
    let outputs: Vec<ChainOutput> = (0..config.chains)
        .into_par_iter()
        .map(|chain| {
            run_chain(values, &sums, config, chain).map_err(|source| AppError::Inference { chain, source })
        })
        .collect::<Result<_, _>>()?;

    let (chains, acceptance): (Vec<_>, Vec<_>) = outputs
        .into_iter()
        .map(|o| (o.samples, o.sigma_acceptance))
        .unzip();
    let posterior = Posterior::from_chains(chains, acceptance);

    info!(samples = posterior.len(), "sampling completed");
    Ok(posterior)
}

fn validate_config(config: &SamplerConfig) -> Result<(), AppError> {
    if config.draws == 0 {
        return Err(AppError::validation("Sampler draws must be >= 1."));
    }
    if config.chains == 0 {
        return Err(AppError::validation("Sampler chains must be >= 1."));
    }
    if !(config.target_accept > 0.0 && config.target_accept < 1.0) {
        return Err(AppError::validation(format!(
            "Target acceptance must lie in (0, 1), got {}.",
            config.target_accept
        )));
    }
    if !(config.prior_scale.is_finite() && config.prior_scale > 0.0) {
        return Err(AppError::validation(format!(
            "Prior scale must be finite and > 0, got {}.",
            config.prior_scale
        )));
    }
    Ok(())
}

fn validate_values(values: &[f64]) -> Result<(), AppError> {
    if values.len() < MIN_RETURNS {
        return Err(AppError::validation(format!(
            "Return series too short for change-point inference: {} value(s), need at least {MIN_RETURNS}.",
            values.len()
        )));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(AppError::validation(format!(
            "Return series contains a non-finite value at index {i}: {}.",
            values[i]
        )));
    }
    Ok(())
}
