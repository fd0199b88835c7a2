//! Metropolis-within-Gibbs sampler for a single chain.
//!
//! One sweep updates, in order:
//!
//! 1. τ from its exact discrete full conditional (one O(n) pass over prefix sums)
//! 2. μ_pre and μ_post from their conjugate normal full conditionals
//! 3. σ by a random-walk Metropolis step on `ln σ`
//!
//! During the first `tune` sweeps the σ step size is adapted (Robbins–Monro on
//! the log step) towards `target_accept`; those sweeps are discarded.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, StandardNormal};
use tracing::debug;

use crate::domain::{PosteriorSample, SamplerConfig};
use crate::error::SamplerFault;
use crate::model::likelihood::SegmentSums;

const INITIAL_LOG_STEP: f64 = -2.3; // ≈ 0.1 on the log-σ scale
const LOG_STEP_BOUNDS: (f64, f64) = (-12.0, 2.0);
const ADAPT_DECAY: f64 = 0.6;

/// Retained draws of one chain plus its post-tuning σ acceptance rate.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub samples: Vec<PosteriorSample>,
    pub sigma_acceptance: f64,
}

#[derive(Debug, Clone, Copy)]
struct State {
    tau: usize,
    pre_mean: f64,
    post_mean: f64,
    sigma: f64,
}

/// Derive an independent, reproducible seed for `chain` (SplitMix64 finaliser).
pub fn chain_seed(seed: u64, chain: usize) -> u64 {
    let mut z = seed ^ (chain as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run one chain to completion.
pub fn run_chain(
    values: &[f64],
    sums: &SegmentSums,
    config: &SamplerConfig,
    chain: usize,
) -> Result<ChainOutput, SamplerFault> {
    let n = sums.len();
    let mut rng = StdRng::seed_from_u64(chain_seed(config.random_seed, chain));
    let mut state = initial_state(values, config.prior_scale);

    let mut log_step = INITIAL_LOG_STEP;
    let mut accepted = 0usize;
    let mut weights = Vec::with_capacity(n);
    let mut samples = Vec::with_capacity(config.draws);

    let total = config.tune + config.draws;
    for iteration in 0..total {
        sums.switch_log_weights(state.pre_mean, state.post_mean, state.sigma, &mut weights);
        state.tau = sample_switch(&mut weights, &mut rng, iteration)?;

        let pre = sums.pre(state.tau);
        state.pre_mean = sample_regime_mean(
            pre.count,
            pre.sum,
            state.sigma,
            config.prior_scale,
            &mut rng,
            "pre_mean",
            iteration,
        )?;
        let post = sums.post(state.tau);
        state.post_mean = sample_regime_mean(
            post.count,
            post.sum,
            state.sigma,
            config.prior_scale,
            &mut rng,
            "post_mean",
            iteration,
        )?;

        let ssr = sums.residual_ss(state.tau, state.pre_mean, state.post_mean);
        let (sigma, accept_prob, was_accepted) =
            sigma_step(state.sigma, ssr, n, config.prior_scale, log_step.exp(), &mut rng);
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(SamplerFault::NonFinite {
                parameter: "sigma",
                iteration,
            });
        }
        state.sigma = sigma;

        if iteration < config.tune {
            let gain = 1.0 / ((iteration + 1) as f64).powf(ADAPT_DECAY);
            log_step = (log_step + gain * (accept_prob - config.target_accept))
                .clamp(LOG_STEP_BOUNDS.0, LOG_STEP_BOUNDS.1);
        } else {
            if was_accepted {
                accepted += 1;
            }
            samples.push(PosteriorSample {
                tau: state.tau,
                pre_mean: state.pre_mean,
                post_mean: state.post_mean,
                sigma: state.sigma,
            });
        }
    }

    let sigma_acceptance = if config.draws == 0 {
        0.0
    } else {
        accepted as f64 / config.draws as f64
    };
    debug!(
        chain,
        draws = samples.len(),
        sigma_step = log_step.exp(),
        sigma_acceptance,
        "chain finished"
    );

    Ok(ChainOutput {
        samples,
        sigma_acceptance,
    })
}

fn initial_state(values: &[f64], prior_scale: f64) -> State {
    let mean = crate::math::mean(values).unwrap_or(0.0);
    let sd = crate::math::sample_variance(values)
        .map(f64::sqrt)
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(prior_scale);
    State {
        tau: values.len() / 2,
        pre_mean: mean,
        post_mean: mean,
        sigma: sd,
    }
}

/// Draw an index proportionally to `exp(log_weights)`. Overwrites the buffer.
fn sample_switch(
    log_weights: &mut [f64],
    rng: &mut StdRng,
    iteration: usize,
) -> Result<usize, SamplerFault> {
    let n = log_weights.len();
    let max = log_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(SamplerFault::DegenerateSwitchWeights { iteration, n });
    }

    let mut total = 0.0;
    for w in log_weights.iter_mut() {
        *w = (*w - max).exp();
        total += *w;
    }
    if !(total.is_finite() && total > 0.0) {
        return Err(SamplerFault::DegenerateSwitchWeights { iteration, n });
    }

    let mut u = rng.r#gen::<f64>() * total;
    for (i, &w) in log_weights.iter().enumerate() {
        if u < w {
            return Ok(i);
        }
        u -= w;
    }
    // Floating-point leftovers land on the last positive weight.
    Ok(log_weights.iter().rposition(|&w| w > 0.0).unwrap_or(n - 1))
}

/// Conjugate update: prior `N(0, s²)`, `count` observations with sum `sum` and noise `σ`.
///
/// An empty segment draws straight from the prior.
fn sample_regime_mean(
    count: usize,
    sum: f64,
    sigma: f64,
    prior_scale: f64,
    rng: &mut StdRng,
    parameter: &'static str,
    iteration: usize,
) -> Result<f64, SamplerFault> {
    let var = sigma * sigma;
    let precision = 1.0 / (prior_scale * prior_scale) + count as f64 / var;
    let mean = (sum / var) / precision;
    let sd = precision.sqrt().recip();
    if !(mean.is_finite() && sd.is_finite()) {
        return Err(SamplerFault::NonFinite { parameter, iteration });
    }
    let dist = Normal::new(mean, sd).map_err(|e| SamplerFault::Distribution {
        parameter,
        iteration,
        message: e.to_string(),
    })?;
    let draw = dist.sample(rng);
    if !draw.is_finite() {
        return Err(SamplerFault::NonFinite { parameter, iteration });
    }
    Ok(draw)
}

/// Log target of `η = ln σ` including the Jacobian of the transform.
fn log_sigma_target(eta: f64, ssr: f64, n: usize, prior_scale: f64) -> f64 {
    let var = (2.0 * eta).exp();
    -(n as f64) * eta - ssr / (2.0 * var) - var / (2.0 * prior_scale * prior_scale) + eta
}

/// Returns `(new σ, acceptance probability, accepted?)`.
fn sigma_step(
    sigma: f64,
    ssr: f64,
    n: usize,
    prior_scale: f64,
    step: f64,
    rng: &mut StdRng,
) -> (f64, f64, bool) {
    let eta = sigma.ln();
    let z: f64 = rng.sample(StandardNormal);
    let proposal = eta + step * z;

    let log_ratio =
        log_sigma_target(proposal, ssr, n, prior_scale) - log_sigma_target(eta, ssr, n, prior_scale);
    let accept_prob = if log_ratio.is_nan() { 0.0 } else { log_ratio.exp().min(1.0) };

    if rng.r#gen::<f64>() < accept_prob {
        (proposal.exp(), accept_prob, true)
    } else {
        (sigma, accept_prob, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifted_series() -> Vec<f64> {
        // Deterministic "noise" so the test does not depend on a second RNG.
        (0..60)
            .map(|i| {
                let wiggle = ((i * 37 % 11) as f64 - 5.0) * 0.002;
                if i < 30 { -0.02 + wiggle } else { 0.03 + wiggle }
            })
            .collect()
    }

    #[test]
    fn chain_seeds_differ_per_chain_and_are_stable() {
        assert_ne!(chain_seed(42, 0), chain_seed(42, 1));
        assert_eq!(chain_seed(42, 3), chain_seed(42, 3));
    }

    #[test]
    fn chain_produces_requested_draws() {
        let values = shifted_series();
        let sums = SegmentSums::new(&values);
        let config = SamplerConfig {
            draws: 200,
            tune: 100,
            chains: 1,
            ..SamplerConfig::default()
        };
        let out = run_chain(&values, &sums, &config, 0).unwrap();
        assert_eq!(out.samples.len(), 200);
        assert!((0.0..=1.0).contains(&out.sigma_acceptance));
        assert!(out.samples.iter().all(|s| s.tau < values.len() && s.sigma > 0.0));
    }

    #[test]
    fn chain_locates_a_clear_shift() {
        let values = shifted_series();
        let sums = SegmentSums::new(&values);
        let config = SamplerConfig {
            draws: 300,
            tune: 200,
            chains: 1,
            ..SamplerConfig::default()
        };
        let out = run_chain(&values, &sums, &config, 0).unwrap();
        let at_break = out.samples.iter().filter(|s| s.tau == 29).count();
        assert!(at_break * 2 > out.samples.len(), "only {at_break} draws at tau=29");
    }

    #[test]
    fn sigma_target_matches_joint_posterior_plus_jacobian() {
        let values = shifted_series();
        let sums = SegmentSums::new(&values);
        let (tau, pre, post, s) = (29, -0.02, 0.03, 0.05);
        let ssr = sums.residual_ss(tau, pre, post);
        let (a, b) = (0.004_f64, 0.011_f64);

        let target = log_sigma_target(a.ln(), ssr, values.len(), s) - log_sigma_target(b.ln(), ssr, values.len(), s);
        let joint = crate::model::log_posterior(&sums, tau, pre, post, a, s)
            - crate::model::log_posterior(&sums, tau, pre, post, b, s)
            + (a.ln() - b.ln());
        assert!((target - joint).abs() < 1e-9, "{target} vs {joint}");
    }

    #[test]
    fn switch_sampling_rejects_all_negative_infinity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut w = vec![f64::NEG_INFINITY; 4];
        let err = sample_switch(&mut w, &mut rng, 7).unwrap_err();
        assert_eq!(err, SamplerFault::DegenerateSwitchWeights { iteration: 7, n: 4 });
    }

    #[test]
    fn empty_segment_draws_from_prior_scale() {
        let mut rng = StdRng::seed_from_u64(9);
        let draws: Vec<f64> = (0..4000)
            .map(|_| sample_regime_mean(0, 0.0, 0.01, 0.05, &mut rng, "post_mean", 0).unwrap())
            .collect();
        let sd = crate::math::sample_variance(&draws).unwrap().sqrt();
        assert!((sd - 0.05).abs() < 0.005, "sd={sd}");
    }
}
