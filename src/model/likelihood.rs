//! Log-density pieces of the two-regime model.
//!
//! ```text
//! τ          ~ DiscreteUniform(0, n − 1)
//! μ_pre      ~ Normal(0, s)
//! μ_post     ~ Normal(0, s)
//! σ          ~ HalfNormal(s)
//! x_i | ...  ~ Normal(μ_pre if τ ≥ i else μ_post, σ)
//! ```
//!
//! Index `i` belongs to the pre-change regime iff `i ≤ τ`, so the pre segment
//! always holds `τ + 1 ≥ 1` observations and the post segment may be empty
//! (`τ = n − 1`).
//!
//! Prefix sums of `x` and `x²` turn every segment residual sum of squares into
//! O(1) arithmetic, so a full sweep over all `n` candidate τ values is O(n).

use std::f64::consts::PI;

/// Count, sum and sum of squares of one regime segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentMoments {
    pub count: usize,
    pub sum: f64,
    pub sum_sq: f64,
}

impl SegmentMoments {
    /// `Σ (x_i − mean)²` over the segment.
    pub fn residual_ss(&self, mean: f64) -> f64 {
        let n = self.count as f64;
        // Rounding can push an exact zero slightly negative.
        (self.sum_sq - 2.0 * mean * self.sum + n * mean * mean).max(0.0)
    }
}

/// Prefix sums over the observed log-returns.
#[derive(Debug, Clone)]
pub struct SegmentSums {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl SegmentSums {
    pub fn new(values: &[f64]) -> Self {
        let mut sum = Vec::with_capacity(values.len() + 1);
        let mut sum_sq = Vec::with_capacity(values.len() + 1);
        sum.push(0.0);
        sum_sq.push(0.0);
        let (mut s, mut s2) = (0.0, 0.0);
        for &x in values {
            s += x;
            s2 += x * x;
            sum.push(s);
            sum_sq.push(s2);
        }
        Self { sum, sum_sq }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.sum.len() - 1
    }

    /// Companion to `len`; the model rejects short series before building sums.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moments of indices `0..=tau`.
    pub fn pre(&self, tau: usize) -> SegmentMoments {
        let k = tau + 1;
        SegmentMoments {
            count: k,
            sum: self.sum[k],
            sum_sq: self.sum_sq[k],
        }
    }

    /// Moments of indices `tau + 1..n`.
    pub fn post(&self, tau: usize) -> SegmentMoments {
        let n = self.len();
        let k = tau + 1;
        SegmentMoments {
            count: n - k,
            sum: self.sum[n] - self.sum[k],
            sum_sq: self.sum_sq[n] - self.sum_sq[k],
        }
    }

    /// Total residual sum of squares for a regime assignment.
    pub fn residual_ss(&self, tau: usize, pre_mean: f64, post_mean: f64) -> f64 {
        self.pre(tau).residual_ss(pre_mean) + self.post(tau).residual_ss(post_mean)
    }

    /// Gaussian log-likelihood of all observations.
    pub fn log_likelihood(&self, tau: usize, pre_mean: f64, post_mean: f64, sigma: f64) -> f64 {
        let n = self.len() as f64;
        let ssr = self.residual_ss(tau, pre_mean, post_mean);
        -0.5 * n * (2.0 * PI).ln() - n * sigma.ln() - ssr / (2.0 * sigma * sigma)
    }

    /// Unnormalised log-weights of every τ given the other parameters.
    ///
    /// The uniform prior and every term not depending on τ are dropped.
    pub fn switch_log_weights(&self, pre_mean: f64, post_mean: f64, sigma: f64, out: &mut Vec<f64>) {
        let inv_two_var = 1.0 / (2.0 * sigma * sigma);
        out.clear();
        out.extend((0..self.len()).map(|tau| -self.residual_ss(tau, pre_mean, post_mean) * inv_two_var));
    }
}

/// `ln N(x; 0, scale)`.
pub fn log_normal_prior(x: f64, scale: f64) -> f64 {
    -0.5 * (2.0 * PI).ln() - scale.ln() - x * x / (2.0 * scale * scale)
}

/// `ln HalfNormal(x; scale)`, `-∞` outside the support.
pub fn log_half_normal_prior(x: f64, scale: f64) -> f64 {
    if x <= 0.0 {
        return f64::NEG_INFINITY;
    }
    log_normal_prior(x, scale) + 2.0_f64.ln()
}

/// Unnormalised joint log-posterior.
///
/// The sampler only evaluates full conditionals; this is the reference they
/// are checked against in tests.
pub fn log_posterior(
    sums: &SegmentSums,
    tau: usize,
    pre_mean: f64,
    post_mean: f64,
    sigma: f64,
    prior_scale: f64,
) -> f64 {
    let n = sums.len() as f64;
    -n.ln()
        + log_normal_prior(pre_mean, prior_scale)
        + log_normal_prior(post_mean, prior_scale)
        + log_half_normal_prior(sigma, prior_scale)
        + sums.log_likelihood(tau, pre_mean, post_mean, sigma)
}
