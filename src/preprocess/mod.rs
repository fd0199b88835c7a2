//! Price series → log-return series.
//!
//! Responsibilities:
//!
//! - re-validate the modelling preconditions (non-empty, positive, ascending)
//! - optional last-observation aggregation (daily / weekly / monthly)
//! - `ln(p[i] / p[i-1])` with the first row dropped

pub mod resample;

pub use resample::*;

use tracing::{debug, info};

use crate::domain::{Frequency, PricePoint, ReturnPoint};
use crate::error::AppError;

/// Compute log-returns, optionally after aggregating to `aggregate`.
///
/// The input is never mutated. The result has exactly one row fewer than the
/// (aggregated) price series.
pub fn compute_returns(
    prices: &[PricePoint],
    aggregate: Option<Frequency>,
) -> Result<Vec<ReturnPoint>, AppError> {
    validate_prices(prices)?;

    let resampled;
    let series: &[PricePoint] = match aggregate {
        Some(frequency) => {
            resampled = resample_last(prices, frequency)?;
            info!(
                frequency = frequency.display_name(),
                rows_in = prices.len(),
                rows_out = resampled.len(),
                "aggregated price series"
            );
            &resampled
        }
        None => prices,
    };

    if series.len() < 2 {
        return Err(AppError::validation(format!(
            "Price series too short for returns: {} observation(s) after aggregation, need at least 2.",
            series.len()
        )));
    }

    let mut out = Vec::with_capacity(series.len() - 1);
    for (i, w) in series.windows(2).enumerate() {
        let log_return = (w[1].price / w[0].price).ln();
        if !log_return.is_finite() {
            return Err(AppError::validation(format!(
                "Non-finite log-return at index {} ({}): {} -> {}.",
                i + 1,
                w[1].date,
                w[0].price,
                w[1].price
            )));
        }
        out.push(ReturnPoint {
            date: w[1].date,
            price: w[1].price,
            log_return,
        });
    }

    debug!(rows = out.len(), "computed log-returns");
    Ok(out)
}

fn validate_prices(prices: &[PricePoint]) -> Result<(), AppError> {
    if prices.is_empty() {
        return Err(AppError::validation("Price series is empty."));
    }
    for (i, p) in prices.iter().enumerate() {
        if !(p.price.is_finite() && p.price > 0.0) {
            return Err(AppError::validation(format!(
                "Price at index {i} ({}) must be finite and > 0, got {}.",
                p.date, p.price
            )));
        }
        if i > 0 && p.date <= prices[i - 1].date {
            return Err(AppError::validation(format!(
                "Price dates must be strictly ascending: index {i} ({}) does not follow {}.",
                p.date,
                prices[i - 1].date
            )));
        }
    }
    Ok(())
}
