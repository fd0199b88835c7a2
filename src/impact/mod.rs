//! Descriptive impact statistics and event association around change points.
//!
//! Nothing here is Bayesian: prices are split at an index and summarised, and
//! reference events are matched by calendar distance.

use tracing::debug;

use crate::domain::{ChangePointSummary, Event, ImpactSummary, PricePoint};
use crate::error::AppError;
use crate::math::mean;
use crate::report::percent_change;

/// Window used by the CLI when none is given.
pub const DEFAULT_EVENT_WINDOW_DAYS: u32 = 30;

/// Sentinel written when no event falls inside the window.
pub const NO_EVENTS: &str = "None";

/// Split prices at `tau` (before = `[0, tau)`, after = `[tau, end]`) and compare means.
///
/// `tau == 0` leaves the before slice empty: `before_mean`, `change` and
/// `percent_change` are then `NaN` rather than an error.
pub fn quantify_impact(prices: &[PricePoint], tau: usize) -> Result<ImpactSummary, AppError> {
    check_index(prices, tau)?;

    let before: Vec<f64> = prices[..tau].iter().map(|p| p.price).collect();
    let after: Vec<f64> = prices[tau..].iter().map(|p| p.price).collect();

    let before_mean = mean(&before).unwrap_or(f64::NAN);
    let after_mean = mean(&after).unwrap_or(f64::NAN);
    let change = after_mean - before_mean;

    Ok(ImpactSummary {
        before_mean,
        after_mean,
        change,
        percent_change: percent_change(change, before_mean),
    })
}

/// Events within `window_days` (inclusive, either side) of the price date at `tau`.
///
/// Input order is preserved; an empty result is a valid answer.
pub fn associate_events(
    prices: &[PricePoint],
    events: &[Event],
    tau: usize,
    window_days: u32,
) -> Result<Vec<Event>, AppError> {
    check_index(prices, tau)?;
    let anchor = prices[tau].date;
    let window = i64::from(window_days);

    let matched: Vec<Event> = events
        .iter()
        .filter(|e| (e.date - anchor).num_days().abs() <= window)
        .cloned()
        .collect();

    debug!(tau, %anchor, window_days, matched = matched.len(), "associated events");
    Ok(matched)
}

/// One row per τ (order kept, duplicates kept) combining date, events and impact.
///
/// Any out-of-range τ fails the whole call.
pub fn summarize_change_points(
    prices: &[PricePoint],
    events: &[Event],
    taus: &[usize],
    window_days: u32,
) -> Result<Vec<ChangePointSummary>, AppError> {
    taus.iter()
        .map(|&tau| {
            let impact = quantify_impact(prices, tau)?;
            let matched = associate_events(prices, events, tau, window_days)?;
            let labels = if matched.is_empty() {
                NO_EVENTS.to_string()
            } else {
                matched.iter().map(|e| e.label.as_str()).collect::<Vec<_>>().join("; ")
            };
            Ok(ChangePointSummary {
                tau,
                date: prices[tau].date,
                events: labels,
                before_mean: impact.before_mean,
                after_mean: impact.after_mean,
                change: impact.change,
                percent_change: impact.percent_change,
            })
        })
        .collect()
}

fn check_index(prices: &[PricePoint], tau: usize) -> Result<(), AppError> {
    if prices.is_empty() {
        return Err(AppError::validation("Price series is empty."));
    }
    if tau >= prices.len() {
        return Err(AppError::validation(format!(
            "Change point index {tau} is out of bounds for a series of {} prices (max {}).",
            prices.len(),
            prices.len() - 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn prices(values: &[f64]) -> Vec<PricePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(d(2020, 3, 1).checked_add_days(Days::new(i as u64)).unwrap(), p))
            .collect()
    }

    fn event(date: NaiveDate, label: &str) -> Event {
        Event {
            date,
            label: label.to_string(),
            category: "Geopolitical".to_string(),
        }
    }

    #[test]
    fn impact_splits_before_and_after() {
        let p = prices(&[60.0, 62.0, 30.0, 34.0]);
        let s = quantify_impact(&p, 2).unwrap();
        assert!((s.before_mean - 61.0).abs() < 1e-12);
        assert!((s.after_mean - 32.0).abs() < 1e-12);
        assert!((s.change + 29.0).abs() < 1e-12);
        assert!((s.percent_change - (-29.0 / 61.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn impact_at_zero_has_nan_before_mean() {
        let s = quantify_impact(&prices(&[60.0, 62.0]), 0).unwrap();
        assert!(s.before_mean.is_nan());
        assert!(s.change.is_nan());
        assert!(s.percent_change.is_nan());
        assert!((s.after_mean - 61.0).abs() < 1e-12);
    }

    #[test]
    fn impact_rejects_out_of_bounds() {
        let err = quantify_impact(&prices(&[60.0, 62.0]), 2).unwrap_err();
        assert!(err.to_string().contains("index 2"), "{err}");
    }

    #[test]
    fn event_window_is_inclusive() {
        let p = prices(&[60.0, 61.0, 62.0]);
        // tau = 1 -> 2020-03-02
        let events = vec![
            event(d(2020, 3, 7), "five days after"),
            event(d(2020, 3, 8), "six days after"),
            event(d(2020, 2, 26), "five days before"),
            event(d(2020, 2, 25), "six days before"),
        ];
        let matched = associate_events(&p, &events, 1, 5).unwrap();
        let labels: Vec<&str> = matched.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["five days after", "five days before"]);
    }

    #[test]
    fn no_matching_event_is_not_an_error() {
        let p = prices(&[60.0, 61.0]);
        let matched = associate_events(&p, &[event(d(2021, 1, 1), "far away")], 0, 5).unwrap();
        assert!(matched.is_empty());
    }

    #[test]
    fn summary_keeps_order_duplicates_and_sentinel() {
        let p = prices(&[60.0, 61.0, 40.0, 41.0, 42.0]);
        let events = vec![
            event(d(2020, 3, 3), "Price war"),
            event(d(2020, 3, 4), "Lockdowns"),
        ];
        let rows = summarize_change_points(&p, &events, &[2, 0, 2], 1).unwrap();
        assert_eq!(rows.iter().map(|r| r.tau).collect::<Vec<_>>(), vec![2, 0, 2]);
        assert_eq!(rows[0].events, "Price war; Lockdowns");
        assert_eq!(rows[1].events, NO_EVENTS);
        assert_eq!(rows[0], rows[2]);
        assert_eq!(rows[0].date, d(2020, 3, 3));
    }

    #[test]
    fn summary_fails_on_any_bad_index() {
        let p = prices(&[60.0, 61.0]);
        assert!(summarize_change_points(&p, &[], &[0, 5], 5).is_err());
    }
}
