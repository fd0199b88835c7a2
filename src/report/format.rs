//! Formatted terminal output.
//!
//! Formatting lives in one place so the sampler and report code stay free of
//! presentation concerns.

use crate::domain::{ChangePointReport, ChangePointSummary, Frequency, ReturnPoint, SamplerConfig};
use crate::model::PosteriorSummary;

/// Format the full `detect` summary: input, sampler, diagnostics and the report.
pub fn format_run_summary(
    returns: &[ReturnPoint],
    aggregate: Option<Frequency>,
    sampler: &SamplerConfig,
    summary: &PosteriorSummary,
    report: &ChangePointReport,
) -> String {
    let mut out = String::new();

    out.push_str("=== brent-cp - Bayesian change point ===\n");
    out.push_str(&format!(
        "Returns: n={} | aggregate={}",
        returns.len(),
        aggregate.map(Frequency::display_name).unwrap_or("none"),
    ));
    if let (Some(first), Some(last)) = (returns.first(), returns.last()) {
        out.push_str(&format!(" | {} .. {}", first.date, last.date));
    }
    out.push('\n');
    out.push_str(&format!(
        "Sampler: draws={} tune={} chains={} target_accept={:.2} seed={} prior_scale={}\n",
        sampler.draws,
        sampler.tune,
        sampler.chains,
        sampler.target_accept,
        sampler.random_seed,
        sampler.prior_scale,
    ));

    out.push_str("\nPosterior:\n");
    out.push_str(&format!(
        "  {:<10} {:>12} {:>12} {:>12} {:>12} {:>7}\n",
        "param", "mean", "sd", "q3%", "q97%", "r_hat"
    ));
    for p in &summary.parameters {
        out.push_str(&format!(
            "  {:<10} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>7}\n",
            p.name,
            p.mean,
            p.sd,
            p.q03,
            p.q97,
            fmt_opt(p.r_hat, 3),
        ));
    }
    if !summary.sigma_acceptance.is_empty() {
        let rates: Vec<String> = summary.sigma_acceptance.iter().map(|a| format!("{a:.2}")).collect();
        out.push_str(&format!("  sigma acceptance per chain: [{}]\n", rates.join(", ")));
    }
    if !summary.converged() {
        out.push_str("  warning: r_hat above threshold; chains may not have converged\n");
    }

    out.push_str(&format_report(report));
    out
}

/// Format a single change-point report.
pub fn format_report(report: &ChangePointReport) -> String {
    let mut out = String::new();
    out.push_str("\nChange point:\n");
    out.push_str(&format!("- index      : {}\n", report.index));
    out.push_str(&format!("- date       : {}\n", report.date));
    out.push_str(&format!("- mean before: {:.6}\n", report.mean_before));
    out.push_str(&format!("- mean after : {:.6}\n", report.mean_after));
    out.push_str(&format!("- delta      : {:.6}\n", report.delta));
    out.push_str(&format!("- change     : {}%\n", fmt_opt(report.percent_change, 2)));
    out.push_str(&format!("- confidence : {:.3}\n", report.confidence));
    out
}

/// Format a multi-τ impact table.
pub fn format_impact_table(rows: &[ChangePointSummary]) -> String {
    if rows.is_empty() {
        return "(no change points)\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:>6}  {:<10}  {:>10}  {:>10}  {:>10}  {:>8}  Events\n",
        "tau", "date", "before", "after", "change", "pct"
    ));
    for r in rows {
        out.push_str(&format!(
            "{:>6}  {:<10}  {:>10}  {:>10.2}  {:>10}  {:>8}  {}\n",
            r.tau,
            r.date,
            fmt_opt(r.before_mean, 2),
            r.after_mean,
            fmt_opt(r.change, 2),
            fmt_opt(r.percent_change, 1),
            r.events,
        ));
    }
    out
}

fn fmt_opt(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn nan_percent_is_shown_as_not_available() {
        let report = ChangePointReport {
            index: 3,
            date: NaiveDate::from_ymd_opt(2008, 7, 11).unwrap(),
            mean_before: 0.0,
            mean_after: -0.01,
            delta: -0.01,
            percent_change: f64::NAN,
            confidence: 0.42,
        };
        let text = format_report(&report);
        assert!(text.contains("2008-07-11"));
        assert!(text.contains("n/a%"));
        assert!(text.contains("0.420"));
    }

    #[test]
    fn impact_table_lists_rows_in_order() {
        let row = |tau: usize, events: &str| ChangePointSummary {
            tau,
            date: NaiveDate::from_ymd_opt(2020, 3, 9).unwrap(),
            events: events.to_string(),
            before_mean: 60.0,
            after_mean: 30.0,
            change: -30.0,
            percent_change: -50.0,
        };
        let text = format_impact_table(&[row(12, "OPEC+ talks collapse"), row(3, "None")]);
        let first = text.find("OPEC+").unwrap();
        let second = text.find("None").unwrap();
        assert!(first < second);
        assert!(text.contains("-50.0"));
    }
}
