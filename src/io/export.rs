//! Tabular exports.
//!
//! Column names and order are a persisted contract with downstream consumers,
//! so each table's header is a named constant and written explicitly (also for
//! empty tables).

use std::fs::create_dir_all;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::domain::{ChangePointReport, ChangePointSummary, DetectedEvent, ReturnPoint};
use crate::error::AppError;

pub const REPORT_COLUMNS: [&str; 6] = ["Date", "MeanBefore", "MeanAfter", "Delta", "PercentChange", "Confidence"];
pub const DETECTED_EVENT_COLUMNS: [&str; 5] = ["Date", "ChangePoint", "MeanBefore", "MeanAfter", "StdDev"];
pub const RETURN_COLUMNS: [&str; 3] = ["Date", "Price", "LogReturn"];
pub const SUMMARY_COLUMNS: [&str; 7] = [
    "Tau",
    "Date",
    "Events",
    "BeforeMean",
    "AfterMean",
    "Change",
    "PercentChange",
];

#[derive(Serialize)]
struct ReportRow {
    date: NaiveDate,
    mean_before: f64,
    mean_after: f64,
    delta: f64,
    percent_change: f64,
    confidence: f64,
}

/// Write a single-row report CSV, creating parent directories as needed.
pub fn export_report(report: &ChangePointReport, path: &Path) -> Result<(), AppError> {
    ensure_complete(report)?;
    let row = ReportRow {
        date: report.date,
        mean_before: report.mean_before,
        mean_after: report.mean_after,
        delta: report.delta,
        percent_change: report.percent_change,
        confidence: report.confidence,
    };
    write_table(path, &REPORT_COLUMNS, [row])?;
    info!(path = %path.display(), "change point report exported");
    Ok(())
}

/// Write detected-event rows in the query service's schema.
pub fn export_detected_events(events: &[DetectedEvent], path: &Path) -> Result<(), AppError> {
    write_table(path, &DETECTED_EVENT_COLUMNS, events)?;
    info!(path = %path.display(), rows = events.len(), "detected events exported");
    Ok(())
}

/// Write the modelling table `{Date, Price, LogReturn}`.
pub fn export_returns(returns: &[ReturnPoint], path: &Path) -> Result<(), AppError> {
    write_table(path, &RETURN_COLUMNS, returns)?;
    info!(path = %path.display(), rows = returns.len(), "returns exported");
    Ok(())
}

/// Write a multi-τ impact table.
pub fn export_change_point_summaries(rows: &[ChangePointSummary], path: &Path) -> Result<(), AppError> {
    write_table(path, &SUMMARY_COLUMNS, rows)?;
    info!(path = %path.display(), rows = rows.len(), "change point summaries exported");
    Ok(())
}

fn ensure_complete(report: &ChangePointReport) -> Result<(), AppError> {
    let fields = [
        ("MeanBefore", report.mean_before),
        ("MeanAfter", report.mean_after),
        ("Delta", report.delta),
    ];
    if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(AppError::validation(format!(
            "Refusing to export incomplete report: {name} is {value}."
        )));
    }
    if !(0.0..=1.0).contains(&report.confidence) {
        return Err(AppError::validation(format!(
            "Refusing to export incomplete report: Confidence {} is outside [0, 1].",
            report.confidence
        )));
    }
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| AppError::io(parent, "Failed to create output directory", e))?;
    }
    Ok(())
}

fn write_table<T, I>(path: &Path, header: &[&str], rows: I) -> Result<(), AppError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    ensure_parent_dir(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::io(path, "Failed to create CSV", e.into()))?;

    writer
        .write_record(header)
        .map_err(|e| AppError::io(path, "Failed to write CSV header", e.into()))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::io(path, "Failed to write CSV row", e.into()))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(path, "Failed to flush CSV", e))?;
    Ok(())
}
