//! CSV ingest for price and event tables.
//!
//! Design goals:
//! - **Strict schema** for required columns (missing column → validation error naming it)
//! - **No silent coercion**: an unparseable date or price fails the load with its line number
//! - **Deterministic ordering**: prices are returned ascending by date

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::info;

use crate::domain::{Event, PricePoint};
use crate::error::AppError;

/// Load a `{Date, Price}` table, sorted ascending by date.
pub fn load_prices(path: &Path) -> Result<Vec<PricePoint>, AppError> {
    let (headers, records) = read_table(path)?;
    let header_map = build_header_map(&headers);
    let date_idx = require_column(&header_map, "Date", path)?;
    let price_idx = require_column(&header_map, "Price", path)?;

    let mut prices = Vec::with_capacity(records.len());
    for (line, record) in records {
        let date = parse_date(field(&record, date_idx, "Date", line)?)
            .map_err(|e| AppError::validation(format!("Line {line}: {e}")))?;
        let raw = field(&record, price_idx, "Price", line)?;
        let price = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::validation(format!("Line {line}: invalid Price value '{raw}'.")))?;
        prices.push(PricePoint::new(date, price));
    }

    prices.sort_by_key(|p| p.date);
    info!(path = %path.display(), rows = prices.len(), "loaded price series");
    Ok(prices)
}

/// Load a `{Date, Label, Category}` event table (`Event` is accepted for `Label`;
/// `Category` is optional). Order is preserved.
pub fn load_events(path: &Path) -> Result<Vec<Event>, AppError> {
    let (headers, records) = read_table(path)?;
    let header_map = build_header_map(&headers);
    let date_idx = require_column(&header_map, "Date", path)?;
    let label_idx = header_map
        .get("label")
        .or_else(|| header_map.get("event"))
        .copied()
        .ok_or_else(|| {
            AppError::validation(format!(
                "Missing required column `Label` (or `Event`) in '{}'.",
                path.display()
            ))
        })?;
    let category_idx = header_map.get("category").copied();

    let mut events = Vec::with_capacity(records.len());
    for (line, record) in records {
        let date = parse_date(field(&record, date_idx, "Date", line)?)
            .map_err(|e| AppError::validation(format!("Line {line}: {e}")))?;
        let label = field(&record, label_idx, "Label", line)?.to_string();
        let category = category_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .unwrap_or("")
            .to_string();
        events.push(Event { date, label, category });
    }

    info!(path = %path.display(), rows = events.len(), "loaded event table");
    Ok(events)
}

type NumberedRecords = Vec<(usize, StringRecord)>;

fn read_table(path: &Path) -> Result<(StringRecord, NumberedRecords), AppError> {
    let file = File::open(path).map_err(|e| AppError::io(path, "Failed to open CSV", e))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::validation(format!("Failed to read CSV headers in '{}': {e}", path.display())))?
        .clone();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::validation(format!("Line {line}: CSV parse error: {e}")))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        records.push((line, record));
    }
    Ok((headers, records))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, column: &str, path: &Path) -> Result<usize, AppError> {
    header_map
        .get(&column.to_ascii_lowercase())
        .copied()
        .ok_or_else(|| {
            AppError::validation(format!(
                "Missing required column `{column}` in '{}'.",
                path.display()
            ))
        })
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str, line: usize) -> Result<&'a str, AppError> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation(format!("Line {line}: missing {name} value.")))
}

/// Parse the date layouts seen in Brent price exports.
///
/// Older rows use `20-May-87`, newer ones `Apr 22, 2020`; ISO and day-first
/// numeric forms are accepted as well.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 7] = [
        "%Y-%m-%d",
        "%d-%b-%y",
        "%d-%b-%Y",
        "%b %d, %Y",
        "%d/%m/%Y",
        "%d-%m-%Y",
        "%Y/%m/%d",
    ];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD-Mon-YY, Mon DD, YYYY, DD/MM/YYYY, DD-MM-YYYY."
    ))
}
