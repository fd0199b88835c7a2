//! Process-wide structured logging.
//!
//! A single `tracing` subscriber is installed once at process start by
//! [`init_logging`]. When a log file is configured, the returned guard owns the
//! background writer; dropping it at process exit flushes buffered lines.
//!
//! Component targets follow the module tree (`brent_cp::model`,
//! `brent_cp::report`, ...), so e.g.
//!
//! ```bash
//! RUST_LOG=warn,brent_cp::model=debug brent-cp detect --prices prices.csv
//! ```

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::error::AppError;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable, multi-field lines (default).
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON lines (best for log aggregation).
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `info`, `brent_cp=debug`).
    pub level: String,
    pub format: LogFormat,
    /// Optional file receiving JSON lines in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Holds the background writer of the optional log file until process exit.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber. Call once, keep the guard alive until exit.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard, AppError> {
    let filter = build_filter(&config.level)?;

    let stderr_layer = format_layer(config.format, std::io::stderr);

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            crate::io::export::ensure_parent_dir(path)?;
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::io(path, "Failed to open log file", e))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).json().boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::validation(format!("Logging already initialised: {e}")))?;

    Ok(LogGuard { _file: guard })
}

fn format_layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer().with_writer(writer).pretty().boxed(),
        LogFormat::Compact => fmt::layer().with_writer(writer).compact().boxed(),
        LogFormat::Json => fmt::layer().with_writer(writer).json().boxed(),
    }
}

/// `RUST_LOG` wins over the configured level when set.
fn build_filter(level: &str) -> Result<EnvFilter, AppError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| AppError::validation(format!("Invalid log level '{level}': {e}")))
}
