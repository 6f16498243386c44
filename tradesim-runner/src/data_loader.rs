//! Chart loading for the runner.
//!
//! A chart file is the JSON form of [`Chart`]: partitions keyed by period
//! label (or `AnyTimeFrame`), each holding named series:
//!
//! ```json
//! { "01-hs": { "series": { "candles": [ { "begin": 0, "end": 3600000, "close": 1.0 } ] } } }
//! ```
//!
//! Day-partitioned sessions point at a directory with one `YYYY-MM-DD.json`
//! file per UTC day; the file for the snapshot's process date is loaded.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tradesim_core::domain::{Chart, Period};

/// Errors from reading or writing run files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path} has no candles for time frame {period}")]
    NoCandles { path: PathBuf, period: Period },
    #[error("day-partitioned dataset {path} needs a process date")]
    NoProcessDate { path: PathBuf },
}

/// Chart file to load for a run.
///
/// A directory is only valid for day-partitioned sessions, where `day`
/// selects the file. Anything else is used as given.
pub fn resolve_chart_path(path: &Path, day: Option<NaiveDate>) -> Result<PathBuf, LoadError> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }
    match day {
        Some(day) => Ok(path.join(format!("{}.json", day.format("%Y-%m-%d")))),
        None => Err(LoadError::NoProcessDate {
            path: path.to_path_buf(),
        }),
    }
}

/// Load a chart and make sure it carries candles for `period`.
pub fn load_chart(path: &Path, period: Period) -> Result<Chart, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let chart: Chart = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    match chart.candles(period) {
        Some(candles) if !candles.is_empty() => {
            tracing::debug!(
                path = %path.display(),
                candles = candles.len(),
                partitions = chart.keys().count(),
                "chart loaded"
            );
            Ok(chart)
        }
        _ => Err(LoadError::NoCandles {
            path: path.to_path_buf(),
            period,
        }),
    }
}
