//! Data loading: day directories, instrument files, CSV price frames.
//!
//! Layout under `data_root`:
//!
//! ```text
//! Yahoo_1m_24_03_04/
//!     df_AAPL_1m.csv
//!     df_^GSPC_1m.csv
//! Yahoo_1m_24_03_05/
//!     ...
//! ```
//!
//! Each CSV has a timestamp in the first column followed by numeric columns.
//! Unreadable files are logged and skipped; they never abort a load.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use daylab_core::data::PriceFrame;
use daylab_core::DayError;

use crate::config::DataConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: unparsable timestamp '{value}'")]
    Timestamp { path: PathBuf, value: String },

    #[error("{path}: no columns")]
    NoHeader { path: PathBuf },

    #[error("{path}: {source}")]
    Frame {
        path: PathBuf,
        #[source]
        source: DayError,
    },
}

// ─── Calendar ────────────────────────────────────────────────────────

/// One trading-day directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDir {
    pub name: String,
    pub path: PathBuf,
}

/// True when `name` ends with `<prefix>DD_DD_DD`.
pub fn is_day_dir_name(name: &str, prefix: &str) -> bool {
    const STAMP: usize = 8;
    if name.len() < prefix.len() + STAMP || !name.is_char_boundary(name.len() - STAMP) {
        return false;
    }
    let (head, stamp) = name.split_at(name.len() - STAMP);
    if !head.ends_with(prefix) {
        return false;
    }
    stamp.bytes().enumerate().all(|(i, b)| match i {
        2 | 5 => b == b'_',
        _ => b.is_ascii_digit(),
    })
}

/// Day directories under `root`, sorted by name. A missing root gives none.
pub fn list_day_directories(root: &Path, prefix: &str) -> Result<Vec<DayDir>, LoadError> {
    if !root.exists() {
        warn!(root = %root.display(), "data root does not exist");
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(root).map_err(|source| LoadError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut days = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if path.is_dir() && is_day_dir_name(&name, prefix) {
            days.push(DayDir { name, path });
        }
    }
    days.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(days)
}

// ─── Tickers ─────────────────────────────────────────────────────────

/// Ticker from an instrument file name: the text between `df_` and the next `_`.
pub fn extract_ticker(filename: &str) -> Option<&str> {
    let rest = filename.strip_prefix("df_")?;
    // The ticker has at least one character, so the search starts at 1.
    let end = rest.get(1..)?.find('_')? + 1;
    Some(&rest[..end])
}

/// Normalise ticker spellings that differ between symbols and file names.
pub fn sanitize_ticker(s: &str) -> String {
    s.replace('^', "")
        .replace("=F", "_F")
        .replace("=X", "_X")
        .replace(['=', '/', '.'], "_")
}

/// Exact match, or match after sanitising both sides.
pub fn ticker_matches(desired: &str, from_file: &str) -> bool {
    desired == from_file || sanitize_ticker(desired) == sanitize_ticker(from_file)
}

/// Instrument CSV files in a day directory, sorted by name.
pub fn list_instrument_files(day: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = std::fs::read_dir(day).map_err(|source| LoadError::Io {
        path: day.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension().is_some_and(|ext| ext == "csv")
                && p
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("df_"))
        })
        .collect();
    files.sort();
    Ok(files)
}

// ─── CSV frames ──────────────────────────────────────────────────────

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"];

/// Parse a bar timestamp. Offsets are dropped, keeping exchange-local time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(value, fmt) {
            return Some(ts.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
    }
    None
}

fn parse_cell(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Read one instrument CSV into a frame sorted by time.
///
/// Empty or non-numeric cells become NaN.
pub fn read_price_csv(path: &Path) -> Result<PriceFrame, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(LoadError::NoHeader {
            path: path.to_path_buf(),
        });
    }

    let value_columns = headers.len() - 1;
    let mut timestamps = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); value_columns];

    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let raw_ts = record.get(0).unwrap_or_default();
        let ts = parse_timestamp(raw_ts).ok_or_else(|| LoadError::Timestamp {
            path: path.to_path_buf(),
            value: raw_ts.to_string(),
        })?;
        timestamps.push(ts);
        for (j, column) in columns.iter_mut().enumerate() {
            column.push(record.get(j + 1).map_or(f64::NAN, parse_cell));
        }
    }

    let mut frame = PriceFrame::new(timestamps);
    for (name, values) in headers.into_iter().skip(1).zip(columns) {
        frame
            .insert_column(name, values)
            .map_err(|source| LoadError::Frame {
                path: path.to_path_buf(),
                source,
            })?;
    }
    frame.sort_by_time();
    Ok(frame)
}

// ─── Data set ────────────────────────────────────────────────────────

/// One instrument's frame for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub ticker: String,
    pub frame: PriceFrame,
}

/// All instruments of one trading day, in file-name order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDay {
    pub name: String,
    pub instruments: Vec<Instrument>,
}

/// Every loaded day, held in memory so a grid can be replayed without I/O.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    pub days: Vec<LoadedDay>,
}

impl DataSet {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn instrument_days(&self) -> usize {
        self.days.iter().map(|d| d.instruments.len()).sum()
    }
}

/// Load one day directory, keeping instruments that match `tickers`
/// (all of them when `tickers` is empty).
pub fn load_day(day: &DayDir, tickers: &[String]) -> LoadedDay {
    let files = match list_instrument_files(&day.path) {
        Ok(files) => files,
        Err(e) => {
            warn!(day = %day.name, error = %e, "skipping unreadable day directory");
            Vec::new()
        }
    };

    let mut instruments = Vec::new();
    for path in files {
        let Some(ticker) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(extract_ticker)
            .map(str::to_string)
        else {
            continue;
        };
        if !tickers.is_empty() && !tickers.iter().any(|t| ticker_matches(t, &ticker)) {
            continue;
        }
        match read_price_csv(&path) {
            Ok(frame) if frame.is_empty() => {
                debug!(day = %day.name, %ticker, "empty instrument file");
            }
            Ok(frame) => instruments.push(Instrument { ticker, frame }),
            Err(e) => warn!(day = %day.name, %ticker, error = %e, "skipping instrument file"),
        }
    }

    LoadedDay {
        name: day.name.clone(),
        instruments,
    }
}

/// Load every day in parallel, preserving day order.
pub fn load_dataset(days: &[DayDir], tickers: &[String]) -> DataSet {
    DataSet {
        days: days.par_iter().map(|d| load_day(d, tickers)).collect(),
    }
}

/// List, truncate to `max_days`, and load the configured data root.
pub fn load_configured(cfg: &DataConfig) -> Result<DataSet, LoadError> {
    let mut days = list_day_directories(&cfg.data_root, &cfg.day_prefix)?;
    if let Some(max) = cfg.max_days {
        days.truncate(max);
    }
    let data = load_dataset(&days, &cfg.tickers);
    info!(
        days = data.len(),
        instrument_days = data.instrument_days(),
        root = %cfg.data_root.display(),
        "loaded data set"
    );
    Ok(data)
}
