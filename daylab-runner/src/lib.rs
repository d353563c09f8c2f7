//! DayLab Runner: loading, session runs, selection, metrics, exports.
//!
//! This crate builds on `daylab-core` to provide:
//! - TOML configuration with research defaults and a content fingerprint
//! - Day-directory discovery and CSV instrument loading
//! - Session runner across instrument-days (parallel, order-preserving)
//! - Performance aggregator (per-instrument and portfolio metric matrix)
//! - In-sample grid selection with out-of-sample validation
//! - CSV/JSON exports and synthetic minute data

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod metrics;
pub mod selection;
pub mod session;
pub mod synthetic;

pub use config::{BacktestConfig, ConfigError, ConfigHash};
pub use data_loader::{list_day_directories, load_configured, load_dataset, DataSet, LoadError};
pub use fitness::ScoreMetric;
pub use metrics::{build_metric_matrix, Annualization, MetricRow, MetricsConfig, PORTFOLIO};
pub use selection::{run_and_export, run_selection, FamilyOutcome, SelectionError, SelectionReport};
pub use session::{run_session, split_days};
pub use synthetic::write_synthetic_days;
