//! Backtest configuration loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid config. Sections:
//! `[data]`, `[columns]`, `[execution]`, `[risk]`, `[selection]`,
//! `[metrics]`, `[portfolio]`, and any number of `[[strategies]]`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use daylab_core::data::ColumnMap;
use daylab_core::engine::{RiskConfig, SimConfig};
use daylab_core::fees::FeeModel;
use daylab_core::strategy::{default_catalog, StrategyError, StrategyFamily};

use crate::fitness::ScoreMetric;
use crate::metrics::MetricsConfig;

/// Content hash of a configuration (BLAKE3 hex digest).
pub type ConfigHash = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("strategy family '{family}': {source}")]
    Strategy {
        family: String,
        #[source]
        source: StrategyError,
    },
}

// ─── Sections ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding one sub-directory per trading day.
    pub data_root: PathBuf,
    /// Where selection outputs are written.
    pub results_root: PathBuf,
    /// Instruments to keep; empty keeps every instrument file.
    pub tickers: Vec<String>,
    /// Use only the first N day directories.
    pub max_days: Option<usize>,
    /// Day directory names are `<day_prefix>DD_DD_DD`.
    pub day_prefix: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("Data"),
            results_root: PathBuf::from("Results"),
            tickers: Vec::new(),
            max_days: None,
            day_prefix: "Yahoo_1m_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Fraction of notional per side of a round trip (0.0001 = 1 bp).
    pub fee_rate: f64,
    pub unit_size: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            fee_rate: 0.0001,
            unit_size: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    pub atr_period: usize,
    pub stop_atr: f64,
    pub take_atr: f64,
}

impl Default for RiskSection {
    fn default() -> Self {
        let risk = RiskConfig::default();
        Self {
            atr_period: risk.atr_period,
            stop_atr: risk.stop_multiplier,
            take_atr: risk.take_multiplier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Fraction of days used in-sample; the split index is floor(n × ratio).
    pub is_ratio: f64,
    pub score: ScoreMetric,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            is_ratio: 5.0 / 6.0,
            score: ScoreMetric::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Per-ticker weights for the portfolio series. Empty means weight 1.0
    /// for every instrument; otherwise unlisted instruments weigh 0.0.
    pub weights: BTreeMap<String, f64>,
}

impl PortfolioConfig {
    pub fn weight(&self, ticker: &str) -> f64 {
        if self.weights.is_empty() {
            1.0
        } else {
            self.weights.get(ticker).copied().unwrap_or(0.0)
        }
    }
}

// ─── Top level ───────────────────────────────────────────────────────

/// Full configuration of an IS/OOS selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Seed for synthetic data generation.
    pub seed: u64,
    pub data: DataConfig,
    pub columns: ColumnMap,
    pub execution: ExecutionConfig,
    pub risk: RiskSection,
    pub selection: SelectionConfig,
    pub metrics: MetricsConfig,
    pub portfolio: PortfolioConfig,
    /// Strategy families and grids. Empty means the built-in catalog.
    pub strategies: Vec<StrategyFamily>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            data: DataConfig::default(),
            columns: ColumnMap::default(),
            execution: ExecutionConfig::default(),
            risk: RiskSection::default(),
            selection: SelectionConfig::default(),
            metrics: MetricsConfig::default(),
            portfolio: PortfolioConfig::default(),
            strategies: Vec::new(),
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let ratio = self.selection.is_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return invalid(format!("selection.is_ratio must be in (0, 1], got {ratio}"));
        }
        if self.risk.atr_period == 0 {
            return invalid("risk.atr_period must be positive".to_string());
        }
        if !(self.risk.stop_atr >= 0.0 && self.risk.take_atr >= 0.0) {
            return invalid(format!(
                "risk multipliers must be non-negative, got stop_atr={} take_atr={}",
                self.risk.stop_atr, self.risk.take_atr
            ));
        }
        if !(self.execution.fee_rate >= 0.0) {
            return invalid(format!(
                "execution.fee_rate must be non-negative, got {}",
                self.execution.fee_rate
            ));
        }
        if !(self.execution.unit_size > 0.0) {
            return invalid(format!(
                "execution.unit_size must be positive, got {}",
                self.execution.unit_size
            ));
        }
        self.metrics.validate()?;
        if let Some(0) = self.data.max_days {
            return invalid("data.max_days must be positive when set".to_string());
        }

        let mut names = BTreeSet::new();
        for family in &self.strategies {
            if !names.insert(family.name.as_str()) {
                return invalid(format!("duplicate strategy family name '{}'", family.name));
            }
            if family.name.is_empty()
                || family.name.contains(['/', '\\'])
                || family.name == ".."
            {
                return invalid(format!(
                    "strategy family name '{}' cannot be used as a directory name",
                    family.name
                ));
            }
            if family.grid.is_empty() {
                return invalid(format!("strategy family '{}' has an empty grid", family.name));
            }
            let mut labels = BTreeSet::new();
            for cfg in &family.grid {
                cfg.validate().map_err(|source| ConfigError::Strategy {
                    family: family.name.clone(),
                    source,
                })?;
                let label = cfg.label();
                if !labels.insert(label.clone()) {
                    return invalid(format!(
                        "strategy family '{}' repeats grid point '{label}'",
                        family.name
                    ));
                }
            }
        }
        Ok(())
    }

    /// Configured strategy families, or the built-in catalog when none are set.
    pub fn strategy_families(&self) -> Vec<StrategyFamily> {
        if self.strategies.is_empty() {
            default_catalog()
        } else {
            self.strategies.clone()
        }
    }

    /// Simulator settings derived from `[execution]` and `[risk]`.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            fees: FeeModel::new(self.execution.fee_rate),
            unit_size: self.execution.unit_size,
            risk: RiskConfig {
                atr_period: self.risk.atr_period,
                stop_multiplier: self.risk.stop_atr,
                take_multiplier: self.risk.take_atr,
            },
        }
    }

    /// Deterministic content hash of this configuration.
    ///
    /// Two configs with identical content always hash the same.
    pub fn fingerprint(&self) -> ConfigHash {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
