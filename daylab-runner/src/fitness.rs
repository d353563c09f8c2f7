//! Selection score: configurable metric used to rank grid points in-sample.

use serde::{Deserialize, Serialize};

use daylab_core::domain::PnlRow;

use crate::config::PortfolioConfig;
use crate::metrics::{
    annualized_return, daily_returns, portfolio_series, sharpe_ratio, MetricsConfig,
};

/// Which portfolio metric ranks in-sample runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMetric {
    #[default]
    Sharpe,
    AnnualizedReturn,
}

impl ScoreMetric {
    /// Score a PnL table over its portfolio daily series.
    ///
    /// An empty table scores negative infinity, so any real result beats it.
    pub fn score(&self, rows: &[PnlRow], cfg: &MetricsConfig, portfolio: &PortfolioConfig) -> f64 {
        if rows.is_empty() {
            return f64::NEG_INFINITY;
        }
        let returns = daily_returns(&portfolio_series(rows, portfolio), cfg.notional);
        match self {
            Self::Sharpe => sharpe_ratio(&returns, cfg.periods_per_year),
            Self::AnnualizedReturn => {
                annualized_return(&returns, cfg.annualization, cfg.periods_per_year)
            }
        }
    }

    /// Returns true if `a` strictly beats `b`. Ties keep the earlier candidate.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        a > b
    }
}
