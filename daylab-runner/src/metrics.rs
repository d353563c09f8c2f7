//! Performance metrics: pure functions over daily PnL series.
//!
//! Every metric is a pure function: PnL rows or a return series in, scalar out.
//! Daily returns are net PnL per day (unit notional) or net PnL / notional
//! when a notional is configured.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use daylab_core::domain::PnlRow;

use crate::config::{ConfigError, PortfolioConfig};

/// Name of the aggregate row in a metric matrix.
pub const PORTFOLIO: &str = "Portfolio";

// ─── Configuration ───────────────────────────────────────────────────

/// How mean daily return is turned into an annual figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annualization {
    /// mean × periods_per_year.
    #[default]
    Arithmetic,
    /// (Π(1 + r))^(periods_per_year / n) − 1.
    Compounding,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub annualization: Annualization,
    pub periods_per_year: f64,
    /// Capital that daily PnL is divided by. `None` keeps raw PnL and
    /// switches drawdown to additive equity.
    pub notional: Option<f64>,
}

impl MetricsConfig {
    /// Compounding needs a notional: raw PnL is not a return.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(notional) = self.notional {
            if !(notional > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "metrics.notional must be positive, got {notional}"
                )));
            }
        }
        if self.annualization == Annualization::Compounding && self.notional.is_none() {
            return Err(ConfigError::Invalid(
                "compounding annualization needs a notional".to_string(),
            ));
        }
        if !(self.periods_per_year > 0.0) {
            return Err(ConfigError::Invalid(
                "metrics.periods_per_year must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            annualization: Annualization::Arithmetic,
            periods_per_year: 252.0,
            notional: None,
        }
    }
}

// ─── Daily series ────────────────────────────────────────────────────

/// Net PnL and trade count for one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub net_pnl: f64,
    pub num_trades: u32,
}

/// Group rows by date, summing net PnL and trade counts. Sorted by date.
pub fn daily_series(rows: &[PnlRow]) -> Vec<DailyPoint> {
    weighted_daily_series(rows, |_| 1.0)
}

/// Portfolio series: per-day sum of weight × net PnL across instruments.
pub fn portfolio_series(rows: &[PnlRow], portfolio: &PortfolioConfig) -> Vec<DailyPoint> {
    weighted_daily_series(rows, |ticker| portfolio.weight(ticker))
}

fn weighted_daily_series(rows: &[PnlRow], weight: impl Fn(&str) -> f64) -> Vec<DailyPoint> {
    let mut by_date: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for row in rows {
        let entry = by_date.entry(row.date).or_insert((0.0, 0));
        entry.0 += weight(&row.ticker) * row.net_pnl;
        entry.1 += row.num_trades;
    }
    by_date
        .into_iter()
        .map(|(date, (net_pnl, num_trades))| DailyPoint {
            date,
            net_pnl,
            num_trades,
        })
        .collect()
}

/// Daily return series from a daily PnL series.
pub fn daily_returns(series: &[DailyPoint], notional: Option<f64>) -> Vec<f64> {
    let scale = notional.unwrap_or(1.0);
    series.iter().map(|p| p.net_pnl / scale).collect()
}

// ─── Scalar metrics ──────────────────────────────────────────────────

/// Annualized Sharpe ratio: mean / sample std × sqrt(periods_per_year).
///
/// Returns 0.0 with fewer than 2 observations or a zero/undefined std.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    if returns.iter().all(|r| *r == returns[0]) {
        return 0.0;
    }
    let mean = mean_f64(returns);
    let std = std_dev(returns);
    // Rounding noise in the std grows with the magnitude of the mean.
    if !std.is_finite() || std <= f64::EPSILON * 16.0 * mean.abs().max(1.0) {
        return 0.0;
    }
    (mean / std) * periods_per_year.sqrt()
}

/// Annualized return under the chosen convention. 0.0 for an empty series.
pub fn annualized_return(returns: &[f64], mode: Annualization, periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    match mode {
        Annualization::Arithmetic => mean_f64(returns) * periods_per_year,
        Annualization::Compounding => {
            let equity: f64 = returns.iter().map(|r| 1.0 + r).product();
            if equity <= 0.0 {
                return -1.0;
            }
            equity.powf(periods_per_year / returns.len() as f64) - 1.0
        }
    }
}

/// Most negative drawdown of additive equity (cumulative PnL).
///
/// The running peak starts at 0, so an opening loss counts as drawdown.
/// Always ≤ 0.0; 0.0 for an empty or never-declining series.
pub fn max_drawdown_additive(returns: &[f64]) -> f64 {
    let mut equity = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for r in returns {
        equity += r;
        peak = peak.max(equity);
        max_dd = max_dd.min(equity - peak);
    }
    max_dd
}

/// Most negative `equity / peak − 1` of compounded returns, equity starting at 1.
///
/// Always in [-1.0, 0.0]; 0.0 for an empty or never-declining series.
pub fn max_drawdown_compounded(returns: &[f64]) -> f64 {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for r in returns {
        equity = (equity * (1.0 + r)).max(0.0);
        peak = peak.max(equity);
        if peak > 0.0 {
            max_dd = max_dd.min(equity / peak - 1.0);
        }
    }
    max_dd
}

/// Mean of per-day trade counts. 0.0 for an empty series.
pub fn avg_daily_trades(series: &[DailyPoint]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().map(|p| p.num_trades as f64).sum::<f64>() / series.len() as f64
}

// ─── Metric matrix ───────────────────────────────────────────────────

/// One line of the metric matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    #[serde(rename = "Asset")]
    pub asset: String,
    #[serde(rename = "Net Return Ann.")]
    pub net_return_ann: f64,
    #[serde(rename = "Sharpe")]
    pub sharpe: f64,
    #[serde(rename = "MaxDD")]
    pub max_drawdown: f64,
    #[serde(rename = "Avg Daily Trades")]
    pub avg_daily_trades: f64,
}

impl MetricRow {
    /// Compute every metric for one daily series.
    pub fn from_series(asset: impl Into<String>, series: &[DailyPoint], cfg: &MetricsConfig) -> Self {
        let returns = daily_returns(series, cfg.notional);
        let max_drawdown = match cfg.notional {
            Some(_) => max_drawdown_compounded(&returns),
            None => max_drawdown_additive(&returns),
        };
        Self {
            asset: asset.into(),
            net_return_ann: annualized_return(&returns, cfg.annualization, cfg.periods_per_year),
            sharpe: sharpe_ratio(&returns, cfg.periods_per_year),
            max_drawdown,
            avg_daily_trades: avg_daily_trades(series),
        }
    }
}

/// Per-instrument rows sorted by ticker, then the `Portfolio` row.
///
/// Empty input gives an empty matrix.
pub fn build_metric_matrix(
    rows: &[PnlRow],
    cfg: &MetricsConfig,
    portfolio: &PortfolioConfig,
) -> Vec<MetricRow> {
    if rows.is_empty() {
        return Vec::new();
    }

    let tickers: BTreeSet<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
    let mut matrix: Vec<MetricRow> = tickers
        .into_iter()
        .map(|ticker| {
            let own: Vec<PnlRow> = rows.iter().filter(|r| r.ticker == ticker).cloned().collect();
            MetricRow::from_series(ticker, &daily_series(&own), cfg)
        })
        .collect();

    matrix.push(MetricRow::from_series(
        PORTFOLIO,
        &portfolio_series(rows, portfolio),
        cfg,
    ));
    matrix
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator).
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn row(d: u32, ticker: &str, net: f64, trades: u32) -> PnlRow {
        PnlRow::new(date(d), ticker, net, 0.0, trades)
    }

    // ── Config ──

    #[test]
    fn compounding_requires_notional() {
        let cfg = MetricsConfig {
            annualization: Annualization::Compounding,
            ..MetricsConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let with_notional = MetricsConfig {
            notional: Some(10_000.0),
            ..cfg
        };
        assert!(with_notional.validate().is_ok());
        assert!(MetricsConfig::default().validate().is_ok());
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_constant_series_is_zero() {
        assert_eq!(sharpe_ratio(&[0.5; 20], 252.0), 0.0);
    }

    #[test]
    fn sharpe_constant_inexact_series_is_zero() {
        for n in [10, 20, 63] {
            assert_eq!(sharpe_ratio(&vec![1234.567; n], 252.0), 0.0, "n={n}");
        }
        // Noise around a large mean is still degenerate.
        let mut near = vec![1234.567; 10];
        near[3] += 1e-12;
        assert_eq!(sharpe_ratio(&near, 252.0), 0.0);
    }

    #[test]
    fn sharpe_single_observation_is_zero() {
        assert_eq!(sharpe_ratio(&[1.0], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[], 252.0), 0.0);
    }

    #[test]
    fn sharpe_known_values() {
        // mean 2, sample std 1
        let s = sharpe_ratio(&[1.0, 2.0, 3.0], 252.0);
        assert_approx(s, 2.0 * 252.0_f64.sqrt());
    }

    // ── Annualized return ──

    #[test]
    fn arithmetic_annualization() {
        assert_approx(
            annualized_return(&[0.001, 0.003], Annualization::Arithmetic, 252.0),
            0.002 * 252.0,
        );
    }

    #[test]
    fn compounding_annualization() {
        let r = annualized_return(&[0.01, 0.01], Annualization::Compounding, 252.0);
        assert_approx(r, 1.01_f64.powi(2).powf(126.0) - 1.0);
    }

    #[test]
    fn compounding_wipeout_is_minus_one() {
        assert_eq!(
            annualized_return(&[-1.5, 0.1], Annualization::Compounding, 252.0),
            -1.0
        );
    }

    #[test]
    fn empty_series_annualizes_to_zero() {
        assert_eq!(annualized_return(&[], Annualization::Compounding, 252.0), 0.0);
    }

    // ── Max drawdown ──

    #[test]
    fn additive_drawdown_known() {
        // equity 1, 3, 0, 2 -> peak 3, trough 0
        assert_approx(max_drawdown_additive(&[1.0, 2.0, -3.0, 2.0]), -3.0);
    }

    #[test]
    fn additive_drawdown_counts_opening_loss() {
        assert_approx(max_drawdown_additive(&[-2.0, 1.0]), -2.0);
    }

    #[test]
    fn compounded_drawdown_known() {
        // 1.1, then 0.99 -> 0.99 / 1.1 - 1
        assert_approx(max_drawdown_compounded(&[0.1, -0.1]), 0.99 / 1.1 - 1.0);
    }

    #[test]
    fn drawdown_of_rising_or_empty_series_is_zero() {
        assert_eq!(max_drawdown_additive(&[]), 0.0);
        assert_eq!(max_drawdown_additive(&[1.0, 0.0, 2.0]), 0.0);
        assert_eq!(max_drawdown_compounded(&[0.01, 0.02]), 0.0);
    }

    // ── Series ──

    #[test]
    fn daily_series_groups_and_sorts() {
        let rows = vec![row(5, "A", 1.0, 2), row(4, "A", -1.0, 1), row(5, "B", 0.5, 3)];
        let series = daily_series(&rows);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, date(4));
        assert_approx(series[1].net_pnl, 1.5);
        assert_eq!(series[1].num_trades, 5);
    }

    #[test]
    fn portfolio_weights_scale_pnl_not_trades() {
        let rows = vec![row(4, "A", 2.0, 1), row(4, "B", 4.0, 1)];
        let mut portfolio = PortfolioConfig::default();
        portfolio.weights.insert("A".into(), 0.5);
        let series = portfolio_series(&rows, &portfolio);
        // B is not listed: weight 0
        assert_approx(series[0].net_pnl, 1.0);
        assert_eq!(series[0].num_trades, 2);
    }

    #[test]
    fn notional_scales_returns() {
        let series = vec![DailyPoint {
            date: date(1),
            net_pnl: 500.0,
            num_trades: 1,
        }];
        assert_eq!(daily_returns(&series, Some(1000.0)), vec![0.5]);
        assert_eq!(daily_returns(&series, None), vec![500.0]);
    }

    // ── Matrix ──

    #[test]
    fn matrix_sorted_tickers_then_portfolio() {
        let rows = vec![
            row(4, "MSFT", 1.0, 2),
            row(4, "AAPL", 2.0, 4),
            row(5, "MSFT", -1.0, 0),
            row(5, "AAPL", 1.0, 2),
        ];
        let m = build_metric_matrix(&rows, &MetricsConfig::default(), &PortfolioConfig::default());
        let assets: Vec<&str> = m.iter().map(|r| r.asset.as_str()).collect();
        assert_eq!(assets, vec!["AAPL", "MSFT", PORTFOLIO]);

        assert_approx(m[0].avg_daily_trades, 3.0);
        assert_approx(m[0].net_return_ann, 1.5 * 252.0);
        assert_approx(m[1].max_drawdown, -1.0);
        // portfolio: day 4 = 3.0, day 5 = 0.0
        assert_approx(m[2].net_return_ann, 1.5 * 252.0);
        assert_approx(m[2].avg_daily_trades, 4.0);
    }

    #[test]
    fn empty_rows_give_empty_matrix() {
        assert!(build_metric_matrix(&[], &MetricsConfig::default(), &PortfolioConfig::default())
            .is_empty());
    }
}
