//! PnL row: the per-instrument-day output of the day simulator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One record per (day, instrument).
///
/// Produced exactly once per instrument-day and never mutated afterwards.
/// `net_pnl` is always `gross_pnl - fees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "grossPnL")]
    pub gross_pnl: f64,
    #[serde(rename = "feesTrade")]
    pub fees: f64,
    #[serde(rename = "netPnL")]
    pub net_pnl: f64,
    #[serde(rename = "numTrade")]
    pub num_trades: u32,
}

impl PnlRow {
    /// Build a row from gross PnL and fees; net is derived, never accumulated separately.
    pub fn new(
        date: NaiveDate,
        ticker: impl Into<String>,
        gross_pnl: f64,
        fees: f64,
        num_trades: u32,
    ) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            gross_pnl,
            fees,
            net_pnl: gross_pnl - fees,
            num_trades,
        }
    }
}
