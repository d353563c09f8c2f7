//! Simulator configuration, per-day trade state, and the day report.

use serde::{Deserialize, Serialize};

use crate::domain::PnlRow;
use crate::fees::FeeModel;
use crate::risk::{derive_bracket, Bracket, Direction};

// ─── Configuration ───────────────────────────────────────────────────

/// Stop/take overlay settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Lookback of the ATR volatility estimate, in bars.
    pub atr_period: usize,
    /// Stop distance in ATR multiples.
    pub stop_multiplier: f64,
    /// Take-profit distance in ATR multiples.
    pub take_multiplier: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            stop_multiplier: 1.5,
            take_multiplier: 2.0,
        }
    }
}

/// Everything the day simulator needs besides bars and a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub fees: FeeModel,
    /// Units held per 1.0 of position.
    pub unit_size: f64,
    pub risk: RiskConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fees: FeeModel::default(),
            unit_size: 1.0,
            risk: RiskConfig::default(),
        }
    }
}

// ─── Trade state ─────────────────────────────────────────────────────

/// An open position. The bracket exists exactly when the entry volatility does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub position: f64,
    pub entry_bar: usize,
    pub entry_price: f64,
    pub entry_volatility: Option<f64>,
    pub bracket: Option<Bracket>,
}

impl OpenPosition {
    /// Open `position` at `entry_price`, placing a bracket only when the
    /// volatility estimate is defined.
    pub fn open(
        position: f64,
        entry_bar: usize,
        entry_price: f64,
        entry_volatility: Option<f64>,
        risk: &RiskConfig,
    ) -> Self {
        let entry_volatility = entry_volatility.filter(|v| v.is_finite());
        let bracket = match (entry_volatility, Direction::of(position)) {
            (Some(vol), Some(direction)) => Some(derive_bracket(
                entry_price,
                vol,
                risk.stop_multiplier,
                risk.take_multiplier,
                direction,
            )),
            _ => None,
        };
        Self {
            position,
            entry_bar,
            entry_price,
            entry_volatility: bracket.and(entry_volatility),
            bracket,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::of(self.position)
    }
}

/// Per instrument-day trade state, owned by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TradeState {
    #[default]
    Flat,
    Open(OpenPosition),
}

impl TradeState {
    /// Signed position, 0.0 when flat.
    pub fn position(&self) -> f64 {
        match self {
            Self::Flat => 0.0,
            Self::Open(open) => open.position,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }
}

// ─── Output ──────────────────────────────────────────────────────────

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
    EndOfDay,
}

/// One closed round trip. Each carries exactly one fee and one trade count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub position: f64,
    pub entry_bar: usize,
    pub entry_price: f64,
    pub exit_bar: usize,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub fee: f64,
}

/// Result of simulating one instrument-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub row: PnlRow,
    pub trades: Vec<ClosedTrade>,
}
