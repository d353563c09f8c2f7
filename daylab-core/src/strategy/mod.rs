//! Strategies: stateful per-bar target-position generators.
//!
//! A strategy sees one bar at a time, strictly in time order, and returns a
//! finite target position (1.0 long, -1.0 short, 0.0 flat, fractional sizes
//! allowed). It never sees the simulator's position or PnL. A fresh instance
//! is built for every instrument-day, so no state leaks across days.

pub mod bollinger;
pub mod donchian;
pub mod factory;
pub mod flat;
pub mod hma;
pub mod ma_cross;
pub mod macd_hist;
pub mod orb;
pub mod rma_zscore;
pub mod vol_target;
pub mod window;

use thiserror::Error;

use crate::domain::Bar;

pub use bollinger::{BollingerMr, BollingerMrParams};
pub use donchian::{DonchianBreakout, DonchianBreakoutParams};
pub use factory::{default_catalog, StrategyConfig, StrategyFamily};
pub use flat::Flat;
pub use hma::{HmaTrend, HmaTrendParams};
pub use ma_cross::{MaCross, MaCrossParams};
pub use macd_hist::{MacdHist, MacdHistParams};
pub use orb::{Orb, OrbParams};
pub use rma_zscore::{RmaZScore, RmaZScoreParams};
pub use vol_target::{VolTarget, VolTargetParams};

/// Per-bar target-position generator.
///
/// `on_bar` may only use the current bar and bars already seen.
pub trait Strategy: Send {
    /// Family name (e.g., "ma_cross").
    fn name(&self) -> &str;

    /// Consume the next bar and return the target position.
    fn on_bar(&mut self, bar: &Bar) -> f64;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_bar(&mut self, bar: &Bar) -> f64 {
        (**self).on_bar(bar)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("invalid parameter for {strategy}: {reason}")]
    InvalidParameter {
        strategy: &'static str,
        reason: String,
    },
}

impl StrategyError {
    pub(crate) fn invalid(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            strategy,
            reason: reason.into(),
        }
    }
}
