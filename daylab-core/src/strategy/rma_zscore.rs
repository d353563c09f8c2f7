//! Rolling z-score mean reversion.
//!
//! z = (close - mean) / std over the last `window` closes. Enter long at
//! z <= -z_entry, short at z >= z_entry, go flat once |z| <= z_exit.

use serde::{Deserialize, Serialize};

use super::window::RollingWindow;
use super::{Strategy, StrategyError};
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmaZScoreParams {
    pub window: usize,
    pub z_entry: f64,
    pub z_exit: f64,
    pub allow_short: bool,
}

impl Default for RmaZScoreParams {
    fn default() -> Self {
        Self {
            window: 120,
            z_entry: 1.2,
            z_exit: 0.3,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RmaZScore {
    params: RmaZScoreParams,
    closes: RollingWindow,
    position: f64,
}

impl RmaZScore {
    pub fn new(params: RmaZScoreParams) -> Result<Self, StrategyError> {
        if params.window < 2 {
            return Err(StrategyError::invalid(
                "rma_zscore",
                format!("window must be >= 2, got {}", params.window),
            ));
        }
        if !(params.z_exit >= 0.0 && params.z_exit < params.z_entry) {
            return Err(StrategyError::invalid(
                "rma_zscore",
                format!(
                    "need 0 <= z_exit < z_entry, got z_exit={} z_entry={}",
                    params.z_exit, params.z_entry
                ),
            ));
        }
        Ok(Self {
            closes: RollingWindow::new(params.window),
            position: 0.0,
            params,
        })
    }
}

impl Strategy for RmaZScore {
    fn name(&self) -> &str {
        "rma_zscore"
    }

    fn on_bar(&mut self, bar: &Bar) -> f64 {
        let c = bar.close;
        self.closes.push(c);
        if !self.closes.is_full() {
            return 0.0;
        }

        let (Some(mean), Some(std)) = (self.closes.mean(), self.closes.std_dev()) else {
            return 0.0;
        };
        // Degenerate window reports flat but keeps the held position for later bars.
        if std == 0.0 {
            return 0.0;
        }

        let z = (c - mean) / std;
        if z <= -self.params.z_entry {
            self.position = 1.0;
        } else if z >= self.params.z_entry && self.params.allow_short {
            self.position = -1.0;
        } else if z.abs() <= self.params.z_exit {
            self.position = 0.0;
        }
        self.position
    }
}
