//! Donchian channel breakout.
//!
//! The channel covers the last `window` closes including the current bar, so a
//! breakout means the close is at a fresh extreme of that window.

use serde::{Deserialize, Serialize};

use super::window::RollingWindow;
use super::{Strategy, StrategyError};
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonchianBreakoutParams {
    pub window: usize,
    pub allow_short: bool,
}

impl Default for DonchianBreakoutParams {
    fn default() -> Self {
        Self {
            window: 20,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DonchianBreakout {
    params: DonchianBreakoutParams,
    closes: RollingWindow,
    position: f64,
}

impl DonchianBreakout {
    pub fn new(params: DonchianBreakoutParams) -> Result<Self, StrategyError> {
        if params.window < 2 {
            return Err(StrategyError::invalid(
                "donchian_breakout",
                format!("window must be >= 2, got {}", params.window),
            ));
        }
        Ok(Self {
            closes: RollingWindow::new(params.window),
            position: 0.0,
            params,
        })
    }
}

impl Strategy for DonchianBreakout {
    fn name(&self) -> &str {
        "donchian_breakout"
    }

    fn on_bar(&mut self, bar: &Bar) -> f64 {
        let c = bar.close;
        self.closes.push(c);
        if !self.closes.is_full() {
            return 0.0;
        }

        let (Some(hi), Some(lo)) = (self.closes.max(), self.closes.min()) else {
            return 0.0;
        };

        if c >= hi {
            self.position = 1.0;
        } else if c <= lo && self.params.allow_short {
            self.position = -1.0;
        }
        self.position
    }
}
