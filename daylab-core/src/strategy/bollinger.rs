//! Bollinger mean reversion.
//!
//! Buy below the lower band, sell above the upper band, exit when the close
//! crosses back through the mean. Bands use the sample standard deviation.

use serde::{Deserialize, Serialize};

use super::window::RollingWindow;
use super::{Strategy, StrategyError};
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerMrParams {
    pub window: usize,
    pub k: f64,
    pub allow_short: bool,
}

impl Default for BollingerMrParams {
    fn default() -> Self {
        Self {
            window: 20,
            k: 2.0,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BollingerMr {
    params: BollingerMrParams,
    closes: RollingWindow,
    position: f64,
}

impl BollingerMr {
    pub fn new(params: BollingerMrParams) -> Result<Self, StrategyError> {
        if params.window < 2 {
            return Err(StrategyError::invalid(
                "bollinger_mr",
                format!("window must be >= 2, got {}", params.window),
            ));
        }
        if !params.k.is_finite() || params.k <= 0.0 {
            return Err(StrategyError::invalid(
                "bollinger_mr",
                format!("k must be positive, got {}", params.k),
            ));
        }
        Ok(Self {
            closes: RollingWindow::new(params.window),
            position: 0.0,
            params,
        })
    }
}

impl Strategy for BollingerMr {
    fn name(&self) -> &str {
        "bollinger_mr"
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
        if std == 0.0 {
            return 0.0;
        }

        let upper = mean + self.params.k * std;
        let lower = mean - self.params.k * std;

        if self.position == 0.0 {
            if c < lower {
                self.position = 1.0;
            } else if c > upper && self.params.allow_short {
                self.position = -1.0;
            }
        } else if (self.position > 0.0 && c >= mean) || (self.position < 0.0 && c <= mean) {
            self.position = 0.0;
        }

        self.position
    }
}
