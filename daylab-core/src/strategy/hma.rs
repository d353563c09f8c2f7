//! Hull moving average trend.
//!
//! HMA(n) = WMA over the last floor(sqrt(n)) values of the raw series
//! `2 * WMA(close, n/2) - WMA(close, n)`. Position follows the slope of the
//! HMA: rising is long, falling is short (or flat when shorting is off).

use serde::{Deserialize, Serialize};

use super::window::{wma, RollingWindow};
use super::{Strategy, StrategyError};
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmaTrendParams {
    pub period: usize,
    pub allow_short: bool,
}

impl Default for HmaTrendParams {
    fn default() -> Self {
        Self {
            period: 55,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HmaTrend {
    params: HmaTrendParams,
    half: usize,
    closes: RollingWindow,
    raw: RollingWindow,
    prev_hma: Option<f64>,
}

impl HmaTrend {
    pub fn new(params: HmaTrendParams) -> Result<Self, StrategyError> {
        if params.period < 4 {
            return Err(StrategyError::invalid(
                "hma_trend",
                format!("period must be >= 4, got {}", params.period),
            ));
        }
        let half = (params.period / 2).max(2);
        let smoothing = ((params.period as f64).sqrt() as usize).max(2);
        Ok(Self {
            half,
            closes: RollingWindow::new(params.period),
            raw: RollingWindow::new(smoothing),
            prev_hma: None,
            params,
        })
    }

    /// Current HMA value, once enough bars have been seen.
    pub fn value(&self) -> Option<f64> {
        self.prev_hma
    }
}

impl Strategy for HmaTrend {
    fn name(&self) -> &str {
        "hma_trend"
    }

    fn on_bar(&mut self, bar: &Bar) -> f64 {
        self.closes.push(bar.close);
        if !self.closes.is_full() {
            return 0.0;
        }

        let closes = self.closes.to_vec();
        let (Some(wma_full), Some(wma_half)) = (wma(&closes), wma(&closes[closes.len() - self.half..]))
        else {
            return 0.0;
        };
        self.raw.push(2.0 * wma_half - wma_full);
        if !self.raw.is_full() {
            return 0.0;
        }

        let Some(hma) = wma(&self.raw.to_vec()) else {
            return 0.0;
        };
        let Some(prev) = self.prev_hma.replace(hma) else {
            return 0.0;
        };

        if hma > prev {
            1.0
        } else if hma < prev && self.params.allow_short {
            -1.0
        } else {
            0.0
        }
    }
}
