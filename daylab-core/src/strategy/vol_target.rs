//! Volatility-targeted momentum.
//!
//! Direction is the sign of (close - window mean). Size is
//! `min(max_leverage, target_vol / vol)` where vol is the sample standard
//! deviation of close-to-close differences over the window.

use serde::{Deserialize, Serialize};

use super::window::RollingWindow;
use super::{Strategy, StrategyError};
use crate::domain::Bar;

const MIN_VOL: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolTargetParams {
    pub window: usize,
    pub target_vol: f64,
    pub max_leverage: f64,
    pub allow_short: bool,
}

impl Default for VolTargetParams {
    fn default() -> Self {
        Self {
            window: 120,
            target_vol: 0.0015,
            max_leverage: 2.0,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VolTarget {
    params: VolTargetParams,
    closes: RollingWindow,
}

impl VolTarget {
    pub fn new(params: VolTargetParams) -> Result<Self, StrategyError> {
        if params.window < 3 {
            return Err(StrategyError::invalid(
                "vol_target",
                format!("window must be >= 3, got {}", params.window),
            ));
        }
        if !(params.target_vol > 0.0 && params.max_leverage > 0.0) {
            return Err(StrategyError::invalid(
                "vol_target",
                "target_vol and max_leverage must be positive",
            ));
        }
        Ok(Self {
            closes: RollingWindow::new(params.window),
            params,
        })
    }
}

fn diff_std(values: &[f64]) -> Option<f64> {
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let n = diffs.len();
    if n < 2 {
        return None;
    }
    let mean = diffs.iter().sum::<f64>() / n as f64;
    let var = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(var.sqrt())
}

impl Strategy for VolTarget {
    fn name(&self) -> &str {
        "vol_target"
    }

    fn on_bar(&mut self, bar: &Bar) -> f64 {
        let c = bar.close;
        self.closes.push(c);
        if !self.closes.is_full() {
            return 0.0;
        }

        let values = self.closes.to_vec();
        let (Some(vol), Some(mean)) = (diff_std(&values), self.closes.mean()) else {
            return 0.0;
        };
        if vol <= MIN_VOL {
            return 0.0;
        }

        let direction = if c > mean {
            1.0
        } else if c < mean && self.params.allow_short {
            -1.0
        } else {
            0.0
        };

        direction * self.params.max_leverage.min(self.params.target_vol / vol)
    }
}
