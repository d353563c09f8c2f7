//! Moving-average cross: SMA(fast) of closes against SMA(slow).

use serde::{Deserialize, Serialize};

use super::window::RollingWindow;
use super::{Strategy, StrategyError};
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossParams {
    pub fast: usize,
    pub slow: usize,
    pub allow_short: bool,
}

impl Default for MaCrossParams {
    fn default() -> Self {
        Self {
            fast: 20,
            slow: 60,
            allow_short: true,
        }
    }
}

/// Long while the fast average is above the slow one, short (or flat) below.
#[derive(Debug, Clone)]
pub struct MaCross {
    params: MaCrossParams,
    closes: RollingWindow,
}

impl MaCross {
    pub fn new(params: MaCrossParams) -> Result<Self, StrategyError> {
        if params.fast == 0 || params.fast >= params.slow {
            return Err(StrategyError::invalid(
                "ma_cross",
                format!("need 0 < fast < slow, got fast={} slow={}", params.fast, params.slow),
            ));
        }
        Ok(Self {
            closes: RollingWindow::new(params.slow),
            params,
        })
    }
}

impl Strategy for MaCross {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn on_bar(&mut self, bar: &Bar) -> f64 {
        self.closes.push(bar.close);
        if !self.closes.is_full() {
            return 0.0;
        }

        let (Some(fast), Some(slow)) = (self.closes.mean_last(self.params.fast), self.closes.mean())
        else {
            return 0.0;
        };

        if fast > slow {
            1.0
        } else if fast < slow && self.params.allow_short {
            -1.0
        } else {
            0.0
        }
    }
}
