//! MACD histogram zero-cross with a minimum holding period.
//!
//! EMAs are seeded from the first close; the signal line starts at zero.
//! After each flip the position is held for `min_hold` bars regardless of
//! further crosses.

use serde::{Deserialize, Serialize};

use super::window::Ema;
use super::{Strategy, StrategyError};
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdHistParams {
    pub n_short: usize,
    pub n_long: usize,
    pub n_signal: usize,
    pub allow_short: bool,
    pub min_hold: usize,
}

impl Default for MacdHistParams {
    fn default() -> Self {
        Self {
            n_short: 12,
            n_long: 26,
            n_signal: 9,
            allow_short: true,
            min_hold: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MacdHist {
    params: MacdHistParams,
    ema_short: Ema,
    ema_long: Ema,
    signal: Ema,
    prev_hist: f64,
    hold: usize,
    position: f64,
    initialized: bool,
}

impl MacdHist {
    pub fn new(params: MacdHistParams) -> Result<Self, StrategyError> {
        if params.n_short == 0 || params.n_signal == 0 || params.n_short >= params.n_long {
            return Err(StrategyError::invalid(
                "macd_hist",
                format!(
                    "need 0 < n_short < n_long and n_signal > 0, got {}/{}/{}",
                    params.n_short, params.n_long, params.n_signal
                ),
            ));
        }
        let mut signal = Ema::new(params.n_signal);
        signal.seed(0.0);
        Ok(Self {
            ema_short: Ema::new(params.n_short),
            ema_long: Ema::new(params.n_long),
            signal,
            prev_hist: 0.0,
            hold: 0,
            position: 0.0,
            initialized: false,
            params,
        })
    }
}

impl Strategy for MacdHist {
    fn name(&self) -> &str {
        "macd_hist"
    }

    fn on_bar(&mut self, bar: &Bar) -> f64 {
        let x = bar.close;

        if !self.initialized {
            self.ema_short.seed(x);
            self.ema_long.seed(x);
            self.initialized = true;
            return 0.0;
        }

        let macd = self.ema_short.update(x) - self.ema_long.update(x);
        let hist = macd - self.signal.update(macd);

        if self.hold > 0 {
            self.hold -= 1;
            self.prev_hist = hist;
            return self.position;
        }

        if self.prev_hist <= 0.0 && hist > 0.0 {
            self.position = 1.0;
            self.hold = self.params.min_hold;
        } else if self.prev_hist >= 0.0 && hist < 0.0 {
            self.position = if self.params.allow_short { -1.0 } else { 0.0 };
            self.hold = self.params.min_hold;
        }

        self.prev_hist = hist;
        self.position
    }
}
