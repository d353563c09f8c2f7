//! Opening range breakout.
//!
//! The first `orb_minutes` bars of each trading date build the range (flat
//! while building). Afterwards a close above `high * (1 + k)` goes long, a
//! close below `low * (1 - k)` goes short, and anything else holds.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Strategy, StrategyError};
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbParams {
    pub orb_minutes: usize,
    pub breakout_k: f64,
    pub allow_short: bool,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            orb_minutes: 30,
            breakout_k: 0.0,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Orb {
    params: OrbParams,
    date: Option<NaiveDate>,
    range: Option<(f64, f64)>,
    bars_seen: usize,
    ready: bool,
    position: f64,
}

impl Orb {
    pub fn new(params: OrbParams) -> Result<Self, StrategyError> {
        if params.orb_minutes == 0 {
            return Err(StrategyError::invalid("orb", "orb_minutes must be >= 1"));
        }
        if !(params.breakout_k >= 0.0 && params.breakout_k.is_finite()) {
            return Err(StrategyError::invalid(
                "orb",
                format!("breakout_k must be >= 0, got {}", params.breakout_k),
            ));
        }
        Ok(Self {
            params,
            date: None,
            range: None,
            bars_seen: 0,
            ready: false,
            position: 0.0,
        })
    }

    fn reset(&mut self, date: NaiveDate) {
        self.date = Some(date);
        self.range = None;
        self.bars_seen = 0;
        self.ready = false;
        self.position = 0.0;
    }
}

impl Strategy for Orb {
    fn name(&self) -> &str {
        "orb"
    }

    fn on_bar(&mut self, bar: &Bar) -> f64 {
        let date = bar.date();
        if self.date != Some(date) {
            self.reset(date);
        }
        self.bars_seen += 1;

        if !self.ready {
            self.range = Some(match self.range {
                Some((hi, lo)) => (hi.max(bar.high), lo.min(bar.low)),
                None => (bar.high, bar.low),
            });
            if self.bars_seen >= self.params.orb_minutes {
                self.ready = true;
            }
            self.position = 0.0;
            return 0.0;
        }

        let Some((hi, lo)) = self.range else {
            return 0.0;
        };
        let up = hi * (1.0 + self.params.breakout_k);
        let down = lo * (1.0 - self.params.breakout_k);

        if bar.close > up {
            self.position = 1.0;
        } else if self.params.allow_short && bar.close < down {
            self.position = -1.0;
        }
        self.position
    }
}
