//! Strategy factory: converts a tagged `StrategyConfig` into a runtime
//! strategy, and carries the default research grid.
//!
//! Configs deserialize from tables like `{ type = "ma_cross", fast = 10, slow = 30 }`;
//! missing fields fall back to each strategy's defaults.

use serde::{Deserialize, Serialize};

use super::bollinger::{BollingerMr, BollingerMrParams};
use super::donchian::{DonchianBreakout, DonchianBreakoutParams};
use super::flat::Flat;
use super::hma::{HmaTrend, HmaTrendParams};
use super::ma_cross::{MaCross, MaCrossParams};
use super::macd_hist::{MacdHist, MacdHistParams};
use super::orb::{Orb, OrbParams};
use super::rma_zscore::{RmaZScore, RmaZScoreParams};
use super::vol_target::{VolTarget, VolTargetParams};
use super::{Strategy, StrategyError};

// ─── Config ──────────────────────────────────────────────────────────

/// One parameterised strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    MaCross(MaCrossParams),
    MacdHist(MacdHistParams),
    BollingerMr(BollingerMrParams),
    HmaTrend(HmaTrendParams),
    DonchianBreakout(DonchianBreakoutParams),
    #[serde(rename = "rma_zscore")]
    RmaZScore(RmaZScoreParams),
    VolTarget(VolTargetParams),
    Orb(OrbParams),
    Flat,
}

impl StrategyConfig {
    /// Build a fresh strategy instance, validating parameters.
    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        Ok(match self {
            Self::MaCross(p) => Box::new(MaCross::new(p.clone())?),
            Self::MacdHist(p) => Box::new(MacdHist::new(p.clone())?),
            Self::BollingerMr(p) => Box::new(BollingerMr::new(p.clone())?),
            Self::HmaTrend(p) => Box::new(HmaTrend::new(p.clone())?),
            Self::DonchianBreakout(p) => Box::new(DonchianBreakout::new(p.clone())?),
            Self::RmaZScore(p) => Box::new(RmaZScore::new(p.clone())?),
            Self::VolTarget(p) => Box::new(VolTarget::new(p.clone())?),
            Self::Orb(p) => Box::new(Orb::new(p.clone())?),
            Self::Flat => Box::new(Flat),
        })
    }

    /// Check parameters without keeping the instance.
    pub fn validate(&self) -> Result<(), StrategyError> {
        self.build().map(|_| ())
    }

    /// The `type` tag (e.g., "ma_cross").
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MaCross(_) => "ma_cross",
            Self::MacdHist(_) => "macd_hist",
            Self::BollingerMr(_) => "bollinger_mr",
            Self::HmaTrend(_) => "hma_trend",
            Self::DonchianBreakout(_) => "donchian_breakout",
            Self::RmaZScore(_) => "rma_zscore",
            Self::VolTarget(_) => "vol_target",
            Self::Orb(_) => "orb",
            Self::Flat => "flat",
        }
    }

    /// Stable `k=v_k=v` tag of the parameters, keys in alphabetical order.
    ///
    /// Used in output file names and the `Tag` column.
    pub fn label(&self) -> String {
        let value = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return self.kind().to_string(),
        };
        let parts: Vec<String> = value
            .iter()
            .filter(|(k, _)| k.as_str() != "type")
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect();
        if parts.is_empty() {
            self.kind().to_string()
        } else {
            parts.join("_")
        }
    }
}

// ─── Families and default grid ──────────────────────────────────────

/// A named strategy with its parameter grid (one `[[strategies]]` entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFamily {
    pub name: String,
    pub grid: Vec<StrategyConfig>,
}

impl StrategyFamily {
    pub fn new(name: impl Into<String>, grid: Vec<StrategyConfig>) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }
}

/// The built-in research sweep: eight families, shorting allowed everywhere.
pub fn default_catalog() -> Vec<StrategyFamily> {
    let ma = |fast, slow| {
        StrategyConfig::MaCross(MaCrossParams {
            fast,
            slow,
            allow_short: true,
        })
    };
    let macd = |n_short, n_long, n_signal| {
        StrategyConfig::MacdHist(MacdHistParams {
            n_short,
            n_long,
            n_signal,
            allow_short: true,
            min_hold: 5,
        })
    };
    let boll = |window| {
        StrategyConfig::BollingerMr(BollingerMrParams {
            window,
            k: 2.0,
            allow_short: true,
        })
    };
    let hma = |period| {
        StrategyConfig::HmaTrend(HmaTrendParams {
            period,
            allow_short: true,
        })
    };
    let donchian = |window| {
        StrategyConfig::DonchianBreakout(DonchianBreakoutParams {
            window,
            allow_short: true,
        })
    };
    let zscore = |window, z_entry, z_exit| {
        StrategyConfig::RmaZScore(RmaZScoreParams {
            window,
            z_entry,
            z_exit,
            allow_short: true,
        })
    };
    let vol = |window, target_vol| {
        StrategyConfig::VolTarget(VolTargetParams {
            window,
            target_vol,
            max_leverage: 2.0,
            allow_short: true,
        })
    };
    let orb = |orb_minutes| {
        StrategyConfig::Orb(OrbParams {
            orb_minutes,
            breakout_k: 0.0,
            allow_short: true,
        })
    };

    vec![
        StrategyFamily::new("MA_Cross", vec![ma(10, 30), ma(20, 60), ma(30, 90)]),
        StrategyFamily::new("MACD_Hist", vec![macd(12, 26, 9), macd(8, 21, 5)]),
        StrategyFamily::new("Bollinger_MR", vec![boll(20), boll(30)]),
        StrategyFamily::new("HMA_Trend", vec![hma(55), hma(34)]),
        StrategyFamily::new("Donchian_BO", vec![donchian(20), donchian(55)]),
        StrategyFamily::new(
            "RMA_ZScore",
            vec![zscore(60, 1.0, 0.2), zscore(120, 1.2, 0.3)],
        ),
        StrategyFamily::new("Vol_Target", vec![vol(60, 0.002), vol(120, 0.0015)]),
        StrategyFamily::new("ORB", vec![orb(15), orb(30)]),
    ]
}
