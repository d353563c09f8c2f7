//! Fee model: flat fee proportional to traded notional.
//!
//! One round-trip fee is charged per closing leg:
//! `fee = |position| × rate × (start_price + end_price)`.
//! Opening a position alone never charges anything.

use serde::{Deserialize, Serialize};

/// Basis points per unit fraction (1 bp = 0.0001).
const BPS_PER_UNIT: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeModel {
    /// Fraction of notional charged per side of the round trip.
    pub rate: f64,
}

impl FeeModel {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Build a fee model from a rate expressed in basis points.
    pub fn from_bps(bps: f64) -> Self {
        Self::new(bps / BPS_PER_UNIT)
    }

    /// Fee for closing a leg opened at `start_price` and closed at `end_price`.
    pub fn round_trip_fee(&self, position_abs: f64, start_price: f64, end_price: f64) -> f64 {
        round_trip_fee(position_abs, start_price, end_price, self.rate)
    }
}

impl Default for FeeModel {
    fn default() -> Self {
        Self::from_bps(1.0)
    }
}

/// Pure round-trip fee: `position_abs × fee_rate × (start_price + end_price)`.
pub fn round_trip_fee(position_abs: f64, start_price: f64, end_price: f64, fee_rate: f64) -> f64 {
    position_abs * fee_rate * (start_price + end_price)
}
