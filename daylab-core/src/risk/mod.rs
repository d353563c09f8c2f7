//! Risk overlay: ATR volatility estimate, stop/take bracket, touch detection.

pub mod bracket;
pub mod volatility;

pub use bracket::{check_touch, derive_bracket, Bracket, Direction, Touch, TouchKind};
pub use volatility::{true_range, volatility_estimate};
