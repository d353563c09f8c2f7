//! DayLab Core: domain types, fee model, risk overlay, day simulator, strategies.
//!
//! This crate does no file I/O. It turns one instrument-day of minute bars
//! plus a strategy into one PnL row:
//! - Domain types (bars, PnL rows)
//! - Price frames as loaded from disk, and OHLC extraction
//! - Fee model (round-trip fee per closing leg)
//! - Risk overlay (ATR estimate, stop/take bracket, adverse-first touch check)
//! - Day simulator with next-open execution
//! - Strategy trait, strategy catalog, and tagged strategy configs

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fees;
pub mod risk;
pub mod strategy;

pub use error::DayError;
