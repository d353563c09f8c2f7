//! In-memory price data for one instrument-day.

pub mod frame;

pub use frame::{ColumnMap, PriceFrame};
