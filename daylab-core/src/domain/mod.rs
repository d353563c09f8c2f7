//! Domain types for the minute-bar day simulator.

pub mod bar;
pub mod pnl;

pub use bar::Bar;
pub use pnl::PnlRow;
