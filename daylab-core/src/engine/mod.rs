//! Day simulator and its state types.

pub mod day;
pub mod state;

pub use day::{run_day, simulate_day, simulate_frame, MIN_BARS};
pub use state::{
    ClosedTrade, DayReport, ExitReason, OpenPosition, RiskConfig, SimConfig, TradeState,
};
