//! Session runner: replays one strategy config over many instrument-days.
//!
//! Instrument-days are independent, so they run in parallel; results come
//! back in day-then-file order regardless of scheduling. A failing
//! instrument-day is logged and omitted, never fatal.

use rayon::prelude::*;
use tracing::{debug, warn};

use daylab_core::data::ColumnMap;
use daylab_core::domain::PnlRow;
use daylab_core::engine::{simulate_frame, SimConfig};
use daylab_core::strategy::{StrategyConfig, StrategyError};
use daylab_core::DayError;

use crate::data_loader::{Instrument, LoadedDay};

/// Split days chronologically at floor(n × is_ratio) into (in-sample, out-of-sample).
pub fn split_days<T>(days: &[T], is_ratio: f64) -> (&[T], &[T]) {
    let split = (days.len() as f64 * is_ratio).floor().max(0.0) as usize;
    days.split_at(split.min(days.len()))
}

/// Run one instrument-day with a fresh strategy instance.
///
/// `Ok(None)` means the instrument-day was skipped.
pub fn run_instrument_day(
    day: &LoadedDay,
    instrument: &Instrument,
    strategy: &StrategyConfig,
    sim: &SimConfig,
    columns: &ColumnMap,
) -> Result<Option<PnlRow>, StrategyError> {
    let mut s = strategy.build()?;
    match simulate_frame(&instrument.frame, columns, &instrument.ticker, &mut s, sim) {
        Ok(report) => Ok(Some(report.row)),
        Err(e @ (DayError::InsufficientBars { .. } | DayError::EmptyFrame)) => {
            debug!(day = %day.name, ticker = %instrument.ticker, reason = %e, "skipped instrument-day");
            Ok(None)
        }
        Err(e) => {
            warn!(day = %day.name, ticker = %instrument.ticker, reason = %e, "skipped instrument-day");
            Ok(None)
        }
    }
}

/// Run `strategy` over every instrument of every day.
///
/// Fails only when the strategy parameters are invalid. No days gives no rows.
pub fn run_session(
    days: &[LoadedDay],
    strategy: &StrategyConfig,
    sim: &SimConfig,
    columns: &ColumnMap,
) -> Result<Vec<PnlRow>, StrategyError> {
    strategy.validate()?;

    let units: Vec<(&LoadedDay, &Instrument)> = days
        .iter()
        .flat_map(|day| day.instruments.iter().map(move |inst| (day, inst)))
        .collect();

    let rows: Vec<Option<PnlRow>> = units
        .par_iter()
        .map(|&(day, inst)| run_instrument_day(day, inst, strategy, sim, columns))
        .collect::<Result<_, _>>()?;

    let rows: Vec<PnlRow> = rows.into_iter().flatten().collect();
    debug!(
        strategy = %strategy.label(),
        units = units.len(),
        rows = rows.len(),
        "session complete"
    );
    Ok(rows)
}
