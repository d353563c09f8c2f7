//! Day simulator: one instrument-day, one strategy, next-open execution.
//!
//! Per bar `i` in `0..n-1`:
//! 1. Mark to market close-to-close at the current position.
//! 2. If a position is open, test the bracket against bar `i` (stop first).
//!    A touch closes at the touched level and skips step 3 for this bar.
//! 3. Ask the strategy for a target. A change closes the current position
//!    and opens the target, both at `open[i+1]`.
//!
//! Anything still open after the loop is closed at the last close.

use tracing::debug;

use crate::data::{ColumnMap, PriceFrame};
use crate::domain::{Bar, PnlRow};
use crate::error::DayError;
use crate::risk::{check_touch, volatility_estimate, TouchKind};
use crate::strategy::Strategy;

use super::state::{ClosedTrade, DayReport, ExitReason, OpenPosition, SimConfig, TradeState};

/// Fewest bars an instrument-day needs for next-open execution.
pub const MIN_BARS: usize = 3;

/// Running totals for one day. Net is derived at the end, never accumulated.
#[derive(Debug, Default)]
struct Ledger {
    gross: f64,
    fees: f64,
    trades: Vec<ClosedTrade>,
}

impl Ledger {
    fn close(
        &mut self,
        open: &OpenPosition,
        exit_bar: usize,
        exit_price: f64,
        exit_reason: ExitReason,
        config: &SimConfig,
    ) {
        let fee = config
            .fees
            .round_trip_fee(open.position.abs(), open.entry_price, exit_price);
        self.fees += fee;
        self.trades.push(ClosedTrade {
            position: open.position,
            entry_bar: open.entry_bar,
            entry_price: open.entry_price,
            exit_bar,
            exit_price,
            exit_reason,
            fee,
        });
    }
}

/// Simulate one instrument-day and return the PnL row plus the trade tape.
///
/// The strategy must be fresh for this day; it is called once per bar for
/// bars `0..n-1`, in order.
pub fn simulate_day<S: Strategy + ?Sized>(
    bars: &[Bar],
    ticker: &str,
    strategy: &mut S,
    config: &SimConfig,
) -> Result<DayReport, DayError> {
    let n = bars.len();
    if n == 0 {
        return Err(DayError::EmptyFrame);
    }
    if n < MIN_BARS {
        return Err(DayError::InsufficientBars {
            count: n,
            min: MIN_BARS,
        });
    }

    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volatility = volatility_estimate(&highs, &lows, &closes, config.risk.atr_period);

    let unit = config.unit_size;
    let mut ledger = Ledger::default();
    let mut state = TradeState::Flat;
    let mut last_price = bars[0].close;

    for i in 0..n - 1 {
        let bar = &bars[i];

        // 1. Mark to market.
        ledger.gross += state.position() * unit * (bar.close - last_price);
        last_price = bar.close;

        // 2. Bracket check.
        if let TradeState::Open(open) = state {
            let touch = match (open.direction(), open.bracket.as_ref()) {
                (Some(direction), Some(bracket)) => {
                    check_touch(direction, bracket, bar.high, bar.low)
                }
                _ => None,
            };
            if let Some(touch) = touch {
                ledger.gross += open.position * unit * (touch.price - bar.close);
                let reason = match touch.kind {
                    TouchKind::Stop => ExitReason::StopLoss,
                    TouchKind::Take => ExitReason::TakeProfit,
                };
                ledger.close(&open, i, touch.price, reason, config);
                debug!(ticker, bar = i, price = touch.price, ?reason, "bracket exit");
                state = TradeState::Flat;
                continue;
            }
        }

        // 3. Signal, executed at the next open.
        let mut target = strategy.on_bar(bar);
        if !target.is_finite() {
            debug!(ticker, bar = i, target, "non-finite target treated as flat");
            target = 0.0;
        }
        if target == state.position() {
            continue;
        }

        let exec_price = bars[i + 1].open;
        if let TradeState::Open(open) = state {
            ledger.close(&open, i + 1, exec_price, ExitReason::Signal, config);
        }

        state = if target != 0.0 {
            TradeState::Open(OpenPosition::open(
                target,
                i + 1,
                exec_price,
                volatility[i],
                &config.risk,
            ))
        } else {
            TradeState::Flat
        };
    }

    if let TradeState::Open(open) = state {
        let last = n - 1;
        let exit_price = bars[last].close;
        ledger.gross += open.position * unit * (exit_price - last_price);
        ledger.close(&open, last, exit_price, ExitReason::EndOfDay, config);
        debug!(ticker, position = open.position, exit_price, "end-of-day flatten");
    }

    let row = PnlRow::new(
        bars[0].date(),
        ticker,
        ledger.gross,
        ledger.fees,
        ledger.trades.len() as u32,
    );
    Ok(DayReport {
        row,
        trades: ledger.trades,
    })
}

/// Simulate one instrument-day and keep only the PnL row.
pub fn run_day<S: Strategy + ?Sized>(
    bars: &[Bar],
    ticker: &str,
    strategy: &mut S,
    config: &SimConfig,
) -> Result<PnlRow, DayError> {
    simulate_day(bars, ticker, strategy, config).map(|report| report.row)
}

/// Extract bars from a loaded frame and simulate the day.
///
/// Rows with a NaN in any price column are dropped before simulation. A
/// missing price column fails the whole instrument-day.
pub fn simulate_frame<S: Strategy + ?Sized>(
    frame: &PriceFrame,
    columns: &ColumnMap,
    ticker: &str,
    strategy: &mut S,
    config: &SimConfig,
) -> Result<DayReport, DayError> {
    if frame.is_empty() {
        return Err(DayError::EmptyFrame);
    }
    let mut bars = frame.bars(columns)?;
    let before = bars.len();
    bars.retain(|b| !b.is_void());
    if bars.len() < before {
        debug!(ticker, dropped = before - bars.len(), "dropped void bars");
    }
    simulate_day(&bars, ticker, strategy, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::RiskConfig;
    use crate::fees::FeeModel;
    use crate::strategy::Flat;
    use chrono::NaiveDate;

    /// Replays a fixed list of targets, then returns 0.0.
    struct Script {
        targets: Vec<f64>,
        calls: usize,
    }

    impl Script {
        fn new(targets: &[f64]) -> Self {
            Self {
                targets: targets.to_vec(),
                calls: 0,
            }
        }
    }

    impl Strategy for Script {
        fn name(&self) -> &str {
            "script"
        }

        fn on_bar(&mut self, _bar: &Bar) -> f64 {
            let t = self.targets.get(self.calls).copied().unwrap_or(0.0);
            self.calls += 1;
            t
        }
    }

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    fn bars(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        ohlc.iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| Bar::new(start + chrono::Duration::minutes(i as i64), o, h, l, c))
            .collect()
    }

    fn flat_bars(closes: &[f64]) -> Vec<Bar> {
        bars(&closes.iter().map(|&c| (c, c, c, c)).collect::<Vec<_>>())
    }

    fn config(fee_rate: f64, atr_period: usize) -> SimConfig {
        SimConfig {
            fees: FeeModel::new(fee_rate),
            unit_size: 1.0,
            risk: RiskConfig {
                atr_period,
                stop_multiplier: 1.5,
                take_multiplier: 2.0,
            },
        }
    }

    #[test]
    fn too_few_bars_is_rejected() {
        let err = run_day(&flat_bars(&[1.0, 2.0]), "X", &mut Flat, &SimConfig::default());
        assert_eq!(err, Err(DayError::InsufficientBars { count: 2, min: 3 }));
    }

    #[test]
    fn empty_day_is_rejected() {
        let err = run_day(&[], "X", &mut Flat, &SimConfig::default());
        assert_eq!(err, Err(DayError::EmptyFrame));
    }

    #[test]
    fn flat_strategy_is_all_zero() {
        let row = run_day(
            &flat_bars(&[100.0, 101.0, 99.0, 102.0]),
            "X",
            &mut Flat,
            &SimConfig::default(),
        )
        .unwrap();
        assert_eq!(row.gross_pnl, 0.0);
        assert_eq!(row.fees, 0.0);
        assert_eq!(row.net_pnl, 0.0);
        assert_eq!(row.num_trades, 0);
    }

    #[test]
    fn one_bar_long_on_five_bar_ramp() {
        let cfg = config(0.0001, 14);
        let report = simulate_day(
            &flat_bars(&[100.0, 101.0, 102.0, 103.0, 104.0]),
            "X",
            &mut Script::new(&[1.0, 0.0]),
            &cfg,
        )
        .unwrap();

        // Long filled at open[1] = 101, closed at open[2] = 102.
        // Holding PnL: 1 × (close[1] − close[0]) = 1.
        let fee = 0.0001 * (101.0 + 102.0);
        assert_approx(report.row.gross_pnl, 1.0);
        assert_approx(report.row.fees, fee);
        assert_approx(report.row.net_pnl, 1.0 - fee);
        assert_eq!(report.row.num_trades, 1);

        let trade = report.trades[0];
        assert_eq!(trade.entry_bar, 1);
        assert_eq!(trade.entry_price, 101.0);
        assert_eq!(trade.exit_bar, 2);
        assert_eq!(trade.exit_price, 102.0);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
    }

    #[test]
    fn fills_at_next_open_not_current_close() {
        let day = bars(&[
            (10.0, 10.0, 10.0, 10.0),
            (12.0, 12.0, 12.0, 12.5),
            (13.0, 13.0, 13.0, 13.0),
            (14.0, 14.0, 14.0, 14.0),
        ]);
        let report = simulate_day(&day, "X", &mut Script::new(&[0.0, 1.0, 1.0]), &config(0.0, 14))
            .unwrap();
        let trade = report.trades[0];
        assert_eq!(trade.entry_bar, 2);
        assert_eq!(trade.entry_price, 13.0);
        assert_eq!(trade.exit_reason, ExitReason::EndOfDay);
    }

    #[test]
    fn end_of_day_flattens_at_last_close() {
        let cfg = config(0.0001, 14);
        let report = simulate_day(
            &flat_bars(&[100.0, 101.0, 102.0, 103.0]),
            "X",
            &mut Script::new(&[1.0, 1.0, 1.0]),
            &cfg,
        )
        .unwrap();
        // Marked close[0] -> close[2] in the loop, then close[2] -> close[3].
        assert_approx(report.row.gross_pnl, 3.0);
        assert_eq!(report.row.num_trades, 1);
        let trade = report.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::EndOfDay);
        assert_eq!(trade.exit_bar, 3);
        assert_eq!(trade.exit_price, 103.0);
        assert_approx(trade.fee, 0.0001 * (101.0 + 103.0));
    }

    #[test]
    fn flip_charges_one_fee_and_reopens() {
        let cfg = config(0.001, 14);
        let report = simulate_day(
            &flat_bars(&[100.0, 101.0, 102.0, 103.0]),
            "X",
            &mut Script::new(&[1.0, -1.0, -1.0]),
            &cfg,
        )
        .unwrap();
        assert_eq!(report.row.num_trades, 2);
        assert_eq!(report.trades[0].exit_reason, ExitReason::Signal);
        assert_eq!(report.trades[1].position, -1.0);
        assert_eq!(report.trades[1].entry_price, 102.0);
        assert_approx(report.row.net_pnl, report.row.gross_pnl - report.row.fees);
    }

    #[test]
    fn stop_exit_blocks_same_bar_entry() {
        // ATR period 1: TR of bar 0 = 2, so the long entered at open[1] = 100
        // gets stop 97 and take 104. Bar 1 trades down to 96.
        let day = bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 100.5, 96.0, 98.0),
            (98.0, 99.0, 97.5, 98.5),
            (98.5, 99.0, 98.0, 98.5),
        ]);
        let mut script = Script::new(&[1.0, 1.0, 1.0]);
        let report = simulate_day(&day, "X", &mut script, &config(0.0, 1)).unwrap();

        let stop = report.trades[0];
        assert_eq!(stop.exit_reason, ExitReason::StopLoss);
        assert_eq!(stop.exit_bar, 1);
        assert_eq!(stop.exit_price, 97.0);
        // Strategy not consulted on bar 1, re-entry only from bar 2's signal.
        assert_eq!(script.calls, 2);
        assert_eq!(report.trades[1].entry_bar, 3);
        // close[0]=100 -> close[1]=98 is -2, then +(97 - 98) = -1.
        assert_eq!(report.trades.len(), 2);
        assert_approx(report.row.gross_pnl, -3.0);
    }

    #[test]
    fn both_levels_in_range_exits_at_stop() {
        let day = bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 110.0, 90.0, 100.0),
            (100.0, 100.0, 100.0, 100.0),
        ]);
        let report =
            simulate_day(&day, "X", &mut Script::new(&[1.0]), &config(0.0, 1)).unwrap();
        assert_eq!(report.trades[0].exit_reason, ExitReason::StopLoss);
    }

    #[test]
    fn undefined_volatility_opens_without_bracket() {
        // Deep drawdown but ATR period longer than the day: no stop.
        let day = bars(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 100.0, 50.0, 60.0),
            (60.0, 60.0, 60.0, 60.0),
        ]);
        let report =
            simulate_day(&day, "X", &mut Script::new(&[1.0, 1.0]), &config(0.0, 14)).unwrap();
        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].exit_reason, ExitReason::EndOfDay);
    }

    #[test]
    fn non_finite_target_is_flat() {
        let row = run_day(
            &flat_bars(&[1.0, 2.0, 3.0]),
            "X",
            &mut Script::new(&[f64::NAN, f64::INFINITY]),
            &SimConfig::default(),
        )
        .unwrap();
        assert_eq!(row.num_trades, 0);
    }

    #[test]
    fn missing_column_fails_frame() {
        let ts = flat_bars(&[1.0, 2.0, 3.0])
            .iter()
            .map(|b| b.timestamp)
            .collect();
        let frame = PriceFrame::new(ts)
            .with_column("Open", vec![1.0, 2.0, 3.0])
            .and_then(|f| f.with_column("High", vec![1.0, 2.0, 3.0]))
            .and_then(|f| f.with_column("Low", vec![1.0, 2.0, 3.0]))
            .unwrap();
        let err = simulate_frame(&frame, &ColumnMap::default(), "X", &mut Flat, &SimConfig::default());
        assert_eq!(
            err.map(|r| r.row),
            Err(DayError::MissingColumn {
                column: "Close".into()
            })
        );
    }

    #[test]
    fn row_date_is_first_bar_date() {
        let row = run_day(
            &flat_bars(&[1.0, 2.0, 3.0]),
            "AAPL",
            &mut Flat,
            &SimConfig::default(),
        )
        .unwrap();
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(row.ticker, "AAPL");
    }
}
