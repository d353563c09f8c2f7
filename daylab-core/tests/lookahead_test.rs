//! Causality checks for the strategy catalog and the simulator.
//!
//! Strategy outputs on bars 0..k must not change when later bars exist.
//! The simulator's tape for the first part of a day must not depend on
//! prices that arrive after the fill.

use chrono::NaiveDate;
use daylab_core::domain::Bar;
use daylab_core::engine::{simulate_day, SimConfig};
use daylab_core::strategy::{default_catalog, Strategy};

fn make_test_bars(n: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            // Deterministic pseudo-random walk using a simple LCG
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.01;
            let open = price;
            price = (price + change).max(10.0);
            let close = price;
            Bar::new(
                start + chrono::Duration::minutes(i as i64),
                open,
                open.max(close) + 0.2,
                open.min(close) - 0.2,
                close,
            )
        })
        .collect()
}

#[test]
fn strategy_outputs_ignore_future_bars() {
    let bars = make_test_bars(390);
    let truncated_len = 200;

    for family in default_catalog() {
        for cfg in &family.grid {
            let mut full = cfg.build().unwrap();
            let mut truncated = cfg.build().unwrap();
            let full_out: Vec<f64> = bars.iter().map(|b| full.on_bar(b)).collect();
            let trunc_out: Vec<f64> = bars[..truncated_len]
                .iter()
                .map(|b| truncated.on_bar(b))
                .collect();
            assert_eq!(
                &full_out[..truncated_len],
                &trunc_out[..],
                "{} leaks future data",
                cfg.label()
            );
        }
    }
}

#[test]
fn strategy_outputs_are_deterministic() {
    let bars = make_test_bars(300);
    for family in default_catalog() {
        for cfg in &family.grid {
            let a: Vec<f64> = {
                let mut s = cfg.build().unwrap();
                bars.iter().map(|b| s.on_bar(b)).collect()
            };
            let b: Vec<f64> = {
                let mut s = cfg.build().unwrap();
                bars.iter().map(|b| s.on_bar(b)).collect()
            };
            assert_eq!(a, b, "{} is not deterministic", family.name);
            assert!(a.iter().all(|p| p.is_finite()));
        }
    }
}

#[test]
fn trades_closed_before_a_price_shock_are_unchanged() {
    let bars = make_test_bars(390);
    let mut shocked = bars.clone();
    for b in shocked.iter_mut().skip(300) {
        b.open *= 1.5;
        b.high *= 1.5;
        b.low *= 1.5;
        b.close *= 1.5;
    }

    let cfg = SimConfig::default();
    for family in default_catalog() {
        let strategy_cfg = &family.grid[0];
        let base = simulate_day(&bars, "T", &mut strategy_cfg.build().unwrap(), &cfg).unwrap();
        let alt = simulate_day(&shocked, "T", &mut strategy_cfg.build().unwrap(), &cfg).unwrap();

        let early = |trades: &[daylab_core::engine::ClosedTrade]| -> Vec<_> {
            trades.iter().filter(|t| t.exit_bar < 300).copied().collect()
        };
        assert_eq!(early(&base.trades), early(&alt.trades), "{}", family.name);
    }
}
