//! Entry-time volatility estimate (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first bar has no previous close and uses its own close instead.
//! ATR here is a plain `period`-bar simple moving average of TR, so the first
//! defined value sits at index `period - 1`.

/// Compute the True Range series.
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    let mut tr = Vec::with_capacity(n);

    for i in 0..n {
        let h = highs[i];
        let l = lows[i];
        let pc = if i == 0 { closes[0] } else { closes[i - 1] };
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            tr.push(f64::NAN);
        } else {
            tr.push((h - l).max((h - pc).abs()).max((l - pc).abs()));
        }
    }

    tr
}

/// Rolling `period`-bar SMA of True Range.
///
/// Returns `None` for indices before `period` bars have accumulated and for any
/// window that contains a non-finite TR value.
pub fn volatility_estimate(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Vec<Option<f64>> {
    let tr = true_range(highs, lows, closes);
    let n = tr.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut bad_in_window = 0usize;
    for (i, &value) in tr.iter().enumerate() {
        if value.is_finite() {
            sum += value;
        } else {
            bad_in_window += 1;
        }

        if i >= period {
            let leaving = tr[i - period];
            if leaving.is_finite() {
                sum -= leaving;
            } else {
                bad_in_window -= 1;
            }
        }

        if i + 1 >= period && bad_in_window == 0 {
            result[i] = Some(sum / period as f64);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn true_range_first_bar_uses_own_close() {
        let tr = true_range(&[105.0], &[95.0], &[102.0]);
        assert_approx(tr[0], 10.0);
    }

    #[test]
    fn true_range_basic() {
        let highs = [105.0, 108.0, 107.0];
        let lows = [95.0, 100.0, 98.0];
        let closes = [102.0, 106.0, 99.0];
        let tr = true_range(&highs, &lows, &closes);
        assert_approx(tr[0], 10.0);
        assert_approx(tr[1], 8.0); // max(8, |108-102|, |100-102|)
        assert_approx(tr[2], 9.0); // max(9, |107-106|, |98-106|)
    }

    #[test]
    fn true_range_gap_up() {
        let tr = true_range(&[102.0, 115.0], &[97.0, 108.0], &[100.0, 112.0]);
        assert_approx(tr[1], 15.0);
    }

    #[test]
    fn volatility_undefined_before_period() {
        let highs = [105.0, 108.0, 107.0, 103.0, 106.0];
        let lows = [95.0, 100.0, 98.0, 97.0, 100.0];
        let closes = [102.0, 106.0, 99.0, 101.0, 105.0];
        let atr = volatility_estimate(&highs, &lows, &closes, 3);

        assert_eq!(atr[0], None);
        assert_eq!(atr[1], None);
        // TR = [10, 8, 9, 6, 6]
        assert_approx(atr[2].unwrap(), 9.0);
        assert_approx(atr[3].unwrap(), 23.0 / 3.0);
        assert_approx(atr[4].unwrap(), 7.0);
    }

    #[test]
    fn volatility_short_series_is_all_undefined() {
        let atr = volatility_estimate(&[1.0, 2.0], &[0.5, 1.5], &[1.0, 2.0], 14);
        assert!(atr.iter().all(Option::is_none));
    }

    #[test]
    fn volatility_nan_blocks_window_then_recovers() {
        let highs = [2.0, f64::NAN, 2.0, 2.0, 2.0];
        let lows = [1.0, 1.0, 1.0, 1.0, 1.0];
        let closes = [1.5, 1.5, 1.5, 1.5, 1.5];
        let atr = volatility_estimate(&highs, &lows, &closes, 2);
        assert_eq!(atr[1], None);
        assert_eq!(atr[2], None);
        assert_approx(atr[3].unwrap(), 1.0);
        assert_approx(atr[4].unwrap(), 1.0);
    }

    #[test]
    fn zero_period_is_undefined() {
        let atr = volatility_estimate(&[2.0], &[1.0], &[1.5], 0);
        assert_eq!(atr, vec![None]);
    }
}
