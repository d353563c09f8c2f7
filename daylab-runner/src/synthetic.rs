//! Synthetic minute data for development and tests.
//!
//! Writes day directories in the same layout the loader reads, filled with
//! random-walk bars. Output is fully determined by the seed and ticker.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default day-directory prefix, matching the loader default.
pub const DEFAULT_DAY_PREFIX: &str = "Yahoo_1m_";

/// First synthetic session date.
const FIRST_DAY: (i32, u32, u32) = (2024, 1, 2);

/// Trading dates starting at the first session, skipping weekends.
fn session_dates(count: usize) -> Vec<NaiveDate> {
    let (y, m, d) = FIRST_DAY;
    let mut date = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(date);
        }
        date = date.succ_opt().unwrap_or(date);
    }
    out
}

/// Deterministic RNG per (seed, ticker).
fn rng_for(seed: u64, ticker: &str) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(ticker.as_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

/// Day directory name for a date: `<prefix>YY_MM_DD`.
pub fn day_dir_name(prefix: &str, date: NaiveDate) -> String {
    format!(
        "{prefix}{:02}_{:02}_{:02}",
        date.year() % 100,
        date.month(),
        date.day()
    )
}

/// Write `days` day directories under `root`, one CSV per ticker per day,
/// each with `bars_per_day` one-minute bars from 09:30.
///
/// Returns the created day directories in chronological order.
pub fn write_synthetic_days(
    root: &Path,
    tickers: &[String],
    days: usize,
    bars_per_day: usize,
    seed: u64,
) -> Result<Vec<PathBuf>> {
    for t in tickers {
        if t.is_empty() || t.contains(['_', '/', '\\']) {
            bail!("ticker '{t}' cannot be used in an instrument file name");
        }
    }

    let dates = session_dates(days);
    let mut dirs = Vec::with_capacity(days);
    for date in &dates {
        let dir = root.join(day_dir_name(DEFAULT_DAY_PREFIX, *date));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        dirs.push(dir);
    }

    for ticker in tickers {
        let mut rng = rng_for(seed, ticker);
        let mut price: f64 = rng.gen_range(20.0..300.0);

        for (date, dir) in dates.iter().zip(&dirs) {
            let path = dir.join(format!("df_{ticker}_1m.csv"));
            let mut wtr = csv::Writer::from_path(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            wtr.write_record(["Datetime", "Open", "High", "Low", "Close", "Volume"])?;

            // Overnight gap.
            price *= 1.0 + rng.gen_range(-0.01..0.01);
            let start = date.and_hms_opt(9, 30, 0).unwrap_or_default();

            for i in 0..bars_per_day {
                let open = price;
                let close = (open * (1.0 + rng.gen_range(-0.0015..0.0015))).max(0.01);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.0008));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.0008));
                let volume: u64 = rng.gen_range(1_000..50_000);
                let ts = start + chrono::Duration::minutes(i as i64);

                wtr.write_record([
                    ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                    format!("{open:.4}"),
                    format!("{high:.4}"),
                    format!("{low:.4}"),
                    format!("{close:.4}"),
                    volume.to_string(),
                ])?;
                price = close;
            }
            wtr.flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_dates_skip_weekends() {
        let dates = session_dates(5);
        // 2024-01-02 is a Tuesday
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(dates[4], NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[test]
    fn day_dir_name_format() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(day_dir_name("Yahoo_1m_", d), "Yahoo_1m_24_03_04");
    }

    #[test]
    fn rng_is_deterministic_per_ticker() {
        let a: f64 = rng_for(42, "AAPL").gen();
        let b: f64 = rng_for(42, "AAPL").gen();
        let c: f64 = rng_for(42, "MSFT").gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
