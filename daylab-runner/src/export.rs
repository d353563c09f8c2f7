//! CSV and JSON artifacts written by the selection driver.
//!
//! PnL tables use the columns `Date,Ticker,grossPnL,feesTrade,netPnL,numTrade,Tag`
//! (plus `Strategy` in the cross-strategy file). Metric tables use
//! `Asset,Net Return Ann.,Sharpe,MaxDD,Avg Daily Trades`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use daylab_core::domain::PnlRow;

use crate::metrics::MetricRow;

const PNL_HEADER: [&str; 7] = [
    "Date",
    "Ticker",
    "grossPnL",
    "feesTrade",
    "netPnL",
    "numTrade",
    "Tag",
];

const METRIC_COLUMNS: [&str; 4] = ["Net Return Ann.", "Sharpe", "MaxDD", "Avg Daily Trades"];

/// OOS rows of one strategy, as collected for the cross-strategy file.
#[derive(Debug, Clone, Copy)]
pub struct TaggedRows<'a> {
    pub strategy: &'a str,
    pub tag: &'a str,
    pub rows: &'a [PnlRow],
}

fn pnl_record(row: &PnlRow, tag: &str) -> [String; 7] {
    [
        row.date.to_string(),
        row.ticker.clone(),
        row.gross_pnl.to_string(),
        row.fees.to_string(),
        row.net_pnl.to_string(),
        row.num_trades.to_string(),
        tag.to_string(),
    ]
}

fn metric_values(row: &MetricRow) -> [String; 4] {
    [
        row.net_return_ann.to_string(),
        row.sharpe.to_string(),
        row.max_drawdown.to_string(),
        row.avg_daily_trades.to_string(),
    ]
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))
}

// ─── PnL tables ──────────────────────────────────────────────────────

/// Write a PnL table with every row tagged by the parameter label.
pub fn write_pnl_csv(path: &Path, rows: &[PnlRow], tag: &str) -> Result<()> {
    let mut wtr = create_writer(path)?;
    wtr.write_record(PNL_HEADER)?;
    for row in rows {
        wtr.write_record(pnl_record(row, tag))?;
    }
    wtr.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Write the OOS rows of every strategy into one table with a `Strategy` column.
pub fn write_combined_pnl_csv(path: &Path, parts: &[TaggedRows<'_>]) -> Result<()> {
    let mut wtr = create_writer(path)?;
    let mut header: Vec<&str> = PNL_HEADER.to_vec();
    header.push("Strategy");
    wtr.write_record(&header)?;

    for part in parts {
        for row in part.rows {
            let mut record = pnl_record(row, part.tag).to_vec();
            record.push(part.strategy.to_string());
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Read a PnL table back. Extra columns such as `Tag` are ignored.
pub fn read_pnl_csv(path: &Path) -> Result<Vec<PnlRow>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (i, record) in rdr.deserialize::<PnlRow>().enumerate() {
        let row = record.with_context(|| format!("{}: bad PnL row {}", path.display(), i + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

// ─── Metric tables ───────────────────────────────────────────────────

/// Write a metric matrix (instrument rows then `Portfolio`).
pub fn write_matrix_csv(path: &Path, matrix: &[MetricRow]) -> Result<()> {
    let mut wtr = create_writer(path)?;
    let mut header = vec!["Asset"];
    header.extend(METRIC_COLUMNS);
    wtr.write_record(&header)?;

    for row in matrix {
        let mut record = vec![row.asset.clone()];
        record.extend(metric_values(row));
        wtr.write_record(&record)?;
    }
    wtr.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Write one summary line per strategy from its OOS `Portfolio` row.
pub fn write_summary_csv(path: &Path, summary: &[(String, MetricRow)]) -> Result<()> {
    let mut wtr = create_writer(path)?;
    let mut header = vec!["Strategy"];
    header.extend(METRIC_COLUMNS);
    wtr.write_record(&header)?;

    for (strategy, row) in summary {
        let mut record = vec![strategy.clone()];
        record.extend(metric_values(row));
        wtr.write_record(&record)?;
    }
    wtr.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Render a metric matrix as an aligned text table for the terminal.
pub fn format_matrix(matrix: &[MetricRow]) -> String {
    let width = matrix
        .iter()
        .map(|r| r.asset.len())
        .max()
        .unwrap_or(0)
        .max("Asset".len());

    let mut out = format!(
        "{:<width$}  {:>16}  {:>10}  {:>12}  {:>16}\n",
        "Asset", METRIC_COLUMNS[0], METRIC_COLUMNS[1], METRIC_COLUMNS[2], METRIC_COLUMNS[3]
    );
    for r in matrix {
        out.push_str(&format!(
            "{:<width$}  {:>16.6}  {:>10.4}  {:>12.6}  {:>16.2}\n",
            r.asset, r.net_return_ann, r.sharpe, r.max_drawdown, r.avg_daily_trades
        ));
    }
    out
}

// ─── JSON ────────────────────────────────────────────────────────────

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
