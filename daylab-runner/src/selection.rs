//! Selection driver: in-sample grid search, out-of-sample validation, outputs.
//!
//! For each strategy family every grid point runs on the in-sample days and
//! is scored on the portfolio daily series. The best point (first wins ties)
//! is re-run on the out-of-sample days and summarised in a metric matrix.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use daylab_core::domain::PnlRow;
use daylab_core::strategy::{StrategyConfig, StrategyError, StrategyFamily};

use crate::config::{BacktestConfig, ConfigError, ConfigHash};
use crate::data_loader::{DataSet, LoadedDay};
use crate::export::{
    write_combined_pnl_csv, write_json, write_matrix_csv, write_pnl_csv, write_summary_csv,
    TaggedRows,
};
use crate::fitness::ScoreMetric;
use crate::metrics::{build_metric_matrix, MetricRow, PORTFOLIO};
use crate::session::{run_session, split_days};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("strategy family '{family}': {source}")]
    Strategy {
        family: String,
        #[source]
        source: StrategyError,
    },

    #[error(transparent)]
    Export(#[from] anyhow::Error),
}

// ─── Results ─────────────────────────────────────────────────────────

/// One grid point evaluated in-sample.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub config: StrategyConfig,
    pub label: String,
    pub score: f64,
    pub rows: Vec<PnlRow>,
}

/// Outcome of one strategy family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyOutcome {
    pub name: String,
    /// Every grid point in grid order.
    pub grid: Vec<GridPoint>,
    /// Index of the selected grid point.
    pub best: usize,
    pub oos_rows: Vec<PnlRow>,
    pub oos_matrix: Vec<MetricRow>,
}

impl FamilyOutcome {
    pub fn best_point(&self) -> &GridPoint {
        &self.grid[self.best]
    }

    /// The `Portfolio` row of the OOS matrix, if there were OOS rows.
    pub fn oos_portfolio(&self) -> Option<&MetricRow> {
        self.oos_matrix.iter().find(|r| r.asset == PORTFOLIO)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionReport {
    pub is_days: usize,
    pub oos_days: usize,
    pub families: Vec<FamilyOutcome>,
    /// Families with no usable in-sample result.
    pub skipped: Vec<String>,
    pub fingerprint: ConfigHash,
}

#[derive(Serialize)]
struct BestParams<'a> {
    strategy: &'a str,
    label: &'a str,
    score_metric: ScoreMetric,
    is_score: f64,
    params: &'a StrategyConfig,
}

#[derive(Serialize)]
struct ConfigSnapshot<'a> {
    fingerprint: &'a str,
    config: &'a BacktestConfig,
}

// ─── Selection ───────────────────────────────────────────────────────

/// Index of the highest-scoring grid point; the earliest wins ties.
///
/// `None` when no score beats negative infinity.
pub fn pick_best(scores: &[f64], metric: ScoreMetric) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        let current = best.map_or(f64::NEG_INFINITY, |(_, s)| s);
        if metric.is_better(score, current) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Run and score every grid point of `family` on `days`, in parallel.
pub fn evaluate_grid(
    days: &[LoadedDay],
    family: &StrategyFamily,
    cfg: &BacktestConfig,
) -> Result<Vec<GridPoint>, SelectionError> {
    let sim = cfg.sim_config();
    family
        .grid
        .par_iter()
        .map(|config| -> Result<GridPoint, SelectionError> {
            let rows = run_session(days, config, &sim, &cfg.columns).map_err(|source| {
                SelectionError::Strategy {
                    family: family.name.clone(),
                    source,
                }
            })?;
            let score = cfg.selection.score.score(&rows, &cfg.metrics, &cfg.portfolio);
            Ok(GridPoint {
                config: config.clone(),
                label: config.label(),
                score,
                rows,
            })
        })
        .collect()
}

/// Select and validate one family. `None` when nothing scored in-sample.
pub fn select_family(
    is_days: &[LoadedDay],
    oos_days: &[LoadedDay],
    family: &StrategyFamily,
    cfg: &BacktestConfig,
) -> Result<Option<FamilyOutcome>, SelectionError> {
    let grid = evaluate_grid(is_days, family, cfg)?;
    let scores: Vec<f64> = grid.iter().map(|g| g.score).collect();

    let Some(best) = pick_best(&scores, cfg.selection.score) else {
        warn!(family = %family.name, "no in-sample result, skipping family");
        return Ok(None);
    };

    let chosen = &grid[best];
    info!(
        family = %family.name,
        best = %chosen.label,
        score = chosen.score,
        grid = grid.len(),
        "selected in-sample best"
    );

    let oos_rows = run_session(oos_days, &chosen.config, &cfg.sim_config(), &cfg.columns)
        .map_err(|source| SelectionError::Strategy {
            family: family.name.clone(),
            source,
        })?;
    let oos_matrix = build_metric_matrix(&oos_rows, &cfg.metrics, &cfg.portfolio);

    Ok(Some(FamilyOutcome {
        name: family.name.clone(),
        grid,
        best,
        oos_rows,
        oos_matrix,
    }))
}

/// Run every configured family over `data`. No file output.
pub fn run_selection(
    cfg: &BacktestConfig,
    data: &DataSet,
) -> Result<SelectionReport, SelectionError> {
    cfg.validate()?;
    let (is_days, oos_days) = split_days(&data.days, cfg.selection.is_ratio);
    info!(
        is_days = is_days.len(),
        oos_days = oos_days.len(),
        "split days"
    );
    if oos_days.is_empty() {
        warn!("no out-of-sample days; OOS tables will be empty");
    }

    let mut families = Vec::new();
    let mut skipped = Vec::new();
    for family in cfg.strategy_families() {
        match select_family(is_days, oos_days, &family, cfg)? {
            Some(outcome) => families.push(outcome),
            None => skipped.push(family.name.clone()),
        }
    }

    Ok(SelectionReport {
        is_days: is_days.len(),
        oos_days: oos_days.len(),
        families,
        skipped,
        fingerprint: cfg.fingerprint(),
    })
}

// ─── Outputs ─────────────────────────────────────────────────────────

/// Write every per-family and global artifact under `results_root`.
pub fn write_outputs(
    report: &SelectionReport,
    cfg: &BacktestConfig,
    results_root: &Path,
) -> Result<(), SelectionError> {
    for outcome in &report.families {
        let dir = results_root.join(&outcome.name);
        for point in &outcome.grid {
            write_pnl_csv(
                &dir.join(format!("grid_IS_{}.csv", point.label)),
                &point.rows,
                &point.label,
            )?;
        }

        let best = outcome.best_point();
        write_json(
            &dir.join("best_params.json"),
            &BestParams {
                strategy: &outcome.name,
                label: &best.label,
                score_metric: cfg.selection.score,
                is_score: best.score,
                params: &best.config,
            },
        )?;
        write_pnl_csv(&dir.join("daily_pnl_IS_best.csv"), &best.rows, &best.label)?;
        write_pnl_csv(&dir.join("daily_pnl_OOS.csv"), &outcome.oos_rows, &best.label)?;
        write_matrix_csv(&dir.join("oos_matrix.csv"), &outcome.oos_matrix)?;
    }

    let parts: Vec<TaggedRows<'_>> = report
        .families
        .iter()
        .map(|o| TaggedRows {
            strategy: &o.name,
            tag: &o.best_point().label,
            rows: &o.oos_rows,
        })
        .collect();
    write_combined_pnl_csv(&results_root.join("ALL_strategies_daily_pnl_OOS.csv"), &parts)?;

    let summary: Vec<(String, MetricRow)> = report
        .families
        .iter()
        .filter_map(|o| o.oos_portfolio().map(|row| (o.name.clone(), row.clone())))
        .collect();
    write_summary_csv(&results_root.join("SUMMARY_Portfolio_OOS.csv"), &summary)?;

    write_json(
        &results_root.join("config_snapshot.json"),
        &ConfigSnapshot {
            fingerprint: &report.fingerprint,
            config: cfg,
        },
    )?;

    info!(root = %results_root.display(), families = report.families.len(), "wrote results");
    Ok(())
}

/// Full sweep: select over `data`, then write outputs to the configured root.
pub fn run_and_export(
    cfg: &BacktestConfig,
    data: &DataSet,
) -> Result<SelectionReport, SelectionError> {
    let report = run_selection(cfg, data)?;
    write_outputs(&report, cfg, &cfg.data.results_root)?;
    Ok(report)
}
