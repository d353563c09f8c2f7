//! DayLab CLI: intraday sweep, day listing, metric matrix, inspection, synthetic data.
//!
//! Commands:
//! - `run`: in-sample grid selection and out-of-sample validation from a TOML config
//! - `days`: list day directories and the IS/OOS split
//! - `matrix`: metric matrix of an existing PnL CSV
//! - `inspect`: simulate one instrument file and print the row and trade tape
//! - `synth`: write synthetic minute-bar day directories

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use daylab_core::data::ColumnMap;
use daylab_core::engine::{simulate_frame, RiskConfig, SimConfig};
use daylab_core::fees::FeeModel;
use daylab_core::strategy::StrategyConfig;
use daylab_runner::config::PortfolioConfig;
use daylab_runner::data_loader::{extract_ticker, list_day_directories, read_price_csv};
use daylab_runner::export::{format_matrix, read_pnl_csv};
use daylab_runner::{
    build_metric_matrix, load_configured, run_and_export, split_days, write_synthetic_days,
    Annualization, BacktestConfig, MetricsConfig, PORTFOLIO,
};

use crate::logging::{init_logging, LogConfig};

#[derive(Parser)]
#[command(
    name = "daylab",
    about = "DayLab CLI: intraday minute-bar backtesting and parameter selection"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, daylab_runner=debug).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full IS/OOS sweep and write results.
    Run {
        /// TOML config file. Without it the built-in defaults and catalog are used.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override `data.data_root`.
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Override `data.results_root`.
        #[arg(long)]
        results_root: Option<PathBuf>,

        /// Override `data.max_days`.
        #[arg(long)]
        max_days: Option<usize>,
    },
    /// List day directories and how they split into IS and OOS.
    Days {
        #[arg(long, default_value = "Data")]
        data_root: PathBuf,

        #[arg(long, default_value = "Yahoo_1m_")]
        prefix: String,

        #[arg(long, default_value_t = 5.0 / 6.0)]
        is_ratio: f64,
    },
    /// Print the metric matrix of a PnL CSV.
    Matrix {
        #[arg(long)]
        pnl: PathBuf,

        /// Divide daily PnL by this capital to get returns.
        #[arg(long)]
        notional: Option<f64>,

        /// Compound daily returns when annualizing.
        #[arg(long, default_value_t = false)]
        compounding: bool,

        #[arg(long, default_value_t = 252.0)]
        periods_per_year: f64,
    },
    /// Simulate one instrument file and print its PnL row and trades.
    Inspect {
        /// Instrument CSV (`df_<TICKER>_*.csv`).
        #[arg(long)]
        file: PathBuf,

        /// Strategy as JSON, e.g. '{"type":"ma_cross","fast":5,"slow":20}'.
        #[arg(long)]
        strategy: String,

        #[arg(long, default_value_t = 0.0001)]
        fee_rate: f64,

        #[arg(long, default_value_t = 1.0)]
        unit_size: f64,

        #[arg(long, default_value_t = 14)]
        atr_period: usize,

        #[arg(long, default_value_t = 1.5)]
        stop_atr: f64,

        #[arg(long, default_value_t = 2.0)]
        take_atr: f64,
    },
    /// Write synthetic minute-bar day directories.
    Synth {
        #[arg(long)]
        out: PathBuf,

        #[arg(long, num_args = 1.., required = true)]
        tickers: Vec<String>,

        #[arg(long, default_value_t = 12)]
        days: usize,

        #[arg(long, default_value_t = 390)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env(&cli.log_level))?;

    match cli.command {
        Commands::Run {
            config,
            data_root,
            results_root,
            max_days,
        } => run_sweep(config.as_deref(), data_root, results_root, max_days),
        Commands::Days {
            data_root,
            prefix,
            is_ratio,
        } => run_days(&data_root, &prefix, is_ratio),
        Commands::Matrix {
            pnl,
            notional,
            compounding,
            periods_per_year,
        } => run_matrix(&pnl, notional, compounding, periods_per_year),
        Commands::Inspect {
            file,
            strategy,
            fee_rate,
            unit_size,
            atr_period,
            stop_atr,
            take_atr,
        } => {
            let sim = SimConfig {
                fees: FeeModel::new(fee_rate),
                unit_size,
                risk: RiskConfig {
                    atr_period,
                    stop_multiplier: stop_atr,
                    take_multiplier: take_atr,
                },
            };
            run_inspect(&file, &strategy, &sim)
        }
        Commands::Synth {
            out,
            tickers,
            days,
            bars,
            seed,
        } => run_synth(&out, &tickers, days, bars, seed),
    }
}

fn run_sweep(
    config_path: Option<&Path>,
    data_root: Option<PathBuf>,
    results_root: Option<PathBuf>,
    max_days: Option<usize>,
) -> Result<()> {
    let mut cfg = match config_path {
        Some(path) => BacktestConfig::load(path)?,
        None => BacktestConfig::default(),
    };
    if let Some(root) = data_root {
        cfg.data.data_root = root;
    }
    if let Some(root) = results_root {
        cfg.data.results_root = root;
    }
    if max_days.is_some() {
        cfg.data.max_days = max_days;
    }
    cfg.validate()?;

    let data = load_configured(&cfg.data)?;
    if data.is_empty() {
        bail!(
            "no day directories matching '{}DD_DD_DD' under {}",
            cfg.data.day_prefix,
            cfg.data.data_root.display()
        );
    }
    info!(fingerprint = %cfg.fingerprint(), "starting sweep");

    let report = run_and_export(&cfg, &data)?;

    println!(
        "IS days: {}  OOS days: {}  results: {}",
        report.is_days,
        report.oos_days,
        cfg.data.results_root.display()
    );
    println!();
    println!(
        "{:<14} {:<40} {:>10} {:>12} {:>10} {:>12}",
        "Strategy", "Best", "IS score", "OOS ann.", "OOS Sharpe", "OOS MaxDD"
    );
    println!("{}", "-".repeat(103));
    for family in &report.families {
        let best = family.best_point();
        match family.oos_portfolio() {
            Some(p) => println!(
                "{:<14} {:<40} {:>10.4} {:>12.6} {:>10.4} {:>12.6}",
                family.name, best.label, best.score, p.net_return_ann, p.sharpe, p.max_drawdown
            ),
            None => println!(
                "{:<14} {:<40} {:>10.4} {:>12} {:>10} {:>12}",
                family.name, best.label, best.score, "-", "-", "-"
            ),
        }
    }
    for name in &report.skipped {
        println!("{name:<14} (no in-sample result)");
    }
    Ok(())
}

fn run_days(data_root: &Path, prefix: &str, is_ratio: f64) -> Result<()> {
    if !(is_ratio > 0.0 && is_ratio <= 1.0) {
        bail!("--is-ratio must be in (0, 1], got {is_ratio}");
    }
    let days = list_day_directories(data_root, prefix)?;
    let (is_days, oos_days) = split_days(&days, is_ratio);

    println!("{} day directories under {}", days.len(), data_root.display());
    for day in is_days {
        println!("  IS   {}", day.name);
    }
    for day in oos_days {
        println!("  OOS  {}", day.name);
    }
    Ok(())
}

fn run_matrix(
    pnl: &Path,
    notional: Option<f64>,
    compounding: bool,
    periods_per_year: f64,
) -> Result<()> {
    if compounding && notional.is_none() {
        bail!("--compounding needs --notional: raw PnL is not a return");
    }
    let cfg = MetricsConfig {
        annualization: if compounding {
            Annualization::Compounding
        } else {
            Annualization::Arithmetic
        },
        periods_per_year,
        notional,
    };
    cfg.validate()?;

    let rows = read_pnl_csv(pnl)?;
    if rows.is_empty() {
        println!("{}: no rows", pnl.display());
        return Ok(());
    }
    let matrix = build_metric_matrix(&rows, &cfg, &PortfolioConfig::default());
    print!("{}", format_matrix(&matrix));
    if let Some(p) = matrix.iter().find(|r| r.asset == PORTFOLIO) {
        info!(sharpe = p.sharpe, "portfolio");
    }
    Ok(())
}

fn run_inspect(file: &Path, strategy_json: &str, sim: &SimConfig) -> Result<()> {
    let config: StrategyConfig =
        serde_json::from_str(strategy_json).context("failed to parse --strategy JSON")?;
    let mut strategy = config.build()?;

    let frame = read_price_csv(file)?;
    let ticker = file
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(extract_ticker)
        .map(str::to_string)
        .or_else(|| file.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let report = simulate_frame(&frame, &ColumnMap::default(), &ticker, &mut strategy, sim)
        .with_context(|| format!("failed to simulate {}", file.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_synth(out: &Path, tickers: &[String], days: usize, bars: usize, seed: u64) -> Result<()> {
    if days == 0 || bars == 0 {
        bail!("--days and --bars must be positive");
    }
    let dirs = write_synthetic_days(out, tickers, days, bars, seed)?;
    println!(
        "wrote {} day directories ({} tickers × {} bars) under {}",
        dirs.len(),
        tickers.len(),
        bars,
        out.display()
    );
    Ok(())
}
