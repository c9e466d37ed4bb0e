//! Backtest pipeline: price series → signals → simulation → metrics.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::metrics::Metrics;
use crate::domain::parameters::StrategyDefinition;
use crate::domain::price_bar::PriceBar;
use crate::domain::signal::generate_signal_series;
use crate::domain::simulator::{simulate, ExecutionConfig};
use crate::domain::trade::{EquityPoint, SimulatedTrade};

/// Complete result of one instrument's backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub code: String,
    pub strategy: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub trades: Vec<SimulatedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// An instrument excluded from a batch run, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedInstrument {
    pub code: String,
    pub reason: String,
}

/// Batch run output: one report per usable instrument, skips for the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub reports: Vec<BacktestReport>,
    pub skipped: Vec<SkippedInstrument>,
}

/// Run one instrument through the full pipeline.
///
/// `None` when the series is empty — the caller decides whether that skips
/// a batch entry or fails a single-instrument request.
pub fn run_backtest(
    code: &str,
    bars: &[PriceBar],
    strategy: &StrategyDefinition,
    exec: &ExecutionConfig,
) -> Option<BacktestReport> {
    if bars.is_empty() {
        return None;
    }

    let signals = generate_signal_series(code, bars, &strategy.parameters, strategy.kind);
    let outcome = simulate(
        code,
        bars,
        &signals,
        strategy.initial_capital,
        &strategy.risk,
        exec,
    );

    let start_date = bars[0].date;
    let end_date = bars[bars.len() - 1].date;
    let metrics = Metrics::compute(
        strategy.initial_capital,
        &outcome.equity_curve,
        &outcome.trades,
        start_date,
        end_date,
    );

    Some(BacktestReport {
        code: code.to_string(),
        strategy: strategy.name.clone(),
        start_date,
        end_date,
        initial_capital: strategy.initial_capital,
        final_capital: outcome.final_capital,
        total_return: metrics.total_return,
        annualized_return: metrics.annualized_return,
        sharpe_ratio: metrics.sharpe_ratio,
        max_drawdown: metrics.max_drawdown,
        total_trades: metrics.total_trades,
        winning_trades: metrics.winning_trades,
        win_rate: metrics.win_rate,
        trades: outcome.trades,
        equity_curve: outcome.equity_curve,
    })
}

/// Backtest a list of instruments, each with its own account seeded from the
/// same initial capital — capital is never pooled across instruments.
///
/// Instrument runs are independent and execute on the rayon pool; report
/// order follows input order regardless of completion order. Instruments
/// without history are skipped, not failed.
pub fn run_batch(
    series: &[(String, Vec<PriceBar>)],
    strategy: &StrategyDefinition,
    exec: &ExecutionConfig,
) -> BatchOutcome {
    let results: Vec<(String, Option<BacktestReport>)> = series
        .par_iter()
        .map(|(code, bars)| (code.clone(), run_backtest(code, bars, strategy, exec)))
        .collect();

    let mut reports = Vec::new();
    let mut skipped = Vec::new();
    for (code, report) in results {
        match report {
            Some(report) => reports.push(report),
            None => skipped.push(SkippedInstrument {
                code,
                reason: "no price history in the requested range".into(),
            }),
        }
    }

    BatchOutcome { reports, skipped }
}
