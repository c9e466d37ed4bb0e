//! Grid-search parameter optimization.
//!
//! Enumerates the Cartesian product of the configured parameter ranges,
//! scores every candidate with a full backtest per instrument, and keeps
//! the best by the configured objective. Candidate evaluations run on a
//! dedicated thread pool sized to `max_concurrency`; the reduction is a
//! sequential fold over enumeration order, so ties and float equality
//! resolve identically no matter which evaluation finished first.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::backtest::{run_backtest, BacktestReport};
use crate::domain::error::QuantbackError;
use crate::domain::parameters::{IndicatorParameters, StrategyDefinition};
use crate::domain::price_bar::PriceBar;
use crate::domain::simulator::ExecutionConfig;

/// Inclusive integer range with a step, e.g. 5..=20 by 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl ParameterRange {
    pub fn new(min: u32, max: u32, step: u32) -> Self {
        ParameterRange { min, max, step }
    }

    fn validate(&self, name: &str) -> Result<(), QuantbackError> {
        if self.step == 0 {
            return Err(QuantbackError::InvalidRange {
                name: name.into(),
                reason: "step must be positive".into(),
            });
        }
        if self.min > self.max {
            return Err(QuantbackError::InvalidRange {
                name: name.into(),
                reason: format!("min {} exceeds max {}", self.min, self.max),
            });
        }
        if self.min == 0 {
            return Err(QuantbackError::InvalidRange {
                name: name.into(),
                reason: "values must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        (self.min..=self.max).step_by(self.step as usize)
    }
}

/// What the search maximizes — or minimizes, for drawdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Objective {
    TotalReturn,
    SharpeRatio,
    MaxDrawdown,
    WinRate,
}

impl Objective {
    pub fn extract(&self, report: &BacktestReport) -> f64 {
        match self {
            Objective::TotalReturn => report.total_return,
            Objective::SharpeRatio => report.sharpe_ratio,
            Objective::MaxDrawdown => report.max_drawdown,
            Objective::WinRate => report.win_rate,
        }
    }

    /// Strict improvement, so the first candidate in enumeration order wins
    /// ties.
    pub fn better_than(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Objective::MaxDrawdown => candidate < incumbent,
            _ => candidate > incumbent,
        }
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "total_return" | "totalreturn" => Ok(Objective::TotalReturn),
            "sharpe_ratio" | "sharperatio" | "sharpe" => Ok(Objective::SharpeRatio),
            "max_drawdown" | "maxdrawdown" | "drawdown" => Ok(Objective::MaxDrawdown),
            "win_rate" | "winrate" => Ok(Objective::WinRate),
            other => Err(format!("unknown objective '{other}'")),
        }
    }
}

/// Grid definition plus concurrency bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConfig {
    pub objective: Objective,
    pub short_period: ParameterRange,
    pub long_period: ParameterRange,
    pub rsi_overbought: ParameterRange,
    pub rsi_oversold: ParameterRange,
    pub max_concurrency: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        OptimizationConfig {
            objective: Objective::TotalReturn,
            short_period: ParameterRange::new(5, 20, 1),
            long_period: ParameterRange::new(20, 60, 5),
            rsi_overbought: ParameterRange::new(70, 85, 5),
            rsi_oversold: ParameterRange::new(15, 30, 5),
            max_concurrency: 4,
        }
    }
}

impl OptimizationConfig {
    /// Structural validation, rejected before any evaluation begins.
    pub fn validate(&self) -> Result<(), QuantbackError> {
        self.short_period.validate("short_period")?;
        self.long_period.validate("long_period")?;
        self.rsi_overbought.validate("rsi_overbought")?;
        self.rsi_oversold.validate("rsi_oversold")?;
        if self.max_concurrency == 0 {
            return Err(QuantbackError::InvalidParameter {
                name: "max_concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// The candidate set, in deterministic enumeration order. Combinations
    /// with short ≥ long or oversold ≥ overbought are structurally useless
    /// and skipped.
    pub fn candidates(&self, base: &IndicatorParameters) -> Vec<IndicatorParameters> {
        let mut out = Vec::new();
        for short in self.short_period.values() {
            for long in self.long_period.values() {
                if short >= long {
                    continue;
                }
                for overbought in self.rsi_overbought.values() {
                    for oversold in self.rsi_oversold.values() {
                        if oversold >= overbought {
                            continue;
                        }
                        out.push(IndicatorParameters {
                            short_period: short,
                            long_period: long,
                            rsi_overbought: overbought as f64,
                            rsi_oversold: oversold as f64,
                            ..base.clone()
                        });
                    }
                }
            }
        }
        out
    }
}

/// Cooperative cancellation flag shared between the caller and a running
/// optimization. Checked between candidate evaluations: in-flight candidates
/// finish, pending ones are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// One scored grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOutcome {
    pub parameters: IndicatorParameters,
    pub objective_value: f64,
    pub total_trades: usize,
}

/// Result of a grid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationOutcome {
    pub objective: Objective,
    pub best: Option<CandidateOutcome>,
    pub evaluated_candidates: usize,
    pub total_candidates: usize,
    pub history: Vec<CandidateOutcome>,
}

/// Grid-search the parameter space of `strategy` over the supplied price
/// series (one entry per instrument, already windowed to the backtest
/// range).
///
/// A candidate's objective value is the mean over the instruments that
/// produced a report; instruments without history are skipped per run, and
/// a candidate with no usable instrument at all is not counted as
/// evaluated.
pub fn optimize(
    strategy: &StrategyDefinition,
    series: &[(String, Vec<PriceBar>)],
    config: &OptimizationConfig,
    exec: &ExecutionConfig,
    cancel: &CancelToken,
) -> Result<OptimizationOutcome, QuantbackError> {
    strategy.parameters.validate()?;
    config.validate()?;

    let candidates = config.candidates(&strategy.parameters);
    let total_candidates = candidates.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_concurrency)
        .build()
        .map_err(|e| QuantbackError::Io(std::io::Error::other(e)))?;

    let scored: Vec<Option<CandidateOutcome>> = pool.install(|| {
        candidates
            .into_par_iter()
            .map(|parameters| {
                if cancel.is_cancelled() {
                    return None;
                }
                evaluate_candidate(strategy, series, parameters, config.objective, exec)
            })
            .collect()
    });

    // Single-owner reduction over enumeration order keeps the first-found
    // tie-break independent of which worker finished first.
    let mut best: Option<CandidateOutcome> = None;
    let mut history = Vec::new();
    for outcome in scored.into_iter().flatten() {
        let improves = match &best {
            Some(incumbent) => config
                .objective
                .better_than(outcome.objective_value, incumbent.objective_value),
            None => true,
        };
        if improves {
            best = Some(outcome.clone());
        }
        history.push(outcome);
    }

    Ok(OptimizationOutcome {
        objective: config.objective,
        best,
        evaluated_candidates: history.len(),
        total_candidates,
        history,
    })
}

/// Score one grid point: a fresh simulation per instrument, never a shared
/// account. Runs instruments sequentially so the worker-pool bound is the
/// only source of parallelism.
fn evaluate_candidate(
    strategy: &StrategyDefinition,
    series: &[(String, Vec<PriceBar>)],
    parameters: IndicatorParameters,
    objective: Objective,
    exec: &ExecutionConfig,
) -> Option<CandidateOutcome> {
    let mut candidate_strategy = strategy.clone();
    candidate_strategy.apply_parameters(&parameters);

    let mut values = Vec::with_capacity(series.len());
    let mut total_trades = 0usize;
    for (code, bars) in series {
        if let Some(report) = run_backtest(code, bars, &candidate_strategy, exec) {
            values.push(objective.extract(&report));
            total_trades += report.total_trades;
        }
    }
    if values.is_empty() {
        return None;
    }

    Some(CandidateOutcome {
        parameters,
        objective_value: values.iter().sum::<f64>() / values.len() as f64,
        total_trades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parameters::{RiskSettings, StrategyKind};
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
                turnover: close * 1_000.0,
            })
            .collect()
    }

    fn ma_strategy() -> StrategyDefinition {
        StrategyDefinition {
            name: "ma".into(),
            kind: StrategyKind::Ma,
            parameters: IndicatorParameters::default(),
            risk: RiskSettings {
                max_position_pct: 100.0,
                stop_loss_pct: 0.0,
                take_profit_pct: 0.0,
            },
            initial_capital: 100_000.0,
        }
    }

    fn small_grid() -> OptimizationConfig {
        OptimizationConfig {
            objective: Objective::TotalReturn,
            short_period: ParameterRange::new(5, 10, 5),
            long_period: ParameterRange::new(20, 30, 10),
            rsi_overbought: ParameterRange::new(70, 70, 1),
            rsi_oversold: ParameterRange::new(30, 30, 1),
            max_concurrency: 2,
        }
    }

    #[test]
    fn range_values_inclusive_of_both_ends() {
        let range = ParameterRange::new(5, 20, 5);
        let values: Vec<u32> = range.values().collect();
        assert_eq!(values, vec![5, 10, 15, 20]);
    }

    #[test]
    fn range_step_overshoot_stops_at_max() {
        let range = ParameterRange::new(5, 12, 5);
        let values: Vec<u32> = range.values().collect();
        assert_eq!(values, vec![5, 10]);
    }

    #[test]
    fn invalid_ranges_rejected_before_evaluation() {
        let mut config = small_grid();
        config.long_period = ParameterRange::new(30, 20, 5);
        let err = optimize(
            &ma_strategy(),
            &[("A".into(), make_bars(&[10.0; 40]))],
            &config,
            &ExecutionConfig::default(),
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, QuantbackError::InvalidRange { .. }));

        let mut config = small_grid();
        config.short_period = ParameterRange::new(5, 10, 0);
        assert!(config.validate().is_err());

        let mut config = small_grid();
        config.max_concurrency = 0;
        assert!(matches!(
            config.validate(),
            Err(QuantbackError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn candidates_skip_degenerate_combinations() {
        let config = OptimizationConfig {
            objective: Objective::TotalReturn,
            short_period: ParameterRange::new(10, 30, 10),
            long_period: ParameterRange::new(20, 30, 10),
            rsi_overbought: ParameterRange::new(30, 70, 40),
            rsi_oversold: ParameterRange::new(30, 30, 1),
            max_concurrency: 1,
        };
        let candidates = config.candidates(&IndicatorParameters::default());

        for c in &candidates {
            assert!(c.short_period < c.long_period);
            assert!(c.rsi_oversold < c.rsi_overbought);
        }
        // short ∈ {10,20,30} × long ∈ {20,30} keeps (10,20),(10,30),(20,30);
        // overbought ∈ {30,70} with oversold 30 keeps only 70.
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn candidates_carry_base_fields() {
        let base = IndicatorParameters {
            fast_period: 8,
            slow_period: 21,
            signal_period: 5,
            ..Default::default()
        };
        let candidates = small_grid().candidates(&base);
        assert_eq!(candidates.len(), 4);
        for c in candidates {
            assert_eq!(c.fast_period, 8);
            assert_eq!(c.slow_period, 21);
            assert_eq!(c.signal_period, 5);
        }
    }

    #[test]
    fn four_point_grid_evaluates_four_candidates() {
        let rising: Vec<f64> = (0..80).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let series = vec![("A".to_string(), make_bars(&rising))];
        let outcome = optimize(
            &ma_strategy(),
            &series,
            &small_grid(),
            &ExecutionConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(outcome.total_candidates, 4);
        assert_eq!(outcome.evaluated_candidates, 4);
        assert_eq!(outcome.history.len(), 4);

        let best = outcome.best.expect("some candidate must score");
        let grid_points: Vec<(u32, u32)> = vec![(5, 20), (5, 30), (10, 20), (10, 30)];
        assert!(grid_points
            .contains(&(best.parameters.short_period, best.parameters.long_period)));
    }

    #[test]
    fn best_dominates_every_evaluated_candidate() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + 20.0 * ((i as f64) / 9.0).sin() + i as f64 * 0.2)
            .collect();
        let series = vec![("A".to_string(), make_bars(&closes))];

        for objective in [
            Objective::TotalReturn,
            Objective::SharpeRatio,
            Objective::MaxDrawdown,
            Objective::WinRate,
        ] {
            let config = OptimizationConfig {
                objective,
                ..small_grid()
            };
            let outcome = optimize(
                &ma_strategy(),
                &series,
                &config,
                &ExecutionConfig::default(),
                &CancelToken::new(),
            )
            .unwrap();

            let best = outcome.best.expect("evaluated grid");
            for candidate in &outcome.history {
                assert!(
                    !objective.better_than(candidate.objective_value, best.objective_value),
                    "{objective:?}: candidate {candidate:?} beats best {best:?}"
                );
            }
        }
    }

    #[test]
    fn first_candidate_wins_ties() {
        // Flat series: every candidate scores exactly 0.0.
        let series = vec![("A".to_string(), make_bars(&[10.0; 80]))];
        let outcome = optimize(
            &ma_strategy(),
            &series,
            &small_grid(),
            &ExecutionConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();

        let best = outcome.best.unwrap();
        assert_eq!(best.parameters.short_period, 5);
        assert_eq!(best.parameters.long_period, 20);
        assert_eq!(best.parameters, outcome.history[0].parameters);
    }

    #[test]
    fn concurrency_does_not_change_selection() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 100.0 + 15.0 * ((i as f64) / 7.0).sin())
            .collect();
        let series = vec![("A".to_string(), make_bars(&closes))];

        let sequential = OptimizationConfig {
            max_concurrency: 1,
            ..small_grid()
        };
        let parallel = OptimizationConfig {
            max_concurrency: 8,
            ..small_grid()
        };

        let a = optimize(
            &ma_strategy(),
            &series,
            &sequential,
            &ExecutionConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();
        let b = optimize(
            &ma_strategy(),
            &series,
            &parallel,
            &ExecutionConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(a.best, b.best);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn cancelled_before_start_evaluates_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let series = vec![("A".to_string(), make_bars(&[10.0; 80]))];
        let outcome = optimize(
            &ma_strategy(),
            &series,
            &small_grid(),
            &ExecutionConfig::default(),
            &cancel,
        )
        .unwrap();

        assert_eq!(outcome.total_candidates, 4);
        assert_eq!(outcome.evaluated_candidates, 0);
        assert!(outcome.best.is_none());
        assert!(outcome.history.is_empty());
    }

    #[test]
    fn no_usable_instruments_scores_nothing() {
        let series = vec![("A".to_string(), Vec::new())];
        let outcome = optimize(
            &ma_strategy(),
            &series,
            &small_grid(),
            &ExecutionConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(outcome.evaluated_candidates, 0);
        assert!(outcome.best.is_none());
    }

    #[test]
    fn objective_parses_common_spellings() {
        assert_eq!("total_return".parse::<Objective>().unwrap(), Objective::TotalReturn);
        assert_eq!("sharpe".parse::<Objective>().unwrap(), Objective::SharpeRatio);
        assert_eq!("MaxDrawdown".parse::<Objective>().unwrap(), Objective::MaxDrawdown);
        assert_eq!("win-rate".parse::<Objective>().unwrap(), Objective::WinRate);
        assert!("alpha".parse::<Objective>().is_err());
    }

    #[test]
    fn drawdown_objective_minimizes() {
        assert!(Objective::MaxDrawdown.better_than(0.05, 0.10));
        assert!(!Objective::MaxDrawdown.better_than(0.10, 0.05));
        assert!(!Objective::MaxDrawdown.better_than(0.05, 0.05));
        assert!(Objective::TotalReturn.better_than(0.10, 0.05));
        assert!(!Objective::TotalReturn.better_than(0.05, 0.05));
    }
}
