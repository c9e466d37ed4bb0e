//! Performance metrics over an equity curve and trade ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::trade::{EquityPoint, SimulatedTrade, TradeType};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.25;

/// Aggregate performance of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
}

impl Metrics {
    /// Reduce a run's outputs to aggregate metrics.
    ///
    /// Degenerate inputs degrade instead of failing: an empty curve scores
    /// zero return, and a zero-variance return series reports a Sharpe of 0.
    pub fn compute(
        initial_capital: f64,
        equity_curve: &[EquityPoint],
        trades: &[SimulatedTrade],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let elapsed_days = (end_date - start_date).num_days().max(1) as f64;
        let annualized_return =
            (1.0 + total_return).powf(CALENDAR_DAYS_PER_YEAR / elapsed_days) - 1.0;

        let sharpe_ratio = compute_sharpe(equity_curve);
        let max_drawdown = compute_max_drawdown(equity_curve);
        let (winning_trades, closed_trades) = count_winning_sells(trades);

        let win_rate = if closed_trades > 0 {
            winning_trades as f64 / closed_trades as f64
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown,
            total_trades: trades.len(),
            winning_trades,
            win_rate,
        }
    }
}

/// Mean per-bar return over its population standard deviation, annualized
/// by √252. Zero when fewer than two points or zero variance.
fn compute_sharpe(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .filter(|w| w[0].equity > 0.0)
        .map(|w| (w[1].equity - w[0].equity) / w[0].equity)
        .collect();
    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Largest peak-to-trough relative decline, reported non-negative.
fn compute_max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Replay the ledger tracking the open position's cost basis; a sell wins
/// when its net proceeds exceed that basis. Returns (wins, total sells).
fn count_winning_sells(trades: &[SimulatedTrade]) -> (usize, usize) {
    let mut wins = 0usize;
    let mut sells = 0usize;
    let mut cost_basis = 0.0f64;

    for trade in trades {
        match trade.trade_type {
            TradeType::Buy => {
                cost_basis += trade.amount + trade.commission;
            }
            TradeType::Sell => {
                sells += 1;
                let proceeds = trade.amount - trade.commission;
                if proceeds > cost_basis {
                    wins += 1;
                }
                cost_basis = 0.0;
            }
        }
    }
    (wins, sells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                date: date(1) + chrono::Duration::days(i as i64),
                equity,
            })
            .collect()
    }

    fn trade(trade_type: TradeType, quantity: i64, price: f64, commission: f64) -> SimulatedTrade {
        SimulatedTrade {
            code: "TEST".into(),
            trade_type,
            quantity,
            price,
            commission,
            amount: quantity as f64 * price,
            executed_at: date(1),
        }
    }

    #[test]
    fn total_return_from_curve() {
        let m = Metrics::compute(100_000.0, &curve(&[100_000.0, 110_000.0]), &[], date(1), date(2));
        assert!((m.total_return - 0.10).abs() < 1e-12);
    }

    #[test]
    fn empty_curve_scores_zero() {
        let m = Metrics::compute(100_000.0, &[], &[], date(1), date(31));
        assert!((m.total_return - 0.0).abs() < f64::EPSILON);
        assert!((m.annualized_return - 0.0).abs() < 1e-12);
        assert!((m.sharpe_ratio - 0.0).abs() < f64::EPSILON);
        assert!((m.max_drawdown - 0.0).abs() < f64::EPSILON);
        assert_eq!(m.total_trades, 0);
        assert!((m.win_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn annualized_return_compounds_date_span() {
        // 10% over half a year annualizes to roughly 21%.
        let end = date(1) + chrono::Duration::days(182);
        let m = Metrics::compute(100_000.0, &curve(&[100_000.0, 110_000.0]), &[], date(1), end);
        let expected = 1.10f64.powf(365.25 / 182.0) - 1.0;
        assert_relative_eq!(m.annualized_return, expected, max_relative = 1e-12);
    }

    #[test]
    fn elapsed_days_floor_is_one() {
        // Same start and end date must not divide by zero.
        let m = Metrics::compute(100_000.0, &curve(&[100_000.0, 110_000.0]), &[], date(1), date(1));
        let expected = 1.10f64.powf(365.25) - 1.0;
        assert_relative_eq!(m.annualized_return, expected, max_relative = 1e-9);
    }

    #[test]
    fn flat_curve_has_zero_sharpe() {
        let m = Metrics::compute(100_000.0, &curve(&[100_000.0; 30]), &[], date(1), date(30));
        assert!((m.sharpe_ratio - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn steady_gain_has_positive_sharpe() {
        let values: Vec<f64> = (0..30)
            .map(|i| 100_000.0 + (i as f64) * 500.0 + if i % 2 == 0 { 0.0 } else { 100.0 })
            .collect();
        let m = Metrics::compute(100_000.0, &curve(&values), &[], date(1), date(30));
        assert!(m.sharpe_ratio > 0.0);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        let m = Metrics::compute(
            100.0,
            &curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]),
            &[],
            date(1),
            date(6),
        );
        assert!((m.max_drawdown - (110.0 - 80.0) / 110.0).abs() < 1e-12);
    }

    #[test]
    fn drawdown_zero_on_monotone_curve() {
        let values: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let m = Metrics::compute(100.0, &curve(&values), &[], date(1), date(10));
        assert!((m.max_drawdown - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn win_rate_counts_profitable_sells() {
        let trades = vec![
            trade(TradeType::Buy, 100, 10.0, 5.0),
            trade(TradeType::Sell, 100, 12.0, 5.0), // win: 1195 > 1005
            trade(TradeType::Buy, 100, 12.0, 5.0),
            trade(TradeType::Sell, 100, 11.0, 5.0), // loss: 1095 < 1205
        ];
        let m = Metrics::compute(100_000.0, &curve(&[100_000.0, 100_190.0]), &trades, date(1), date(4));

        assert_eq!(m.total_trades, 4);
        assert_eq!(m.winning_trades, 1);
        assert!((m.win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn commission_can_turn_win_into_loss() {
        let trades = vec![
            trade(TradeType::Buy, 100, 10.0, 30.0),
            // Price up, but 60 of round-trip commission eats the 20 gain.
            trade(TradeType::Sell, 100, 10.2, 30.0),
        ];
        let m = Metrics::compute(100_000.0, &curve(&[100_000.0, 99_960.0]), &trades, date(1), date(2));
        assert_eq!(m.winning_trades, 0);
        assert!((m.win_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn win_rate_zero_without_round_trips() {
        let trades = vec![trade(TradeType::Buy, 100, 10.0, 5.0)];
        let m = Metrics::compute(100_000.0, &curve(&[100_000.0, 100_500.0]), &trades, date(1), date(2));
        assert_eq!(m.total_trades, 1);
        assert!((m.win_rate - 0.0).abs() < f64::EPSILON);
    }
}
