//! Trade simulation over a signal stream.
//!
//! One run drives a single instrument through Flat → Holding → Flat
//! transitions: full-position entries on buy signals, full liquidations on
//! sell signals, a stop-loss/take-profit overlay evaluated before the bar's
//! signal, and a per-bar equity curve. Each run owns a fresh
//! [`AccountState`]; nothing is shared between concurrent runs.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::account::AccountState;
use crate::domain::parameters::RiskSettings;
use crate::domain::price_bar::PriceBar;
use crate::domain::signal::{Signal, SignalDirection};
use crate::domain::trade::{EquityPoint, SimulatedTrade, TradeType};

/// Commission model and position granularity.
///
/// Commission = max(min_commission, commission_rate × amount), charged on
/// both sides. Quantities are floored to whole lots.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    pub min_commission: f64,
    pub lot_size: i64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.0003,
            min_commission: 5.0,
            lot_size: 100,
        }
    }
}

impl ExecutionConfig {
    pub fn commission(&self, amount: f64) -> f64 {
        (amount * self.commission_rate).max(self.min_commission)
    }
}

/// Everything one simulation run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub trades: Vec<SimulatedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_capital: f64,
}

/// Run the simulator over `bars` with the given signal stream.
///
/// Signals are matched to bars by date; a signal whose date has no bar is
/// ignored. An unfundable buy is skipped whole — never partially filled —
/// so cash stays non-negative after every bar. A position still open at the
/// end is valued at the last close without recording a closing trade.
pub fn simulate(
    code: &str,
    bars: &[PriceBar],
    signals: &[Signal],
    initial_capital: f64,
    risk: &RiskSettings,
    exec: &ExecutionConfig,
) -> SimulationOutcome {
    let mut account = AccountState::new(initial_capital);
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());

    let by_date: HashMap<NaiveDate, &Signal> = signals.iter().map(|s| (s.date, s)).collect();

    for bar in bars {
        // Risk overlay first; a forced exit shadows the bar's own signal.
        let risk_exited = check_risk_exit(&mut account, code, bar, risk, exec, &mut trades);

        if !risk_exited {
            if let Some(signal) = by_date.get(&bar.date) {
                match signal.direction {
                    SignalDirection::Buy if account.is_flat() => {
                        try_enter(&mut account, code, bar, risk, exec, &mut trades);
                    }
                    SignalDirection::Sell if account.is_holding() => {
                        liquidate(&mut account, code, bar.close, bar.date, exec, &mut trades);
                    }
                    // Buy while holding / sell while flat: no-op.
                    _ => {}
                }
            }
        }

        equity_curve.push(EquityPoint {
            date: bar.date,
            equity: account.equity(bar.close),
        });
    }

    let final_capital = equity_curve
        .last()
        .map(|p| p.equity)
        .unwrap_or(initial_capital);

    SimulationOutcome {
        trades,
        equity_curve,
        final_capital,
    }
}

fn check_risk_exit(
    account: &mut AccountState,
    code: &str,
    bar: &PriceBar,
    risk: &RiskSettings,
    exec: &ExecutionConfig,
    trades: &mut Vec<SimulatedTrade>,
) -> bool {
    if !account.is_holding() {
        return false;
    }

    let basis = account.average_cost();
    let stop_hit = risk.stop_loss_pct > 0.0 && bar.close <= basis * (1.0 - risk.stop_loss_pct / 100.0);
    let profit_hit =
        risk.take_profit_pct > 0.0 && bar.close >= basis * (1.0 + risk.take_profit_pct / 100.0);

    if stop_hit || profit_hit {
        liquidate(account, code, bar.close, bar.date, exec, trades);
        return true;
    }
    false
}

fn try_enter(
    account: &mut AccountState,
    code: &str,
    bar: &PriceBar,
    risk: &RiskSettings,
    exec: &ExecutionConfig,
    trades: &mut Vec<SimulatedTrade>,
) {
    let budget = account.cash.min(account.cash * risk.max_position_pct / 100.0);
    if bar.close <= 0.0 {
        return;
    }

    let lots = (budget / bar.close / exec.lot_size as f64).floor() as i64;
    let quantity = lots * exec.lot_size;
    if quantity <= 0 {
        return;
    }

    let amount = quantity as f64 * bar.close;
    let commission = exec.commission(amount);
    if amount + commission > account.cash {
        return;
    }

    account.cash -= amount + commission;
    account.position_quantity = quantity;
    account.position_cost_basis = amount + commission;

    trades.push(SimulatedTrade {
        code: code.to_string(),
        trade_type: TradeType::Buy,
        quantity,
        price: bar.close,
        commission,
        amount,
        executed_at: bar.date,
    });
}

fn liquidate(
    account: &mut AccountState,
    code: &str,
    price: f64,
    date: NaiveDate,
    exec: &ExecutionConfig,
    trades: &mut Vec<SimulatedTrade>,
) {
    let quantity = account.position_quantity;
    let amount = quantity as f64 * price;
    // The commission floor never exceeds the proceeds, so a liquidation can
    // never reduce cash.
    let commission = exec.commission(amount).min(amount);

    account.cash += amount - commission;
    account.position_quantity = 0;
    account.position_cost_basis = 0.0;

    trades.push(SimulatedTrade {
        code: code.to_string(),
        trade_type: TradeType::Sell,
        quantity,
        price,
        commission,
        amount,
        executed_at: date,
    });
}
