//! Trading signals derived from indicator state.
//!
//! Two entry points: [`generate_signal`] classifies only the latest bar
//! (live evaluation of a series tail), while [`generate_signal_series`]
//! produces the full signal stream a backtest consumes. Every indicator
//! value at bar `i` depends only on bars `0..=i`, so the stream is exactly
//! what repeated latest-bar evaluation over growing prefixes would emit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::indicator::{detect_crossover, macd, rsi, sma};
use crate::domain::parameters::{IndicatorParameters, StrategyKind};
use crate::domain::price_bar::PriceBar;

const MA_STRENGTH: f64 = 0.7;
const MACD_STRENGTH: f64 = 0.75;
const RSI_STRENGTH: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Buy,
    Sell,
}

/// A discrete buy/sell event at a given bar.
///
/// Produced by the indicator engine, consumed once by the trade simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub code: String,
    pub date: NaiveDate,
    pub direction: SignalDirection,
    pub price: f64,
    pub strength: f64,
}

/// Classify the latest bar of `bars`. `None` when history is insufficient
/// for the required indicators or no rule fires.
pub fn generate_signal(
    code: &str,
    bars: &[PriceBar],
    parameters: &IndicatorParameters,
    kind: StrategyKind,
) -> Option<Signal> {
    let last = bars.last()?;
    let direction = match kind {
        StrategyKind::Ma => {
            let cross = detect_crossover(
                bars,
                parameters.short_period as usize,
                parameters.long_period as usize,
            );
            if cross.golden {
                Some(SignalDirection::Buy)
            } else if cross.death {
                Some(SignalDirection::Sell)
            } else {
                None
            }
        }
        StrategyKind::Macd => {
            let points = macd(
                bars,
                parameters.fast_period as usize,
                parameters.slow_period as usize,
                parameters.signal_period as usize,
                2,
            );
            if points.len() < 2 {
                None
            } else {
                macd_crossing(points[0].line, points[0].signal, points[1].line, points[1].signal)
            }
        }
        StrategyKind::Rsi => {
            let values = rsi(bars, parameters.rsi_period as usize, 2);
            if values.len() < 2 {
                None
            } else {
                rsi_crossing(values[0], values[1], parameters)
            }
        }
    }?;

    Some(Signal {
        code: code.to_string(),
        date: last.date,
        direction,
        price: last.close,
        strength: kind_strength(kind),
    })
}

/// Produce the full signal stream for a backtest run, one pass over the
/// series instead of re-deriving indicators per bar.
pub fn generate_signal_series(
    code: &str,
    bars: &[PriceBar],
    parameters: &IndicatorParameters,
    kind: StrategyKind,
) -> Vec<Signal> {
    match kind {
        StrategyKind::Ma => ma_signal_series(code, bars, parameters),
        StrategyKind::Macd => macd_signal_series(code, bars, parameters),
        StrategyKind::Rsi => rsi_signal_series(code, bars, parameters),
    }
}

fn kind_strength(kind: StrategyKind) -> f64 {
    match kind {
        StrategyKind::Ma => MA_STRENGTH,
        StrategyKind::Macd => MACD_STRENGTH,
        StrategyKind::Rsi => RSI_STRENGTH,
    }
}

fn macd_crossing(
    prev_line: f64,
    prev_signal: f64,
    cur_line: f64,
    cur_signal: f64,
) -> Option<SignalDirection> {
    if prev_line <= prev_signal && cur_line > cur_signal {
        Some(SignalDirection::Buy)
    } else if prev_line >= prev_signal && cur_line < cur_signal {
        Some(SignalDirection::Sell)
    } else {
        None
    }
}

/// Threshold crossings, not levels: a value parked inside the oversold or
/// overbought band emits nothing until it crosses back out.
fn rsi_crossing(prev: f64, cur: f64, parameters: &IndicatorParameters) -> Option<SignalDirection> {
    if prev <= parameters.rsi_oversold && cur > parameters.rsi_oversold {
        Some(SignalDirection::Buy)
    } else if prev >= parameters.rsi_overbought && cur < parameters.rsi_overbought {
        Some(SignalDirection::Sell)
    } else {
        None
    }
}

fn ma_signal_series(
    code: &str,
    bars: &[PriceBar],
    parameters: &IndicatorParameters,
) -> Vec<Signal> {
    let short = parameters.short_period as usize;
    let long = parameters.long_period as usize;
    let short_ma = sma(bars, short, bars.len());
    let long_ma = sma(bars, long, bars.len());
    if short_ma.len() < 2 || long_ma.len() < 2 {
        return Vec::new();
    }

    let mut signals = Vec::new();
    // long_ma[k] belongs to bar index k + long - 1; start where both the
    // current and previous bar have values of both averages.
    for i in long.max(short)..bars.len() {
        let ps = short_ma[i - short];
        let cs = short_ma[i - short + 1];
        let pl = long_ma[i - long];
        let cl = long_ma[i - long + 1];

        let direction = if ps <= pl && cs > cl {
            Some(SignalDirection::Buy)
        } else if ps >= pl && cs < cl {
            Some(SignalDirection::Sell)
        } else {
            None
        };

        if let Some(direction) = direction {
            signals.push(Signal {
                code: code.to_string(),
                date: bars[i].date,
                direction,
                price: bars[i].close,
                strength: MA_STRENGTH,
            });
        }
    }
    signals
}

fn macd_signal_series(
    code: &str,
    bars: &[PriceBar],
    parameters: &IndicatorParameters,
) -> Vec<Signal> {
    let points = macd(
        bars,
        parameters.fast_period as usize,
        parameters.slow_period as usize,
        parameters.signal_period as usize,
        bars.len(),
    );
    if points.len() < 2 {
        return Vec::new();
    }

    let offset = bars.len() - points.len();
    let mut signals = Vec::new();
    for k in 1..points.len() {
        let prev = points[k - 1];
        let cur = points[k];
        if let Some(direction) = macd_crossing(prev.line, prev.signal, cur.line, cur.signal) {
            let bar = &bars[offset + k];
            signals.push(Signal {
                code: code.to_string(),
                date: bar.date,
                direction,
                price: bar.close,
                strength: MACD_STRENGTH,
            });
        }
    }
    signals
}

fn rsi_signal_series(
    code: &str,
    bars: &[PriceBar],
    parameters: &IndicatorParameters,
) -> Vec<Signal> {
    let values = rsi(bars, parameters.rsi_period as usize, bars.len());
    if values.len() < 2 {
        return Vec::new();
    }

    let offset = bars.len() - values.len();
    let mut signals = Vec::new();
    for k in 1..values.len() {
        if let Some(direction) = rsi_crossing(values[k - 1], values[k], parameters) {
            let bar = &bars[offset + k];
            signals.push(Signal {
                code: code.to_string(),
                date: bar.date,
                direction,
                price: bar.close,
                strength: RSI_STRENGTH,
            });
        }
    }
    signals
}
