//! MACD (Moving Average Convergence Divergence).
//!
//! Line = EMA(fast) − EMA(slow), with both EMA sequences aligned at the
//! series tail. Signal line = EMA of the line over `signal_period`.
//! Histogram = line − signal line.

use crate::domain::indicator::ema::{ema, ema_values};
use crate::domain::indicator::sma::tail;
use crate::domain::price_bar::PriceBar;

/// One MACD observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Compute MACD points, at most `count` most-recent, oldest first.
///
/// Empty whenever the series is too short to produce a single signal-line
/// value (fewer than `slow + signal_period - 1` bars with default periods).
pub fn macd(
    bars: &[PriceBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
    count: usize,
) -> Vec<MacdPoint> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return Vec::new();
    }

    let fast_ema = ema(bars, fast, bars.len());
    let slow_ema = ema(bars, slow, bars.len());
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return Vec::new();
    }

    // Both sequences end on the last bar; align them there.
    let overlap = fast_ema.len().min(slow_ema.len());
    let fast_tail = &fast_ema[fast_ema.len() - overlap..];
    let slow_tail = &slow_ema[slow_ema.len() - overlap..];

    let line: Vec<f64> = fast_tail
        .iter()
        .zip(slow_tail)
        .map(|(f, s)| f - s)
        .collect();

    let signal = ema_values(&line, signal_period, line.len());
    if signal.is_empty() {
        return Vec::new();
    }

    let line_tail = &line[line.len() - signal.len()..];
    let points = line_tail
        .iter()
        .zip(&signal)
        .map(|(&l, &s)| MacdPoint {
            line: l,
            signal: s,
            histogram: l - s,
        })
        .collect();

    tail(points, count)
}
