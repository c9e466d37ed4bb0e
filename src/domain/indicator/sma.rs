//! Simple Moving Average.
//!
//! Arithmetic mean of the trailing `period` closes at each point. The first
//! value corresponds to the bar at index `period - 1`; a series shorter than
//! `period` yields no values at all.

use crate::domain::price_bar::PriceBar;

/// Compute the SMA over `bars`, returning at most `count` most-recent
/// values, oldest first.
pub fn sma(bars: &[PriceBar], period: usize, count: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period {
        return Vec::new();
    }

    let mut values = Vec::with_capacity(bars.len() - period + 1);
    let mut window_sum: f64 = bars[..period].iter().map(|b| b.close).sum();
    values.push(window_sum / period as f64);

    for i in period..bars.len() {
        window_sum += bars[i].close - bars[i - period].close;
        values.push(window_sum / period as f64);
    }

    tail(values, count)
}

/// Keep the last `count` elements of `values`, preserving order.
pub(crate) fn tail<T>(mut values: Vec<T>, count: usize) -> Vec<T> {
    if values.len() > count {
        values.drain(..values.len() - count);
    }
    values
}
