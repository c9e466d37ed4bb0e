//! Exponential Moving Average.
//!
//! α = 2/(period+1), seeded with the simple average of the first `period`
//! closes, then `ema[i] = close[i]·α + ema[i-1]·(1-α)`.

use crate::domain::indicator::sma::tail;
use crate::domain::price_bar::PriceBar;

/// Compute the EMA of closing prices, at most `count` most-recent values,
/// oldest first. Empty when the series is shorter than `period`.
pub fn ema(bars: &[PriceBar], period: usize, count: usize) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    ema_values(&closes, period, count)
}

/// EMA over an arbitrary value sequence. The MACD signal line is the EMA of
/// the MACD line itself, so this needs to work on more than raw closes.
pub fn ema_values(values: &[f64], period: usize, count: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);

    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out.push(ema);

    for &value in &values[period..] {
        ema = value * alpha + ema * (1.0 - alpha);
        out.push(ema);
    }

    tail(out, count)
}
