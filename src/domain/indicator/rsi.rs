//! RSI (Relative Strength Index).
//!
//! Simple averages of up-moves and down-moves over the trailing `period`
//! price changes, re-seeded each window (no Wilder smoothing).
//! RS = avg_gain / avg_loss; RSI = 100 − 100/(1+RS); avg_loss = 0 ⇒ RSI = 100.

use crate::domain::indicator::sma::tail;
use crate::domain::price_bar::PriceBar;

/// Compute the RSI, at most `count` most-recent values, oldest first.
///
/// The first value needs `period` price changes, so a series of fewer than
/// `period + 1` bars yields nothing.
pub fn rsi(bars: &[PriceBar], period: usize, count: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period + 1 {
        return Vec::new();
    }

    let mut gains = Vec::with_capacity(bars.len() - 1);
    let mut losses = Vec::with_capacity(bars.len() - 1);
    for w in bars.windows(2) {
        let change = w[1].close - w[0].close;
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut gain_sum: f64 = gains[..period].iter().sum();
    let mut loss_sum: f64 = losses[..period].iter().sum();

    let mut values = Vec::with_capacity(gains.len() - period + 1);
    values.push(rsi_from_sums(gain_sum, loss_sum));

    for i in period..gains.len() {
        gain_sum += gains[i] - gains[i - period];
        loss_sum += losses[i] - losses[i - period];
        values.push(rsi_from_sums(gain_sum, loss_sum));
    }

    tail(values, count)
}

fn rsi_from_sums(gain_sum: f64, loss_sum: f64) -> f64 {
    if loss_sum == 0.0 {
        return 100.0;
    }
    let rs = gain_sum / loss_sum;
    100.0 - 100.0 / (1.0 + rs)
}
