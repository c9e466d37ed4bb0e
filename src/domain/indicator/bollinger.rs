//! Bollinger Bands.
//!
//! Middle = SMA over `period`; band width = multiplier × population standard
//! deviation (divides by N) of the same window; upper/lower = middle ± band.

use crate::domain::indicator::sma::tail;
use crate::domain::price_bar::PriceBar;

/// One Bollinger Band observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBand {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Compute Bollinger Bands, at most `count` most-recent values, oldest
/// first. Empty when the series is shorter than `period`.
pub fn bollinger(
    bars: &[PriceBar],
    period: usize,
    std_dev_multiplier: f64,
    count: usize,
) -> Vec<BollingerBand> {
    if period == 0 || bars.len() < period {
        return Vec::new();
    }

    let mut bands = Vec::with_capacity(bars.len() - period + 1);
    for window in bars.windows(period) {
        let middle = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|b| {
                let diff = b.close - middle;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        let band = std_dev_multiplier * variance.sqrt();

        bands.push(BollingerBand {
            upper: middle + band,
            middle,
            lower: middle - band,
        });
    }

    tail(bands, count)
}
