//! Moving-average crossover detection.
//!
//! Compares the short and long SMA on the last two bars. A golden cross
//! means the short average was at or below the long one and is now above;
//! a death cross is the mirror. Both are false when the series is too short
//! to produce two values of the long average.

use crate::domain::indicator::sma::sma;
use crate::domain::price_bar::PriceBar;

/// Crossover classification for the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crossover {
    pub golden: bool,
    pub death: bool,
}

pub fn detect_crossover(bars: &[PriceBar], short_period: usize, long_period: usize) -> Crossover {
    let short_ma = sma(bars, short_period, 2);
    let long_ma = sma(bars, long_period, 2);

    if short_ma.len() < 2 || long_ma.len() < 2 {
        return Crossover::default();
    }

    Crossover {
        golden: short_ma[0] <= long_ma[0] && short_ma[1] > long_ma[1],
        death: short_ma[0] >= long_ma[0] && short_ma[1] < long_ma[1],
    }
}
