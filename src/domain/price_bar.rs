//! Daily price bar representation.

use chrono::NaiveDate;

/// One trading day of price history for a single instrument.
///
/// Bars arrive from a data collaborator ordered by date ascending; the
/// engine never mutates them.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub turnover: f64,
}

impl PriceBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// True when every bar's date is strictly greater than its predecessor's.
pub fn dates_strictly_ascending(bars: &[PriceBar]) -> bool {
    bars.windows(2).all(|w| w[0].date < w[1].date)
}
