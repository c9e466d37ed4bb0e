//! Price-history access port trait.

use chrono::NaiveDate;

use crate::domain::error::QuantbackError;
use crate::domain::price_bar::PriceBar;

/// Market-data collaborator. Implementations return bars ordered by date
/// ascending; an empty result means the instrument cannot be backtested in
/// the requested window and callers skip it rather than fail a batch.
pub trait PriceDataPort {
    fn fetch_history(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, QuantbackError>;

    fn list_codes(&self) -> Result<Vec<String>, QuantbackError>;
}
