//! Result persistence port trait.

use crate::domain::backtest::BacktestReport;
use crate::domain::error::QuantbackError;
use crate::domain::optimizer::OptimizationOutcome;

/// Storage collaborator. The engine returns results to its caller; whether
/// and where they land is the caller's concern behind this trait.
pub trait ResultPort {
    fn persist_backtest(&self, report: &BacktestReport) -> Result<(), QuantbackError>;

    fn persist_optimization(&self, outcome: &OptimizationOutcome) -> Result<(), QuantbackError>;
}
