//! Strategy-definition access port trait.

use crate::domain::error::QuantbackError;
use crate::domain::parameters::StrategyDefinition;

/// Strategy-config collaborator: resolves an identifier to a full runnable
/// definition (indicator parameters plus risk settings).
pub trait StrategyPort {
    fn load_strategy(&self, id: &str) -> Result<StrategyDefinition, QuantbackError>;
}
