//! Strategy parameterization: indicator periods, risk settings, strategy kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::QuantbackError;

/// Tunable inputs for every indicator the engine computes.
///
/// Immutable once a backtest run starts; the optimizer produces fresh copies
/// rather than mutating a shared one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorParameters {
    pub short_period: u32,
    pub long_period: u32,
    pub fast_period: u32,
    pub slow_period: u32,
    pub signal_period: u32,
    pub rsi_period: u32,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub bollinger_period: u32,
    pub bollinger_std_dev: f64,
}

impl Default for IndicatorParameters {
    fn default() -> Self {
        IndicatorParameters {
            short_period: 5,
            long_period: 20,
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
        }
    }
}

impl IndicatorParameters {
    /// Structural validation: every period positive, short below long,
    /// oversold below overbought. Checked once before a run starts; the
    /// indicator functions themselves never validate.
    pub fn validate(&self) -> Result<(), QuantbackError> {
        let periods = [
            ("short_period", self.short_period),
            ("long_period", self.long_period),
            ("fast_period", self.fast_period),
            ("slow_period", self.slow_period),
            ("signal_period", self.signal_period),
            ("rsi_period", self.rsi_period),
            ("bollinger_period", self.bollinger_period),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(QuantbackError::InvalidParameter {
                    name: name.into(),
                    reason: "period must be positive".into(),
                });
            }
        }
        if self.short_period >= self.long_period {
            return Err(QuantbackError::InvalidParameter {
                name: "short_period".into(),
                reason: format!(
                    "short period {} must be less than long period {}",
                    self.short_period, self.long_period
                ),
            });
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(QuantbackError::InvalidParameter {
                name: "rsi_oversold".into(),
                reason: format!(
                    "oversold threshold {} must be below overbought threshold {}",
                    self.rsi_oversold, self.rsi_overbought
                ),
            });
        }
        if self.bollinger_std_dev <= 0.0 {
            return Err(QuantbackError::InvalidParameter {
                name: "bollinger_std_dev".into(),
                reason: "multiplier must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Closed set of signal-generation rules.
///
/// A tagged enum rather than trait objects: each kind dispatches to exactly
/// one generation function and match exhaustiveness catches a missing arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Ma,
    Macd,
    Rsi,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Ma => write!(f, "ma"),
            StrategyKind::Macd => write!(f, "macd"),
            StrategyKind::Rsi => write!(f, "rsi"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ma" => Ok(StrategyKind::Ma),
            "macd" => Ok(StrategyKind::Macd),
            "rsi" => Ok(StrategyKind::Rsi),
            other => Err(format!("unknown strategy kind '{other}'")),
        }
    }
}

/// Position-sizing and exit-trigger settings, all in percent.
///
/// A zero stop-loss or take-profit disables that trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSettings {
    pub max_position_pct: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        RiskSettings {
            max_position_pct: 10.0,
            stop_loss_pct: 5.0,
            take_profit_pct: 15.0,
        }
    }
}

/// A complete runnable strategy as returned by the strategy collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDefinition {
    pub name: String,
    pub kind: StrategyKind,
    pub parameters: IndicatorParameters,
    pub risk: RiskSettings,
    pub initial_capital: f64,
}

impl StrategyDefinition {
    /// Copy an optimized parameter set onto this definition.
    ///
    /// A pure data overwrite; no re-validation beyond the types themselves.
    pub fn apply_parameters(&mut self, parameters: &IndicatorParameters) {
        self.parameters = parameters.clone();
    }
}
