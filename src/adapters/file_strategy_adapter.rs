//! INI strategy-definition adapter.
//!
//! Resolves a strategy id to `<base>/<id>.ini` with `[strategy]`,
//! `[parameters]` and `[risk]` sections. Unset keys take the conventional
//! defaults, so a minimal file only needs `kind`.

use std::path::PathBuf;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::QuantbackError;
use crate::domain::parameters::{
    IndicatorParameters, RiskSettings, StrategyDefinition, StrategyKind,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::strategy_port::StrategyPort;

pub struct FileStrategyAdapter {
    base_path: PathBuf,
}

impl FileStrategyAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

fn period(config: &dyn ConfigPort, key: &str, default: u32) -> Result<u32, QuantbackError> {
    let raw = config.get_int("parameters", key, default as i64);
    u32::try_from(raw).map_err(|_| QuantbackError::ConfigInvalid {
        section: "parameters".into(),
        key: key.into(),
        reason: format!("{raw} is not a valid period"),
    })
}

/// Build a [`StrategyDefinition`] from an already-parsed config source.
/// Shared by this adapter and the CLI, which embeds strategy sections in
/// its main config file.
pub fn strategy_from_config(
    name: &str,
    config: &dyn ConfigPort,
) -> Result<StrategyDefinition, QuantbackError> {
    let kind_raw =
        config
            .get_string("strategy", "kind")
            .ok_or_else(|| QuantbackError::ConfigMissing {
                section: "strategy".into(),
                key: "kind".into(),
            })?;
    let kind: StrategyKind = kind_raw
        .parse()
        .map_err(|reason| QuantbackError::ConfigInvalid {
            section: "strategy".into(),
            key: "kind".into(),
            reason,
        })?;

    let defaults = IndicatorParameters::default();
    let parameters = IndicatorParameters {
        short_period: period(config, "short_period", defaults.short_period)?,
        long_period: period(config, "long_period", defaults.long_period)?,
        fast_period: period(config, "fast_period", defaults.fast_period)?,
        slow_period: period(config, "slow_period", defaults.slow_period)?,
        signal_period: period(config, "signal_period", defaults.signal_period)?,
        rsi_period: period(config, "rsi_period", defaults.rsi_period)?,
        rsi_overbought: config.get_double("parameters", "rsi_overbought", defaults.rsi_overbought),
        rsi_oversold: config.get_double("parameters", "rsi_oversold", defaults.rsi_oversold),
        bollinger_period: period(config, "bollinger_period", defaults.bollinger_period)?,
        bollinger_std_dev: config.get_double(
            "parameters",
            "bollinger_std_dev",
            defaults.bollinger_std_dev,
        ),
    };
    parameters.validate()?;

    let risk_defaults = RiskSettings::default();
    let risk = RiskSettings {
        max_position_pct: config.get_double("risk", "max_position_pct", risk_defaults.max_position_pct),
        stop_loss_pct: config.get_double("risk", "stop_loss_pct", risk_defaults.stop_loss_pct),
        take_profit_pct: config.get_double("risk", "take_profit_pct", risk_defaults.take_profit_pct),
    };

    Ok(StrategyDefinition {
        name: config
            .get_string("strategy", "name")
            .unwrap_or_else(|| name.to_string()),
        kind,
        parameters,
        risk,
        initial_capital: config.get_double("strategy", "initial_capital", 100_000.0),
    })
}

impl StrategyPort for FileStrategyAdapter {
    fn load_strategy(&self, id: &str) -> Result<StrategyDefinition, QuantbackError> {
        let path = self.base_path.join(format!("{id}.ini"));
        let config =
            FileConfigAdapter::from_file(&path).map_err(|e| QuantbackError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
        strategy_from_config(id, &config)
    }
}
