#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;

use quantback::domain::error::QuantbackError;
use quantback::domain::parameters::{
    IndicatorParameters, RiskSettings, StrategyDefinition, StrategyKind,
};
pub use quantback::domain::price_bar::PriceBar;
use quantback::ports::data_port::PriceDataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_history(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, QuantbackError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(QuantbackError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_codes(&self) -> Result<Vec<String>, QuantbackError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Bars on consecutive days starting 2024-01-01, flat OHLC at the close.
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: date(2024, 1, 1) + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10_000,
            turnover: close * 10_000.0,
        })
        .collect()
}

/// Closes rising 1% per bar from 100.
pub fn rising_closes(len: usize) -> Vec<f64> {
    (0..len).map(|i| 100.0 * 1.01f64.powi(i as i32)).collect()
}

/// A pullback shape: rally, controlled decline, stronger recovery. Produces
/// one death cross during the decline and one golden cross on the recovery
/// for a 5/20 moving-average pair.
pub fn pullback_closes() -> Vec<f64> {
    let mut closes = Vec::new();
    for i in 0..20 {
        closes.push(100.0 + i as f64);
    }
    for i in 0..10 {
        closes.push(118.0 - 3.0 * i as f64);
    }
    for i in 0..30 {
        closes.push(92.0 + 2.5 * i as f64);
    }
    closes
}

pub fn ma_strategy(initial_capital: f64) -> StrategyDefinition {
    StrategyDefinition {
        name: "ma crossover".into(),
        kind: StrategyKind::Ma,
        parameters: IndicatorParameters::default(),
        risk: RiskSettings {
            max_position_pct: 100.0,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
        },
        initial_capital,
    }
}
