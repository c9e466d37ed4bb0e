//! Trade ledger and equity curve entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

/// One executed simulated trade. Append-only: never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedTrade {
    pub code: String,
    pub trade_type: TradeType,
    pub quantity: i64,
    pub price: f64,
    pub commission: f64,
    pub amount: f64,
    pub executed_at: NaiveDate,
}

/// Total account value (cash + marked position) at one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}
