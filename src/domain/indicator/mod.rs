//! Technical indicators.
//!
//! All functions are pure: they take a bar series plus parameters and return
//! values aligned to the tail of the series (oldest first, at most `count`
//! entries). A series too short for the requested window yields an empty
//! result, never an error — callers treat absence as "no actionable output".

pub mod sma;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod bollinger;
pub mod crossover;

pub use bollinger::{bollinger, BollingerBand};
pub use crossover::{detect_crossover, Crossover};
pub use ema::{ema, ema_values};
pub use macd::{macd, MacdPoint};
pub use rsi::rsi;
pub use sma::sma;
