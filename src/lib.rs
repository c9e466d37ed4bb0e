//! quantback — quantitative strategy backtesting and parameter optimization.
//!
//! Hexagonal architecture: engine logic in [`domain`], collaborator port
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
