//! Concrete adapter implementations for the collaborator ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod file_strategy_adapter;
pub mod json_store_adapter;
