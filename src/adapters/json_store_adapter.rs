//! JSON file result store.
//!
//! Writes one pretty-printed JSON document per result under the store
//! directory. File names are derived from the report's own identity so a
//! re-run overwrites its predecessor instead of accumulating duplicates.

use std::fs;
use std::path::PathBuf;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::QuantbackError;
use crate::domain::optimizer::OptimizationOutcome;
use crate::ports::result_port::ResultPort;

pub struct JsonStoreAdapter {
    base_path: PathBuf,
}

impl JsonStoreAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn write_json(&self, file_name: &str, json: String) -> Result<(), QuantbackError> {
        fs::create_dir_all(&self.base_path).map_err(|e| QuantbackError::Store {
            reason: format!("cannot create {}: {}", self.base_path.display(), e),
        })?;
        let path = self.base_path.join(file_name);
        fs::write(&path, json).map_err(|e| QuantbackError::Store {
            reason: format!("cannot write {}: {}", path.display(), e),
        })
    }
}

impl ResultPort for JsonStoreAdapter {
    fn persist_backtest(&self, report: &BacktestReport) -> Result<(), QuantbackError> {
        let json = serde_json::to_string_pretty(report).map_err(|e| QuantbackError::Store {
            reason: format!("cannot serialize backtest report: {e}"),
        })?;
        let file_name = format!(
            "backtest_{}_{}_{}.json",
            report.code, report.start_date, report.end_date
        );
        self.write_json(&file_name, json)
    }

    fn persist_optimization(&self, outcome: &OptimizationOutcome) -> Result<(), QuantbackError> {
        let json = serde_json::to_string_pretty(outcome).map_err(|e| QuantbackError::Store {
            reason: format!("cannot serialize optimization outcome: {e}"),
        })?;
        self.write_json("optimization.json", json)
    }
}
