//! CSV price-history adapter.
//!
//! One file per instrument at `<base>/<code>.csv` with the header
//! `date,open,high,low,close,volume,turnover` (turnover optional).

use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::domain::error::QuantbackError;
use crate::domain::price_bar::{dates_strictly_ascending, PriceBar};
use crate::ports::data_port::PriceDataPort;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }
}

fn field<'a>(record: &'a csv::StringRecord, index: usize, name: &str) -> Result<&'a str, QuantbackError> {
    record.get(index).ok_or_else(|| QuantbackError::DataSource {
        reason: format!("missing {name} column"),
    })
}

fn numeric_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, QuantbackError>
where
    T::Err: std::fmt::Display,
{
    field(record, index, name)?
        .trim()
        .parse()
        .map_err(|e| QuantbackError::DataSource {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl PriceDataPort for CsvPriceAdapter {
    fn fetch_history(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, QuantbackError> {
        let path = self.csv_path(code);
        if !path.exists() {
            // Missing file means the instrument has no history, which batch
            // callers treat as a skip, not a failure.
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| QuantbackError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| QuantbackError::DataSource {
                reason: format!("CSV parse error: {e}"),
            })?;

            let date = NaiveDate::parse_from_str(field(&record, 0, "date")?.trim(), "%Y-%m-%d")
                .map_err(|e| QuantbackError::DataSource {
                    reason: format!("invalid date format: {e}"),
                })?;
            if date < start_date || date > end_date {
                continue;
            }

            let open: f64 = numeric_field(&record, 1, "open")?;
            let high: f64 = numeric_field(&record, 2, "high")?;
            let low: f64 = numeric_field(&record, 3, "low")?;
            let close: f64 = numeric_field(&record, 4, "close")?;
            let volume: i64 = numeric_field(&record, 5, "volume")?;
            let turnover: f64 = match record.get(6) {
                Some(raw) if !raw.trim().is_empty() => {
                    raw.trim().parse().map_err(|e| QuantbackError::DataSource {
                        reason: format!("invalid turnover value: {e}"),
                    })?
                }
                _ => close * volume as f64,
            };

            bars.push(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
                turnover,
            });
        }

        bars.sort_by_key(|b| b.date);
        if !dates_strictly_ascending(&bars) {
            return Err(QuantbackError::DataSource {
                reason: format!("duplicate dates in {}", path.display()),
            });
        }
        Ok(bars)
    }

    fn list_codes(&self) -> Result<Vec<String>, QuantbackError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| QuantbackError::DataSource {
            reason: format!("failed to read directory {}: {}", self.base_path.display(), e),
        })?;

        let mut codes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| QuantbackError::DataSource {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(code) = name_str.strip_suffix(".csv") {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }
}
