//! INI file configuration adapter.

use configparser::ini::Ini;
use std::path::Path;

use crate::ports::config_port::ConfigPort;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
[data]
csv_dir = ./history

[backtest]
initial_capital = 100000
codes = 600519, 000858
dry_run = false

[strategy]
kind = ma
short_period = 5
";

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn from_file_reads_values() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();

        assert_eq!(
            adapter.get_string("data", "csv_dir"),
            Some("./history".to_string())
        );
        assert_eq!(adapter.get_int("strategy", "short_period", 0), 5);
    }

    #[test]
    fn from_string_reads_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("strategy", "kind"), Some("ma".to_string()));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("backtest", "lot_size", 100), 100);
        assert!((adapter.get_double("execution", "commission_rate", 0.0003) - 0.0003).abs() < 1e-12);
        assert!(adapter.get_bool("backtest", "verbose", true));
        assert_eq!(adapter.get_string("nowhere", "nothing"), None);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[flags]\na = yes\nb = 0\nc = True\nd = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("flags", "a", false));
        assert!(!adapter.get_bool("flags", "b", true));
        assert!(adapter.get_bool("flags", "c", false));
        // Unparseable values fall back to the default.
        assert!(adapter.get_bool("flags", "d", true));
    }

    #[test]
    fn double_parses() {
        let adapter =
            FileConfigAdapter::from_string("[execution]\ncommission_rate = 0.0005\n").unwrap();
        assert!(
            (adapter.get_double("execution", "commission_rate", 0.0) - 0.0005).abs() < 1e-12
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(FileConfigAdapter::from_file("/nonexistent/quantback.ini").is_err());
    }
}
