//! Engine error types.
//!
//! Only structurally invalid configuration is fatal. Degraded computation
//! (short series, empty instrument history in a batch, zero-variance
//! returns) produces empty or zero results instead of an error.

/// Top-level error type for quantback.
#[derive(Debug, thiserror::Error)]
pub enum QuantbackError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid range {name}: {reason}")]
    InvalidRange { name: String, reason: String },

    #[error("no price history for {code}")]
    NoData { code: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("result store error: {reason}")]
    Store { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&QuantbackError> for std::process::ExitCode {
    fn from(err: &QuantbackError) -> Self {
        let code: u8 = match err {
            QuantbackError::Io(_) => 1,
            QuantbackError::ConfigParse { .. }
            | QuantbackError::ConfigMissing { .. }
            | QuantbackError::ConfigInvalid { .. } => 2,
            QuantbackError::InvalidParameter { .. } | QuantbackError::InvalidRange { .. } => 3,
            QuantbackError::NoData { .. } | QuantbackError::DataSource { .. } => 4,
            QuantbackError::Store { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
