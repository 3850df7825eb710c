//! Domain error types.

/// Problems with the price or signal series that stop a run before it starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("{series} series is missing required column '{column}'")]
    MissingColumn { series: String, column: String },

    #[error("{series} series row {row}: cannot parse timestamp '{value}'")]
    InvalidTimestamp {
        series: String,
        row: usize,
        value: String,
    },

    #[error("{series} series row {row}: invalid {column} value '{value}'")]
    InvalidNumber {
        series: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{series} series has duplicate timestamp {timestamp}")]
    DuplicateTimestamp { series: String, timestamp: String },

    #[error("signal series row {row}: size must be positive, got {value}")]
    InvalidSize { row: usize, value: f64 },
}

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error(transparent)]
    Input(#[from] InputError),

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

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for TradesimError {
    fn from(err: csv::Error) -> Self {
        TradesimError::Csv {
            reason: err.to_string(),
        }
    }
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) | TradesimError::Csv { .. } => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::Input(_) => 3,
        };
        std::process::ExitCode::from(code)
    }
}
