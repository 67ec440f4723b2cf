//! Domain error types.

use chrono::NaiveDate;

/// Rejection of a daily-bar sequence or generator parameter before generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("lookback length must be at least 1, got {0}")]
    InvalidLength(usize),

    #[error("non-finite {field} price {value} on {date}")]
    NonFinitePrice {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("dates must be strictly increasing: bar {index} on {current} follows {previous}")]
    NonMonotonicDate {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

/// Top-level error type for shinneashi.
#[derive(Debug, thiserror::Error)]
pub enum ShinneError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("data query error: {reason}")]
    DataQuery { reason: String },

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

    #[error("invalid input for {symbol}: {source}")]
    InvalidInput {
        symbol: String,
        #[source]
        source: InputError,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("report error for {path}: {reason}")]
    Report { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShinneError {
    pub fn invalid_input(symbol: &str, source: InputError) -> Self {
        ShinneError::InvalidInput {
            symbol: symbol.to_string(),
            source,
        }
    }

    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            ShinneError::Io(_) | ShinneError::Report { .. } => 1,
            ShinneError::ConfigParse { .. }
            | ShinneError::ConfigMissing { .. }
            | ShinneError::ConfigInvalid { .. } => 2,
            ShinneError::DataSource { .. } | ShinneError::DataQuery { .. } => 3,
            ShinneError::InvalidInput { .. } => 4,
            ShinneError::NoData { .. } => 5,
        }
    }
}

impl From<&ShinneError> for std::process::ExitCode {
    fn from(err: &ShinneError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
