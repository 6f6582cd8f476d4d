//! Domain error types.

/// Top-level error type for profithigh.
#[derive(Debug, thiserror::Error)]
pub enum ProfitHighError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("no price data for {symbol}")]
    DataUnavailable { symbol: String },

    #[error("malformed data file: {reason}")]
    MalformedFile { reason: String },

    #[error("unrecognised date: {value:?}")]
    MalformedDate { value: String },

    #[error("invalid buy price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProfitHighError {
    /// Whether a price fetch that failed with this error is worth repeating.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProfitHighError::Database { .. }
                | ProfitHighError::DatabaseQuery { .. }
                | ProfitHighError::Io(_)
        )
    }
}

impl From<&ProfitHighError> for std::process::ExitCode {
    fn from(err: &ProfitHighError) -> Self {
        let code: u8 = match err {
            ProfitHighError::Io(_) => 1,
            ProfitHighError::ConfigParse { .. }
            | ProfitHighError::ConfigMissing { .. }
            | ProfitHighError::ConfigInvalid { .. } => 2,
            ProfitHighError::Database { .. } | ProfitHighError::DatabaseQuery { .. } => 3,
            ProfitHighError::DataUnavailable { .. }
            | ProfitHighError::MalformedFile { .. }
            | ProfitHighError::MalformedDate { .. }
            | ProfitHighError::InvalidPrice { .. } => 5,
            ProfitHighError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
