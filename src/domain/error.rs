//! Domain error types.

/// Top-level error type for spotbot.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
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

    #[error("market data error for {symbol}: {reason}")]
    Feed { symbol: String, reason: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("execution error for {symbol}: {reason}")]
    Execution { symbol: String, reason: String },

    #[error("trade ledger error: {reason}")]
    Ledger { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    /// Errors that skip a strategy for one tick rather than stopping the loop.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TraderError::Feed { .. } | TraderError::InsufficientData { .. }
        )
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Feed { .. } | TraderError::InsufficientData { .. } => 5,
            TraderError::Execution { .. } => 6,
            TraderError::Ledger { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
