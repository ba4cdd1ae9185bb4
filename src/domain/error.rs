//! Domain error types.

use std::fmt;

/// Pipeline stage that was running when a per-ticker failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Signals,
    Accumulate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Signals => "signal generation",
            Stage::Accumulate => "portfolio accumulation",
        };
        f.write_str(name)
    }
}

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
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

    #[error("unknown config key [{section}] {key}")]
    UnknownConfigKey { section: String, key: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("no strategies configured")]
    NoStrategies,

    #[error("price history is missing required column {column}")]
    MissingColumn { column: String },

    #[error("invalid price record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("duplicate price for {ticker} on {date}")]
    DuplicateDate { ticker: String, date: chrono::NaiveDate },

    #[error("non-finite close {close} for {ticker} on {date}")]
    NonFiniteClose {
        ticker: String,
        date: chrono::NaiveDate,
        close: f64,
    },

    #[error("trade for {ticker} on {date} has no price")]
    UnpricedTrade { ticker: String, date: chrono::NaiveDate },

    #[error("ticker filter yields an empty universe")]
    EmptyUniverse,

    #[error("{stage} failed for {ticker}: {source}")]
    Stage {
        stage: Stage,
        ticker: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("strategy {name} failed: {source}")]
    Strategy {
        name: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Wrap an error with the stage and ticker it occurred in.
    pub fn at(self, stage: Stage, ticker: &str) -> Self {
        EngineError::Stage {
            stage,
            ticker: ticker.to_string(),
            source: Box::new(self),
        }
    }

    /// Wrap an error with the name of the strategy whose run raised it.
    pub fn for_strategy(self, name: &str) -> Self {
        EngineError::Strategy {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    pub fn is_config(&self) -> bool {
        if let EngineError::Strategy { source, .. } = self {
            return source.is_config();
        }
        matches!(
            self,
            EngineError::ConfigParse { .. }
                | EngineError::ConfigMissing { .. }
                | EngineError::ConfigInvalid { .. }
                | EngineError::UnknownConfigKey { .. }
                | EngineError::UnknownStrategy { .. }
                | EngineError::NoStrategies
        )
    }

    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) | EngineError::Csv(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. }
            | EngineError::UnknownConfigKey { .. }
            | EngineError::UnknownStrategy { .. }
            | EngineError::NoStrategies => 2,
            EngineError::MissingColumn { .. }
            | EngineError::InvalidRecord { .. }
            | EngineError::DuplicateDate { .. }
            | EngineError::NonFiniteClose { .. }
            | EngineError::UnpricedTrade { .. }
            | EngineError::EmptyUniverse => 5,
            EngineError::Stage { .. } => 6,
            EngineError::Strategy { source, .. } => return Self::from(source.as_ref()),
        };
        std::process::ExitCode::from(code)
    }
}
