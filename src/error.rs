//! Error types shared across the crate

use std::io;

use thiserror::Error;

/// Result type for aggregation, storage and medal operations
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors that can occur while processing logs or evaluating medals
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("cannot derive server identity from {0}")]
    MissingIdentity(String),
    #[error("invalid steam id: {0}")]
    InvalidSteamId(String),
}

impl StatsError {
    /// Errors that only disqualify the file being processed.
    ///
    /// Everything else is fatal for the whole run.
    pub fn is_file_scoped(&self) -> bool {
        matches!(
            self,
            StatsError::MissingIdentity(_) | StatsError::InvalidSteamId(_)
        )
    }
}

/// A log line that could not be turned into an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {line}")]
pub struct ParseError {
    pub reason: String,
    pub line: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>, line: &str) -> Self {
        Self {
            reason: reason.into(),
            line: line.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_scoped_classification() {
        assert!(StatsError::MissingIdentity("server.log".into()).is_file_scoped());
        assert!(StatsError::InvalidSteamId("nope".into()).is_file_scoped());
        assert!(!StatsError::Config("bad".into()).is_file_scoped());
        assert!(!StatsError::Sqlite(rusqlite::Error::QueryReturnedNoRows).is_file_scoped());
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("missing timestamp", "garbage");
        assert_eq!(err.to_string(), "missing timestamp: garbage");
    }
}
