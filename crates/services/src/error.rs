//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::GradingError;
use quiz_core::model::{SelectionError, SessionSummaryError};
use storage::SourceError;

/// Errors emitted by `BankLoader`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("select at least one unit")]
    NoUnitsSelected,
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors emitted by `QuizSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("no session in progress")]
    NotStarted,
    #[error("session already completed")]
    Completed,
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}

/// Errors emitted by `QuizController`.
///
/// Every variant is recoverable: the user may fix the input and retry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("select at least one unit")]
    NoUnitsSelected,
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
    #[error(transparent)]
    Source(SourceError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl QuizError {
    /// True for fetch failures (missing file, network error, bad status).
    #[must_use]
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, QuizError::Source(SourceError::Unavailable { .. }))
    }

    /// True when a source contained a line that is not a valid question.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, QuizError::Source(SourceError::MalformedRecord { .. }))
    }
}

impl From<LoadError> for QuizError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NoUnitsSelected => QuizError::NoUnitsSelected,
            LoadError::Source(source) => QuizError::Source(source),
        }
    }
}

/// Errors emitted while reading the units catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog lists no units")]
    NoUnits,
    #[error("unit {0} is listed more than once")]
    DuplicateUnit(String),
    #[error("default count must be > 0")]
    InvalidDefaultCount,
    #[error("invalid data root {raw}: {reason}")]
    InvalidDataRoot { raw: String, reason: String },
}
