use async_trait::async_trait;
use quiz_core::model::SourceId;
use thiserror::Error;

/// Errors surfaced while fetching or parsing a question source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceError {
    #[error("source {source_id} is unavailable: {reason}")]
    Unavailable { source_id: SourceId, reason: String },

    #[error("malformed record in {source_id} at line {line}: {reason}")]
    MalformedRecord {
        source_id: SourceId,
        line: usize,
        reason: String,
    },
}

impl SourceError {
    pub(crate) fn unavailable(source_id: &SourceId, reason: impl ToString) -> Self {
        Self::Unavailable {
            source_id: source_id.clone(),
            reason: reason.to_string(),
        }
    }

    /// Identifier of the source that failed.
    #[must_use]
    pub fn source_id(&self) -> &SourceId {
        match self {
            Self::Unavailable { source_id, .. } | Self::MalformedRecord { source_id, .. } => {
                source_id
            }
        }
    }
}

/// Retrieves the raw text of a data source.
///
/// Implementations report every failure (missing file, network error,
/// non-success status) as `SourceError::Unavailable`.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the full text of `id`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Unavailable` if the source cannot be read.
    async fn fetch(&self, id: &SourceId) -> Result<String, SourceError>;
}
