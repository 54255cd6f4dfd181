use async_trait::async_trait;
use quiz_core::model::SourceId;
use std::path::PathBuf;

use crate::source::{QuestionSource, SourceError};

/// Reads sources from a directory on disk.
#[derive(Clone, Debug)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of `id` below the root; absolute ids are used as-is.
    #[must_use]
    pub fn resolve(&self, id: &SourceId) -> PathBuf {
        self.root.join(id.as_str())
    }
}

#[async_trait]
impl QuestionSource for FileSource {
    async fn fetch(&self, id: &SourceId) -> Result<String, SourceError> {
        let path = self.resolve(id);
        tracing::debug!(path = %path.display(), "reading question source");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SourceError::unavailable(id, e))
    }
}
