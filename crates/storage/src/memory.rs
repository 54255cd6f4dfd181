use async_trait::async_trait;
use quiz_core::model::SourceId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::source::{QuestionSource, SourceError};

/// Simple in-memory source for testing and embedding.
///
/// Sources registered with `fail` report `Unavailable`, as does any id that
/// was never inserted.
#[derive(Clone, Default)]
pub struct InMemorySource {
    texts: Arc<Mutex<HashMap<SourceId, String>>>,
    failing: Arc<Mutex<HashSet<SourceId>>>,
    fetches: Arc<Mutex<Vec<SourceId>>>,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` under `id`, replacing any previous content.
    pub fn insert(&self, id: SourceId, text: impl Into<String>) {
        if let Ok(mut guard) = self.texts.lock() {
            guard.insert(id, text.into());
        }
    }

    /// Make every fetch of `id` fail.
    pub fn fail(&self, id: SourceId) {
        if let Ok(mut guard) = self.failing.lock() {
            guard.insert(id);
        }
    }

    /// Ids fetched so far, in call order.
    #[must_use]
    pub fn fetched(&self) -> Vec<SourceId> {
        self.fetches
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QuestionSource for InMemorySource {
    async fn fetch(&self, id: &SourceId) -> Result<String, SourceError> {
        self.fetches
            .lock()
            .map_err(|e| SourceError::unavailable(id, e))?
            .push(id.clone());

        let failing = self
            .failing
            .lock()
            .map_err(|e| SourceError::unavailable(id, e))?
            .contains(id);
        if failing {
            return Err(SourceError::unavailable(id, "simulated failure"));
        }

        let guard = self
            .texts
            .lock()
            .map_err(|e| SourceError::unavailable(id, e))?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::unavailable(id, "not found"))
    }
}
