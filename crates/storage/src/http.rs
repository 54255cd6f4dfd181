use async_trait::async_trait;
use quiz_core::model::SourceId;
use reqwest::Client;
use url::Url;

use crate::source::{QuestionSource, SourceError};

/// Fetches sources over HTTP, resolving ids against a base URL.
///
/// No timeout or retry is configured beyond the client defaults.
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: Client,
    base_url: Url,
}

impl HttpSource {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url: directory_url(base_url),
        }
    }

    /// Absolute URL for `id`; absolute ids are used as-is.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Unavailable` if the id cannot be joined onto the base.
    pub fn resolve(&self, id: &SourceId) -> Result<Url, SourceError> {
        self.base_url
            .join(id.as_str())
            .map_err(|e| SourceError::unavailable(id, e))
    }
}

// `Url::join` drops the last path segment unless the base ends with a slash.
fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl QuestionSource for HttpSource {
    async fn fetch(&self, id: &SourceId) -> Result<String, SourceError> {
        let url = self.resolve(id)?;
        tracing::debug!(%url, "fetching question source");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::unavailable(id, e))?;

        if !response.status().is_success() {
            return Err(SourceError::unavailable(
                id,
                format!("request failed with status {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::unavailable(id, e))
    }
}
