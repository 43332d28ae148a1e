//! Download timetable documents.

use std::time::Duration;

use async_trait::async_trait;

use super::TimetableError;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches a document by URL and returns its bytes.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TimetableError>;
}

/// Reqwest-based fetcher. Relative URLs are resolved against `base_url` when set.
pub struct ReqwestFetcher {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self, TimetableError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TimetableError::Fetch(e.to_string()))?;
        Ok(Self {
            client,
            base_url: None,
        })
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url.filter(|b| !b.trim().is_empty());
        self
    }

    fn resolve(&self, url: &str) -> Result<String, TimetableError> {
        let url = url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(url.to_string());
        }
        match &self.base_url {
            Some(base) => Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            )),
            None => Err(TimetableError::Fetch(format!(
                "relative timetable url without a base url: {}",
                url
            ))),
        }
    }
}

#[async_trait]
impl DocumentFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TimetableError> {
        let url = self.resolve(url)?;
        tracing::debug!(url = %url, "fetching timetable document");
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TimetableError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| TimetableError::Fetch(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| TimetableError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
