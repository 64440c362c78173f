//! Bridge to the remote chat-summary store.
//!
//! Summaries are namespaced by clerk, project and chat type. Fetch failures
//! degrade to "no prior summary"; push results are reported as a
//! [`SaveOutcome`] for the caller to log.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CounselError;
use crate::provider::http::{shared_client, status_to_error};
use crate::util::retry::RetryPolicy;

/// Namespace of one stored summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryKey {
    pub clerk_id: String,
    pub project_id: String,
    pub chat_type: String,
}

impl SummaryKey {
    pub fn new(
        clerk_id: impl Into<String>,
        project_id: impl Into<String>,
        chat_type: impl Into<String>,
    ) -> Self {
        Self {
            clerk_id: clerk_id.into(),
            project_id: project_id.into(),
            chat_type: chat_type.into(),
        }
    }

    fn segments(&self) -> [&str; 3] {
        [self.clerk_id.as_str(), self.project_id.as_str(), self.chat_type.as_str()]
    }
}

/// Result of pushing a summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed { reason: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Storage for per-namespace summary text.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// The stored summary, or `None` when absent or unreachable.
    async fn fetch(&self, key: &SummaryKey) -> Option<String>;

    async fn push(&self, key: &SummaryKey, summary: &str) -> SaveOutcome;
}

#[derive(Debug, Serialize, Deserialize)]
struct SummaryBody {
    content: String,
}

/// HTTP client for the summary service.
///
/// - `GET {base}/{clerk}/{project}/{chat_type}` → `{"content": ...}`
/// - `PUT {base}/save-type-summary/{clerk}/{project}/{chat_type}` with `{"content": ...}`
#[derive(Debug, Clone)]
pub struct HttpSummaryStore {
    base_url: reqwest::Url,
    retry: RetryPolicy,
}

impl HttpSummaryStore {
    pub fn new(base_url: &str) -> Result<Self, CounselError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| CounselError::Configuration(format!("invalid summary API base {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CounselError::Configuration(format!(
                "summary API base cannot carry a path: {base_url}"
            )));
        }
        Ok(Self {
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, prefix: Option<&str>, key: &SummaryKey) -> Result<reqwest::Url, CounselError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CounselError::Configuration("summary API base cannot carry a path".into()))?;
            segments.pop_if_empty();
            segments.extend(prefix);
            segments.extend(key.segments());
        }
        Ok(url)
    }

    async fn fetch_once(&self, url: &reqwest::Url) -> Result<String, CounselError> {
        let response = shared_client().get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }
        let body: SummaryBody = response.json().await?;
        Ok(body.content)
    }

    async fn push_once(&self, url: &reqwest::Url, summary: &str) -> Result<(), CounselError> {
        let body = SummaryBody {
            content: summary.to_string(),
        };
        let response = shared_client().put(url.clone()).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &text));
        }
        Ok(())
    }
}

#[async_trait]
impl SummaryStore for HttpSummaryStore {
    async fn fetch(&self, key: &SummaryKey) -> Option<String> {
        let url = match self.url(None, key) {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(error = %error, "cannot build summary fetch URL");
                return None;
            }
        };
        match self.retry.execute("summary_fetch", || self.fetch_once(&url)).await {
            Ok(content) if !content.trim().is_empty() => Some(content),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(
                    clerk_id = %key.clerk_id,
                    project_id = %key.project_id,
                    chat_type = %key.chat_type,
                    error = %error,
                    "summary fetch failed; continuing without prior summary"
                );
                None
            }
        }
    }

    async fn push(&self, key: &SummaryKey, summary: &str) -> SaveOutcome {
        let result = match self.url(Some("save-type-summary"), key) {
            Ok(url) => self.push_once(&url, summary).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(()) => SaveOutcome::Saved,
            Err(error) => SaveOutcome::Failed {
                reason: error.to_string(),
            },
        }
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemorySummaryStore {
    entries: Mutex<HashMap<SummaryKey, String>>,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SummaryKey) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: SummaryKey, summary: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, summary.into());
    }
}

#[async_trait]
impl SummaryStore for InMemorySummaryStore {
    async fn fetch(&self, key: &SummaryKey) -> Option<String> {
        self.get(key)
    }

    async fn push(&self, key: &SummaryKey, summary: &str) -> SaveOutcome {
        self.insert(key.clone(), summary);
        SaveOutcome::Saved
    }
}
