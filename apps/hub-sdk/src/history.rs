//! History backfill over the HTTP API.

use async_trait::async_trait;

use gamerhub_common::wire::WireMessage;
use gamerhub_common::normalize_slug;

/// Source of a community's message backlog. The hub controller depends on
/// this trait rather than the concrete loader so tests can stage backlogs
/// and response latencies.
#[async_trait]
pub trait HistoryFetch: Send + Sync {
    /// The community's backlog, oldest first. Failures degrade to an empty
    /// backlog; the live stream keeps working either way.
    async fn fetch(&self, slug: &str) -> Vec<WireMessage>;
}

/// Fetches history from `GET /api/v1/messages/{community}`.
pub struct HistoryLoader {
    client: reqwest::Client,
    api_url: String,
}

impl HistoryLoader {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl HistoryFetch for HistoryLoader {
    async fn fetch(&self, slug: &str) -> Vec<WireMessage> {
        let slug = normalize_slug(slug);
        let url = format!("{}/api/v1/messages/{}", self.api_url, slug);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, %slug, "history request failed");
                return Vec::new();
            }
        };

        match response.error_for_status() {
            Ok(response) => match response.json::<Vec<WireMessage>>().await {
                Ok(messages) => messages,
                Err(error) => {
                    tracing::warn!(%error, %slug, "history response was not valid");
                    Vec::new()
                }
            },
            Err(error) => {
                tracing::warn!(%error, %slug, "history request returned an error status");
                Vec::new()
            }
        }
    }
}
