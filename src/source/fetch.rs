use crate::core::{MirrorError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches raw text from the upstream sources.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher over `reqwest`. No retries: a failed request fails the
/// dataset it belongs to.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MirrorError::Source(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        info!(url, "Fetching");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!(url, bytes = body.len(), "Fetched");
        Ok(body)
    }
}
