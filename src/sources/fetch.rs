use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("HTTP request failed with status {status}")]
    Status { status: reqwest::StatusCode },
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// Outbound page fetch used by live mode.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, connection failure, or a non-success status.
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<String, FetchError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        debug!(url = %url, status = %status, "Fetched page");
        response.text().await.map_err(FetchError::Body)
    }
}
