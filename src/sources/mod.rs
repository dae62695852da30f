mod fetch;
mod live;
mod sample;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use live::{build_live_record, url_digest, LiveSource};
pub use sample::{enrich, RawRecord, SampleError, SampleSource};

use crate::config::{Config, ScrapeMode};
use crate::record::PostRecord;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// A producer of canonical records.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Identifier used in logs.
    fn source_id(&self) -> &'static str;

    /// Load anything the source needs before the first URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the source can't serve any URL at all.
    async fn prepare(&self) -> Result<(), ScrapeError> {
        Ok(())
    }

    /// Produce the record for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source has no record for the URL. Sources that
    /// represent failures in-band return `Ok` with an error record instead.
    async fn scrape(&self, url: &str) -> Result<PostRecord, ScrapeError>;
}

/// Routes every URL to the source chosen at construction.
pub struct PostScraper {
    source: Box<dyn PostSource>,
}

impl PostScraper {
    #[must_use]
    pub fn new(source: Box<dyn PostSource>) -> Self {
        Self { source }
    }

    /// Build the scraper for the configured mode.
    #[must_use]
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let source: Box<dyn PostSource> = match config.mode {
            ScrapeMode::Sample => Box::new(SampleSource::new(
                config.sample_file.clone(),
                config.max_comments,
            )),
            ScrapeMode::Live => Box::new(LiveSource::new(
                fetcher,
                config.request_timeout,
                config.user_agent.clone(),
            )),
        };
        Self::new(source)
    }

    #[must_use]
    pub fn source_id(&self) -> &'static str {
        self.source.source_id()
    }

    /// Prepare the underlying source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unusable, e.g. an unreadable corpus.
    pub async fn prepare(&self) -> Result<(), ScrapeError> {
        self.source.prepare().await
    }

    /// Scrape a single post URL.
    ///
    /// # Errors
    ///
    /// Propagates the source's error unchanged.
    pub async fn scrape(&self, url: &str) -> Result<PostRecord, ScrapeError> {
        debug!(url = %url, source = self.source_id(), "Dispatching scrape");
        self.source.scrape(url).await
    }
}
