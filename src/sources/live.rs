//! Live mode: a best-effort metadata fallback built from the fetched page.
//!
//! Only page-level OpenGraph data and the `<title>` element are read. Authors,
//! counts, comments and videos can't be recovered this way and are left empty.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use tracing::{debug, error, info};

use super::fetch::Fetcher;
use super::{PostSource, ScrapeError};
use crate::metadata::{HtmlDocument, PageMetadata};
use crate::record::{PostRecord, RecordSource};

/// Length of the synthetic `post_id` taken from the URL digest.
const POST_ID_LEN: usize = 12;

pub struct LiveSource {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    user_agent: String,
}

impl LiveSource {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            timeout,
            user_agent: user_agent.into(),
        }
    }

    /// Fetch `url` and build a record. Transport failures become error records.
    pub async fn fetch_record(&self, url: &str) -> PostRecord {
        debug!(url = %url, timeout_secs = self.timeout.as_secs(), "Using live HTTP scraping");

        let fetched_at = Utc::now();
        match self.fetcher.fetch(url, self.timeout, &self.user_agent).await {
            Ok(html) => {
                let record = build_live_record(url, &html, fetched_at);
                info!(url = %url, "Scraped basic metadata");
                record
            }
            Err(e) => {
                error!(url = %url, error = %e, "HTTP error while fetching");
                PostRecord::error(url, e.to_string())
            }
        }
    }
}

#[async_trait]
impl PostSource for LiveSource {
    fn source_id(&self) -> &'static str {
        RecordSource::Live.as_str()
    }

    async fn scrape(&self, url: &str) -> Result<PostRecord, ScrapeError> {
        Ok(self.fetch_record(url).await)
    }
}

/// Build a live record from a fetched document.
#[must_use]
pub fn build_live_record(url: &str, html: &str, fetched_at: DateTime<Utc>) -> PostRecord {
    let metadata = PageMetadata::from_lookup(&HtmlDocument::parse(html));
    let digest = url_digest(url);

    PostRecord {
        post_id: Some(digest[..POST_ID_LEN].to_string()),
        action_id: Some(digest),
        text: metadata.text(),
        image_list: metadata.image_list(),
        ..PostRecord::blank(url, fetched_at, RecordSource::Live)
    }
}

/// Lowercase hex MD5 of the URL's UTF-8 bytes.
#[must_use]
pub fn url_digest(url: &str) -> String {
    hex::encode(Md5::digest(url.as_bytes()))
}
