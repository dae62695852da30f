//! Batch driver: read the input list, scrape each URL in order, fan records out.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::export::ExportSink;
use crate::sources::PostScraper;

/// Outcome of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs that produced a record, error records included.
    pub succeeded: usize,
    pub total: usize,
}

impl RunSummary {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.succeeded, self.total)
    }
}

/// Parse an input list: one URL per line, blank lines and `#` comments skipped.
#[must_use]
pub fn parse_inputs(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Read and parse the input list at `path`.
///
/// # Errors
///
/// Returns an error if the file can't be read.
pub async fn load_inputs(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    Ok(parse_inputs(&contents))
}

/// Scrape every URL in order and hand each record to every sink.
///
/// A failed URL is logged and skipped; the batch always runs to the end.
pub async fn run_batch(
    scraper: &PostScraper,
    sinks: &[Box<dyn ExportSink>],
    urls: &[String],
) -> RunSummary {
    let mut summary = RunSummary {
        succeeded: 0,
        total: urls.len(),
    };

    info!(count = urls.len(), source = scraper.source_id(), "Starting scrape");

    for url in urls {
        info!(url = %url, "Scraping");
        match scraper.scrape(url).await {
            Ok(record) => {
                for sink in sinks {
                    sink.export(&record).await;
                }
                summary.succeeded += 1;
            }
            Err(e) => {
                error!(url = %url, error = %e, "Failed to scrape");
            }
        }
    }

    info!(
        succeeded = summary.succeeded,
        total = summary.total,
        "Finished. Successfully scraped {summary} URL(s)."
    );
    summary
}
