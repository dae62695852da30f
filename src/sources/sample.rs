//! Sample mode: records served from a local JSON corpus.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{PostSource, ScrapeError};
use crate::record::{epoch_from_number, PostRecord, RecordSource};
use crate::time_codec::{self, TimeError};

/// A raw corpus entry. Open-ended; only `input` is required for lookup.
pub type RawRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("sample corpus unavailable at {path}: {source}")]
    CorpusUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sample corpus at {path}: {reason}")]
    InvalidCorpus { path: PathBuf, reason: String },
    #[error("no sample record found for URL: {0}")]
    RecordNotFound(String),
    #[error("sample record for {url} has an unusable create_time: {source}")]
    Timestamp {
        url: String,
        #[source]
        source: TimeError,
    },
}

/// Serves records from a corpus file, loaded on first use.
#[derive(Debug)]
pub struct SampleSource {
    path: PathBuf,
    max_comments: usize,
    corpus: OnceCell<Vec<RawRecord>>,
}

impl SampleSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_comments: usize) -> Self {
        Self {
            path: path.into(),
            max_comments,
            corpus: OnceCell::new(),
        }
    }

    /// A source over an already loaded corpus. The file path is never read.
    #[must_use]
    pub fn from_records(records: Vec<RawRecord>, max_comments: usize) -> Self {
        Self {
            path: PathBuf::from("<memory>"),
            max_comments,
            corpus: OnceCell::new_with(Some(records)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the corpus if it hasn't been loaded yet.
    ///
    /// The file is read at most once; the result is immutable afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't a list of objects.
    pub async fn corpus(&self) -> Result<&[RawRecord], SampleError> {
        let records = self
            .corpus
            .get_or_try_init(|| load_corpus(&self.path))
            .await?;
        Ok(records.as_slice())
    }

    /// Look up `url` in the corpus and return the enriched record.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::RecordNotFound`] when no entry matches, or a
    /// corpus error if the corpus is unusable.
    pub async fn lookup(&self, url: &str) -> Result<PostRecord, SampleError> {
        let corpus = self.corpus().await?;

        let raw = corpus
            .iter()
            .find(|record| record.get("input").and_then(Value::as_str) == Some(url))
            .ok_or_else(|| SampleError::RecordNotFound(url.to_string()))?;

        let enriched = enrich(raw, self.max_comments).map_err(|source| SampleError::Timestamp {
            url: url.to_string(),
            source,
        })?;

        let record = PostRecord::from_map(enriched);

        info!(url = %url, "Loaded sample record");
        Ok(record)
    }
}

#[async_trait]
impl PostSource for SampleSource {
    fn source_id(&self) -> &'static str {
        RecordSource::Sample.as_str()
    }

    async fn prepare(&self) -> Result<(), ScrapeError> {
        self.corpus().await?;
        Ok(())
    }

    async fn scrape(&self, url: &str) -> Result<PostRecord, ScrapeError> {
        debug!(path = %self.path.display(), "Using sample data");
        Ok(self.lookup(url).await?)
    }
}

async fn load_corpus(path: &Path) -> Result<Vec<RawRecord>, SampleError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SampleError::CorpusUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    let invalid = |reason: String| SampleError::InvalidCorpus {
        path: path.to_path_buf(),
        reason,
    };

    let value: Value = serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(invalid("expected a JSON list of records".to_string()));
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(invalid(format!("entry {index} is not an object"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(path = %path.display(), records = records.len(), "Loaded sample corpus");
    Ok(records)
}

/// Fill the gaps in a corpus record. Existing values are never overwritten,
/// except that `comments` is cut down to `max_comments`.
///
/// # Errors
///
/// Returns an error if a numeric `create_time` can't be rendered as a timestamp.
pub fn enrich(record: &RawRecord, max_comments: usize) -> Result<RawRecord, TimeError> {
    let mut enriched = record.clone();

    if !enriched.contains_key("create_time_iso") {
        if let Some(Value::Number(n)) = enriched.get("create_time") {
            if let Some(seconds) = epoch_from_number(n) {
                let iso = time_codec::epoch_to_iso(seconds)?;
                enriched.insert("create_time_iso".to_string(), Value::String(iso));
            }
        }
    }

    enriched
        .entry("scraped_at")
        .or_insert_with(|| Value::String(time_codec::now_iso()));
    enriched
        .entry("source")
        .or_insert_with(|| Value::String(RecordSource::Sample.as_str().to_string()));

    if let Some(Value::Array(comments)) = enriched.get_mut("comments") {
        comments.truncate(max_comments);
    }

    Ok(enriched)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_enrich_fills_gaps() {
        let record = raw(json!({
            "input": "https://facebook.com/p/1",
            "create_time": 1_704_110_400,
        }));

        let enriched = enrich(&record, 10).unwrap();

        assert_eq!(
            enriched["create_time_iso"],
            json!("2024-01-01T12:00:00+00:00")
        );
        assert!(enriched["scraped_at"].is_string());
        assert_eq!(enriched["source"], json!("sample"));
        assert!(!enriched.contains_key("post_url"));
        assert!(!enriched.contains_key("comments"));
    }

    #[test]
    fn test_enrich_never_overwrites() {
        let record = raw(json!({
            "input": "https://facebook.com/p/1",
            "create_time": 1_704_110_400,
            "create_time_iso": "kept as-is",
            "scraped_at": "2023-06-01T00:00:00+00:00",
            "source": "live",
            "post_url": "https://facebook.com/canonical/1",
        }));

        let enriched = enrich(&record, 10).unwrap();

        assert_eq!(enriched, record);
    }

    #[test]
    fn test_enrich_skips_non_numeric_create_time() {
        let record = raw(json!({
            "input": "https://facebook.com/p/1",
            "create_time": "yesterday",
        }));

        let enriched = enrich(&record, 10).unwrap();

        assert!(!enriched.contains_key("create_time_iso"));
    }

    #[test]
    fn test_enrich_floors_float_create_time() {
        let record = raw(json!({
            "input": "https://facebook.com/p/1",
            "create_time": 1_704_110_400.9,
        }));

        let enriched = enrich(&record, 10).unwrap();

        assert_eq!(
            enriched["create_time_iso"],
            json!("2024-01-01T12:00:00+00:00")
        );
    }

    #[test]
    fn test_enrich_truncates_comments() {
        let record = raw(json!({
            "input": "https://facebook.com/p/1",
            "comments": [{"text": "a"}, {"text": "b"}, {"text": "c"}],
        }));

        assert_eq!(
            enrich(&record, 2).unwrap()["comments"],
            json!([{"text": "a"}, {"text": "b"}])
        );
        assert_eq!(enrich(&record, 0).unwrap()["comments"], json!([]));
        assert_eq!(enrich(&record, 5).unwrap()["comments"], record["comments"]);
    }

    #[tokio::test]
    async fn test_lookup_exact_match_only() {
        let source = SampleSource::from_records(
            vec![
                raw(json!({"input": "https://facebook.com/p/1", "text": "first"})),
                raw(json!({"input": "https://facebook.com/p/1", "text": "duplicate"})),
            ],
            10,
        );

        let record = source.lookup("https://facebook.com/p/1").await.unwrap();
        assert_eq!(record.text, "first");
        assert_eq!(record.source, RecordSource::Sample);

        let missing = source.lookup("https://facebook.com/p/1/").await;
        assert!(matches!(missing, Err(SampleError::RecordNotFound(url)) if url == "https://facebook.com/p/1/"));
    }

    #[tokio::test]
    async fn test_lookup_keeps_unusual_values() {
        let stored = json!({
            "input": "https://facebook.com/p/1",
            "create_time": "2024-01-01",
            "text": null,
            "like_count": null,
            "view_count": 12.0,
            "author": {"name": "Ann"},
            "scraped_at": null,
            "source": "archive",
            "comments": [
                {"text": "a", "create_time": 1_704_110_400.5},
                {"text": "b", "like_count": "few"},
                "c"
            ]
        });
        let source = SampleSource::from_records(vec![raw(stored.clone())], 2);

        let record = source.lookup("https://facebook.com/p/1").await.unwrap();
        let line = serde_json::to_string(&record).unwrap();
        let written: Value = serde_json::from_str(&line).unwrap();

        for (key, value) in stored.as_object().unwrap() {
            if key == "comments" {
                continue;
            }
            assert_eq!(written.get(key), Some(value), "{key} changed");
        }
        assert_eq!(
            written["comments"],
            json!([
                {"text": "a", "create_time": 1_704_110_400.5},
                {"text": "b", "like_count": "few"}
            ])
        );
        // A non-numeric create_time has nothing to derive from
        assert_eq!(written["create_time_iso"], Value::Null);
    }

    #[tokio::test]
    async fn test_lookup_keeps_float_create_time() {
        let source = SampleSource::from_records(
            vec![raw(json!({"input": "u", "create_time": 1_704_110_400.5}))],
            10,
        );

        let record = source.lookup("u").await.unwrap();
        let written = serde_json::to_value(&record).unwrap();

        assert_eq!(written["create_time"], json!(1_704_110_400.5));
        assert_eq!(written["create_time_iso"], json!("2024-01-01T12:00:00+00:00"));
        assert_eq!(written["source"], json!("sample"));
        assert!(written["scraped_at"].is_string());
    }

    #[tokio::test]
    async fn test_missing_corpus_file() {
        let source = SampleSource::new("/nonexistent/sample.json", 10);

        let result = source.lookup("https://facebook.com/p/1").await;
        assert!(matches!(result, Err(SampleError::CorpusUnavailable { .. })));
    }
}
