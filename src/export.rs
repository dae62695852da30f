//! Export sinks. Each sink receives one finished record at a time.
//!
//! Sink failures are logged at the sink boundary and never reach the caller, so
//! one broken sink can't stop the batch or starve the other sinks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

use crate::record::PostRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write to stdout: {0}")]
    Stdout(#[source] std::io::Error),
}

/// A destination for finished records.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Identifier used in logs.
    fn sink_id(&self) -> &'static str;

    /// Write one record, reporting failures to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the record can't be serialized or written.
    async fn try_export(&self, record: &PostRecord) -> Result<(), ExportError>;

    /// Write one record. Failures are logged, never returned.
    async fn export(&self, record: &PostRecord) {
        if let Err(e) = self.try_export(record).await {
            error!(sink = self.sink_id(), url = %record.input, error = %e, "Export failed");
        }
    }
}

/// Appends each record as one JSON line.
///
/// The file is opened and closed on every call, so a crash mid-run can't corrupt
/// lines written earlier.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Single-line JSON with non-ASCII characters written literally.
///
/// # Errors
///
/// Returns an error if the record can't be serialized.
pub fn to_json_line(record: &PostRecord) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

#[async_trait]
impl ExportSink for JsonLinesSink {
    fn sink_id(&self) -> &'static str {
        "jsonl"
    }

    async fn try_export(&self, record: &PostRecord) -> Result<(), ExportError> {
        let line = to_json_line(record)?;
        let io_error = |source| ExportError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_error)?;

        // One write per record keeps each line a single append
        file.write_all(line.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;

        debug!(path = %self.path.display(), url = %record.input, "Wrote record");
        Ok(())
    }
}

/// Pretty-prints each record to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Indented multi-line JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the record can't be serialized.
    pub fn render(record: &PostRecord) -> Result<String, serde_json::Error> {
        let mut pretty = serde_json::to_string_pretty(record)?;
        pretty.push('\n');
        Ok(pretty)
    }
}

#[async_trait]
impl ExportSink for ConsoleSink {
    fn sink_id(&self) -> &'static str {
        "stdout"
    }

    async fn try_export(&self, record: &PostRecord) -> Result<(), ExportError> {
        let pretty = Self::render(record)?;
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(pretty.as_bytes())
            .await
            .map_err(ExportError::Stdout)?;
        stdout.flush().await.map_err(ExportError::Stdout)
    }
}
