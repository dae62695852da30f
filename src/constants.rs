//! Shared constants used across the application.

/// User agent sent with live-mode page fetches unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "facebook-posts-scraper/1.0";

pub const DEFAULT_SAMPLE_FILE: &str = "data/sample.json";
pub const DEFAULT_OUTPUT_PATH: &str = "data/output.jsonl";
pub const DEFAULT_INPUT_PATH: &str = "data/inputs.sample.txt";

/// Comments kept per record; longer lists are truncated, never expanded.
pub const DEFAULT_MAX_COMMENTS: usize = 100;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_LOG_LEVEL: &str = "info";
