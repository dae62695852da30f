//! Facebook posts scraper library.
//!
//! Normalizes post data from a deterministic sample corpus or from live pages
//! into one canonical record shape and streams each record to export sinks.

pub mod config;
pub mod constants;
pub mod export;
pub mod metadata;
pub mod record;
pub mod runner;
pub mod sources;
pub mod time_codec;
