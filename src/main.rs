use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use facebook_posts_scraper::config::Config;
use facebook_posts_scraper::constants::DEFAULT_LOG_LEVEL;
use facebook_posts_scraper::export::{ConsoleSink, ExportSink, JsonLinesSink};
use facebook_posts_scraper::runner::{load_inputs, run_batch};
use facebook_posts_scraper::sources::{HttpFetcher, PostScraper};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting facebook-posts-scraper");

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(input) = std::env::args_os().nth(1) {
        config.input_path = PathBuf::from(input);
    }
    config.validate().context("Invalid configuration")?;

    info!(
        mode = config.mode.as_str(),
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        "Configuration loaded"
    );

    let urls = load_inputs(&config.input_path).await?;
    if urls.is_empty() {
        warn!(path = %config.input_path.display(), "No URLs found in input file");
        return Ok(());
    }

    if let Some(parent) = config.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    let fetcher = Arc::new(HttpFetcher::default());
    let scraper = PostScraper::from_config(&config, fetcher);
    scraper
        .prepare()
        .await
        .context("Failed to prepare scraper")?;

    let sinks: Vec<Box<dyn ExportSink>> = vec![
        Box::new(JsonLinesSink::new(config.output_path.clone())),
        Box::new(ConsoleSink::new()),
    ];

    let summary = run_batch(&scraper, &sinks, &urls).await;
    if summary.failed() > 0 {
        warn!(failed = summary.failed(), "Some URLs could not be scraped");
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Records go to stdout, so logs go to stderr
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
