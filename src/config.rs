use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::constants::{
    DEFAULT_INPUT_PATH, DEFAULT_MAX_COMMENTS, DEFAULT_OUTPUT_PATH,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SAMPLE_FILE, DEFAULT_USER_AGENT,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to load settings file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },
}

/// Where records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    /// Serve records from the local sample corpus
    Sample,
    /// Fetch each URL and read its page metadata
    Live,
}

impl ScrapeMode {
    /// `sample` (any case) selects sample mode; every other value selects live mode.
    #[must_use]
    pub fn from_setting(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        if normalized == "sample" {
            return Self::Sample;
        }
        if normalized != "live" {
            warn!(mode = %value, "Unrecognised scraper mode, using live mode");
        }
        Self::Live
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Live => "live",
        }
    }
}

/// Run configuration: defaults, then the optional settings file, then environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: ScrapeMode,
    pub sample_file: PathBuf,
    pub output_path: PathBuf,
    pub input_path: PathBuf,
    pub max_comments: usize,
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Keys accepted in the TOML settings file named by `SCRAPER_CONFIG`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    mode: Option<String>,
    sample_file: Option<PathBuf>,
    output_path: Option<PathBuf>,
    input_path: Option<PathBuf>,
    max_comments: Option<usize>,
    request_timeout: Option<u64>,
    user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ScrapeMode::Sample,
            sample_file: PathBuf::from(DEFAULT_SAMPLE_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            max_comments: DEFAULT_MAX_COMMENTS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the settings file (if any) and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is unreadable or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match optional_env("SCRAPER_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(mode) = optional_env("SCRAPER_MODE") {
            config.mode = ScrapeMode::from_setting(&mode);
        }
        if let Some(path) = optional_env("SAMPLE_FILE") {
            config.sample_file = PathBuf::from(path);
        }
        if let Some(path) = optional_env("OUTPUT_PATH") {
            config.output_path = PathBuf::from(path);
        }
        if let Some(path) = optional_env("INPUT_PATH") {
            config.input_path = PathBuf::from(path);
        }
        config.max_comments = parse_env_usize("MAX_COMMENTS", config.max_comments)?;
        config.request_timeout = Duration::from_secs(parse_env_u64(
            "REQUEST_TIMEOUT_SECS",
            config.request_timeout.as_secs(),
        )?);
        if let Some(user_agent) = optional_env("USER_AGENT") {
            config.user_agent = user_agent;
        }

        Ok(config)
    }

    /// Defaults overlaid with a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or contains unknown keys.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |message: String| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            message,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let settings: FileSettings =
            toml::from_str(&contents).map_err(|e| file_error(e.to_string()))?;

        Ok(Self::default().merge(settings))
    }

    fn merge(self, settings: FileSettings) -> Self {
        Self {
            mode: settings
                .mode
                .as_deref()
                .map_or(self.mode, ScrapeMode::from_setting),
            sample_file: settings.sample_file.unwrap_or(self.sample_file),
            output_path: settings.output_path.unwrap_or(self.output_path),
            input_path: settings.input_path.unwrap_or(self.input_path),
            max_comments: settings.max_comments.unwrap_or(self.max_comments),
            request_timeout: settings
                .request_timeout
                .map_or(self.request_timeout, Duration::from_secs),
            user_agent: settings.user_agent.unwrap_or(self.user_agent),
        }
    }

    /// Configuration with defaults only, ignoring the environment.
    #[must_use]
    pub fn for_testing() -> Self {
        Self::default()
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "USER_AGENT".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "OUTPUT_PATH".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.mode == ScrapeMode::Sample && self.sample_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "SAMPLE_FILE".to_string(),
                message: "cannot be empty in sample mode".to_string(),
            });
        }
        Ok(())
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
