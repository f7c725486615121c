use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ALWAYS_ONLINE_URL: &str = "http://google.com";
pub const DEFAULT_FEED_URL: &str = "http://www.forocoches.com/foro/external.php?type=RSS2&forumids=2";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 2;

const ALWAYS_ONLINE_URL_KEY: &str = "FEED_READER_ALWAYS_ONLINE_URL";
const FEED_URL_KEY: &str = "FEED_READER_FEED_URL";
const PROBE_TIMEOUT_KEY: &str = "FEED_READER_PROBE_TIMEOUT_SECS";

/// Endpoints and probe timeout handed to the reader at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub always_online_url: String,
    pub feed_url: String,
    pub probe_timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            always_online_url: DEFAULT_ALWAYS_ONLINE_URL.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be an absolute http(s) url, got {value:?}")]
    InvalidUrl { key: &'static str, value: String },
    #[error("{key} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { key: &'static str, value: String },
    #[error("failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

impl ReaderConfig {
    /// Defaults, overridden by `.env.local` and then by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::from_filename(".env.local");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides from a dotenv file without touching the process environment.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for pair in dotenvy::from_path_iter(path)? {
            let (key, value) = pair?;
            values.insert(key, value);
        }
        Self::from_lookup(|key| values.get(key).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = read(ALWAYS_ONLINE_URL_KEY) {
            config.always_online_url = url.trim().to_string();
        }
        if let Some(url) = read(FEED_URL_KEY) {
            config.feed_url = url.trim().to_string();
        }
        if let Some(raw) = read(PROBE_TIMEOUT_KEY) {
            let seconds = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or(ConfigError::InvalidTimeout {
                    key: PROBE_TIMEOUT_KEY,
                    value: raw.clone(),
                })?;
            config.probe_timeout = Duration::from_secs(seconds);
        }

        validate_config(&config)?;
        Ok(config)
    }
}

pub fn validate_config(config: &ReaderConfig) -> Result<(), ConfigError> {
    validate_url(ALWAYS_ONLINE_URL_KEY, &config.always_online_url)?;
    validate_url(FEED_URL_KEY, &config.feed_url)?;
    if config.probe_timeout.is_zero() {
        return Err(ConfigError::InvalidTimeout {
            key: PROBE_TIMEOUT_KEY,
            value: "0".to_string(),
        });
    }
    Ok(())
}

fn validate_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            key,
            value: value.to_string(),
        }),
    }
}
