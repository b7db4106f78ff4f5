//! Runtime configuration loaded from the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::fetchers::DEFAULT_USER_AGENT;

/// Scraper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// User agent sent with direct HTTP fetches
    pub user_agent: String,

    /// Direct HTTP request timeout (seconds)
    pub http_timeout_secs: u64,

    /// Bound on navigation plus readiness wait for rendered fetches (seconds)
    pub render_timeout_secs: u64,

    /// Spacing between synthesized item timestamps (seconds)
    pub item_interval_secs: u64,

    /// Chrome/Chromium binary for rendered fetches
    pub chrome_executable: Option<PathBuf>,

    /// Extra JSON source definitions
    pub sources_file: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_secs: 30,
            render_timeout_secs: 30,
            item_interval_secs: 60,
            chrome_executable: None,
            sources_file: None,
        }
    }
}

impl ScrapeConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` if present. Unset variables keep their defaults;
    /// set-but-invalid numbers are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Ok(Self {
            user_agent: env::var("FEED_SCRAPE_USER_AGENT").unwrap_or(defaults.user_agent),
            http_timeout_secs: parse_var("FEED_SCRAPE_HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            render_timeout_secs: parse_var(
                "FEED_SCRAPE_RENDER_TIMEOUT_SECS",
                defaults.render_timeout_secs,
            )?,
            item_interval_secs: parse_var("FEED_ITEM_INTERVAL_SECS", defaults.item_interval_secs)?,
            chrome_executable: env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
            sources_file: env::var("FEED_SCRAPE_SOURCES_FILE").ok().map(PathBuf::from),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn item_interval(&self) -> chrono::Duration {
        i64::try_from(self.item_interval_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
            expected: "a non-negative integer",
        }),
        Err(_) => Ok(default),
    }
}
