use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::fetcher::{FetchSettings, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::noise::DEFAULT_NOISE_KEYWORDS;
use crate::strategies::DEFAULT_VIDEO_HOSTS;
use crate::targets::NOTE_FEED_API;

pub const DEFAULT_OUTPUT_PATH: &str = "output/article_data.json";

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    pub user_agent: String,
    pub noise_keywords: Vec<String>,
    pub video_hosts: Vec<String>,
    pub output_path: PathBuf,
    /// Session cookie for targets that need one, sent as-is.
    pub cookie: Option<String>,
    pub referer: Option<String>,
    /// Endpoint video notes are read from.
    pub note_feed_api: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            noise_keywords: DEFAULT_NOISE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            video_hosts: DEFAULT_VIDEO_HOSTS.iter().map(|h| h.to_string()).collect(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            cookie: None,
            referer: None,
            note_feed_api: NOTE_FEED_API.to_string(),
        }
    }
}

impl ScraperConfig {
    /// Loads `.env` if present, then reads `SCRAPER_*` variables. Unset or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| parse_trimmed::<u64>(key, &v));

        Self {
            timeout: parsed("SCRAPER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_attempts: parsed("SCRAPER_MAX_ATTEMPTS")
                .map(|n| n.clamp(1, u64::from(u32::MAX)) as u32)
                .unwrap_or(defaults.max_attempts),
            backoff_unit: parsed("SCRAPER_BACKOFF_UNIT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_unit),
            user_agent: lookup("SCRAPER_USER_AGENT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            noise_keywords: lookup("SCRAPER_NOISE_KEYWORDS")
                .map(|v| split_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(defaults.noise_keywords),
            video_hosts: lookup("SCRAPER_VIDEO_HOSTS")
                .map(|v| split_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(defaults.video_hosts),
            output_path: lookup("SCRAPER_OUTPUT_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
            cookie: lookup("SCRAPER_COOKIE").filter(|v| !v.trim().is_empty()),
            referer: lookup("SCRAPER_REFERER").filter(|v| !v.trim().is_empty()),
            note_feed_api: lookup("SCRAPER_NOTE_FEED_API")
                .map(|v| v.trim().trim_end_matches('?').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.note_feed_api),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            user_agent: self.user_agent.clone(),
            backoff_unit: self.backoff_unit,
            ..FetchSettings::default()
        }
    }
}

fn parse_trimmed<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "ignoring unparsable setting");
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
