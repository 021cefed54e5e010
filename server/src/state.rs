use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use article_scraper::{Extractor, ScraperConfig};

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(120);

// Shared by every request; the extractor carries only the connection pool.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub request_deadline: Duration,
    /// Where successful records are saved, if anywhere.
    pub output_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(extractor: Extractor, request_deadline: Duration, output_path: Option<PathBuf>) -> Self {
        AppState {
            extractor: Arc::new(extractor),
            request_deadline,
            output_path,
        }
    }

    pub fn from_env(config: &ScraperConfig) -> Result<Self, article_scraper::ScrapeError> {
        let deadline = env::var("SCRAPER_REQUEST_DEADLINE_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_DEADLINE);
        let save = env::var("SCRAPER_SAVE_RESULTS")
            .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
            .unwrap_or(true);

        Ok(Self::new(
            Extractor::new(config)?,
            deadline,
            save.then(|| config.output_path.clone()),
        ))
    }
}

pub fn listen_addr() -> String {
    env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string())
}
