pub mod cascade;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod logging;
pub mod noise;
pub mod resolver;
pub mod strategies;
pub mod targets;
pub mod utils;
pub mod validator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use config::ScraperConfig;
pub use error::{AttemptError, FetchError, ScrapeError};
pub use extractor::Extractor;
pub use strategies::Profile;

/// One text fragment of the body, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub position: usize,
    pub text: String,
}

/// Field values as the cascades found them, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftRecord {
    pub title: Option<String>,
    pub blocks: Vec<ContentBlock>,
    pub video_link: Option<String>,
    pub cover_image: Option<String>,
}

/// The normalized result of one successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub title: String,
    pub content: String,
    pub video_link: Option<String>,
    pub cover_image: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ExtractedRecord {
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}
