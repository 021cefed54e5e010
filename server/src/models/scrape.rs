use article_scraper::{ExtractedRecord, Profile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ScrapePayload {
    pub url: String,
    #[serde(default)]
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub title: String,
    pub content: String,
    pub video_link: Option<String>,
    pub cover_image: Option<String>,
    pub timestamp: String,
}

impl From<ExtractedRecord> for ScrapeResponse {
    fn from(record: ExtractedRecord) -> Self {
        ScrapeResponse {
            title: record.title,
            content: record.content,
            video_link: record.video_link,
            cover_image: record.cover_image,
            timestamp: record.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: Option<String>,
    pub timestamp: String,
}
