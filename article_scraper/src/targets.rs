use std::sync::OnceLock;

use regex::Regex;

use crate::error::ScrapeError;
use crate::fetcher::validate_url;
use crate::strategies::Profile;

pub const NOTE_FEED_API: &str = "https://www.xiaohongshu.com/api/sns/web/v1/feed";

const NOTE_ID_PATTERNS: &[&str] = &[
    r"/explore/([a-zA-Z0-9]+)",
    r"/discovery/item/([a-zA-Z0-9]+)",
    r"xhslink\.com/([a-zA-Z0-9]+)",
    r"/items/([a-zA-Z0-9]+)",
];

fn note_id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        NOTE_ID_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Note id from any of the known share-link shapes.
pub fn note_id(url: &str) -> Option<String> {
    note_id_patterns()
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Feed API endpoint for one note; the query is `noteIds=["<id>"]`.
pub fn note_feed_url(feed_api: &str, note_id: &str) -> String {
    format!("{feed_api}?noteIds=%5B%22{note_id}%22%5D")
}

/// The URL that actually has to be fetched for `input` under `profile`.
/// Video notes are read from `feed_api` rather than from the share link.
pub fn fetch_target(profile: Profile, input: &str, feed_api: &str) -> Result<String, ScrapeError> {
    let url = validate_url(input)?;
    match profile {
        Profile::Article => Ok(url.into()),
        Profile::VideoNote => note_id(url.as_str())
            .map(|id| note_feed_url(feed_api, &id))
            .ok_or_else(|| ScrapeError::InvalidInput(format!("{input}: no note id in url"))),
    }
}
