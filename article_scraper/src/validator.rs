use chrono::Utc;

use crate::error::ScrapeError;
use crate::{DraftRecord, ExtractedRecord};

pub const TITLE_NOT_FOUND: &str = "Title not found";

/// An empty body is the only hard failure. Everything else degrades: a
/// missing title becomes [`TITLE_NOT_FOUND`], missing links stay `None`.
pub fn validate(draft: DraftRecord) -> Result<ExtractedRecord, ScrapeError> {
    let content = draft
        .blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if content.trim().is_empty() {
        return Err(ScrapeError::EmptyContent);
    }

    Ok(ExtractedRecord {
        title: draft
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| TITLE_NOT_FOUND.to_string()),
        content,
        video_link: draft.video_link,
        cover_image: draft.cover_image,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentBlock;

    fn block(position: usize, text: &str) -> ContentBlock {
        ContentBlock {
            position,
            text: text.to_string(),
        }
    }

    #[test]
    fn empty_body_fails_even_with_other_fields() {
        let draft = DraftRecord {
            title: Some("Hello".into()),
            blocks: Vec::new(),
            video_link: Some("https://youtu.be/abc".into()),
            cover_image: Some("https://example.com/img.jpg".into()),
        };
        assert_eq!(validate(draft), Err(ScrapeError::EmptyContent));
    }

    #[test]
    fn missing_title_uses_sentinel() {
        let draft = DraftRecord {
            blocks: vec![block(0, "first"), block(1, "second")],
            ..DraftRecord::default()
        };
        let record = validate(draft).unwrap();
        assert_eq!(record.title, TITLE_NOT_FOUND);
        assert_eq!(record.content, "first\nsecond");
        assert_eq!(record.video_link, None);
        assert_eq!(record.cover_image, None);
    }

    #[test]
    fn stamps_current_time() {
        let before = Utc::now();
        let record = validate(DraftRecord {
            blocks: vec![block(0, "x")],
            ..DraftRecord::default()
        })
        .unwrap();
        assert!(record.timestamp >= before);
        assert!(record.timestamp <= Utc::now());
    }
}
