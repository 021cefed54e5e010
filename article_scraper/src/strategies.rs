//! Rule tables per field and per document kind.
//!
//! Adding a fallback tier means adding a row here; the cascade itself never
//! changes. The orderings are tuned defaults, not guarantees about any
//! particular site template.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cascade::{extract_blocks, extract_field, Document, HtmlRule, JsonRule, ValueSource};
use crate::error::ScrapeError;
use crate::noise::NoiseFilter;
use crate::resolver::resolve;
use crate::DraftRecord;

pub const DEFAULT_VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// Primary content container of article templates.
pub const CONTENT_CONTAINER: &str = "div.entry-content";

/// Which kind of upstream document a request targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Server-rendered article or transcript page (HTML).
    #[default]
    Article,
    /// Short-video note, read from the platform's feed API (JSON).
    VideoNote,
}

#[derive(Debug, Clone)]
pub struct FieldStrategies<R> {
    pub title: Vec<R>,
    pub body: Vec<R>,
    pub cover_image: Vec<R>,
    pub video_link: Vec<R>,
}

impl<R> FieldStrategies<R> {
    /// Runs every field cascade over `doc`. Body blocks go through `noise`;
    /// image and video references are resolved against `origin`.
    pub fn draft<D>(&self, doc: &D, noise: &NoiseFilter, origin: &str) -> DraftRecord
    where
        D: Document<Rule = R>,
    {
        let blocks = noise.filter(extract_blocks(doc, &self.body));
        DraftRecord {
            title: extract_field(doc, &self.title),
            blocks,
            cover_image: extract_field(doc, &self.cover_image).map(|src| resolve(&src, origin)),
            video_link: extract_field(doc, &self.video_link).map(|href| resolve(&href, origin)),
        }
    }
}

pub fn html_article(video_hosts: &[String]) -> Result<FieldStrategies<HtmlRule>, ScrapeError> {
    use ValueSource::{Attr, Text};

    Ok(FieldStrategies {
        title: vec![
            HtmlRule::select("h1.entry-title", Text)?,
            HtmlRule::select("h1", Text)?,
            HtmlRule::select("title", Text)?,
        ],
        body: vec![
            HtmlRule::scoped(CONTENT_CONTAINER, "div.ts-segment", Text)?,
            HtmlRule::scoped(
                CONTENT_CONTAINER,
                "p.paragraph, p.content, div.paragraph, div.content",
                Text,
            )?,
            HtmlRule::scoped(CONTENT_CONTAINER, "p, div", Text)?,
        ],
        cover_image: vec![
            HtmlRule::select("img.featured-image", Attr("src"))?,
            HtmlRule::select("img.wp-post-image", Attr("src"))?,
            HtmlRule::select(r#"meta[property="og:image"]"#, Attr("content"))?,
            HtmlRule::select("img", Attr("src"))?,
        ],
        video_link: vec![HtmlRule::link_host(video_hosts)?],
    })
}

pub fn json_video_note() -> Result<FieldStrategies<JsonRule>, ScrapeError> {
    let rules = |pointers: &[&str]| -> Result<Vec<JsonRule>, ScrapeError> {
        pointers.iter().map(|p| JsonRule::new(*p)).collect()
    };

    Ok(FieldStrategies {
        title: rules(&["/data/items/0/note_card/title", "/data/notes/0/title"])?,
        body: rules(&["/data/items/0/note_card/desc", "/data/notes/0/desc"])?,
        cover_image: rules(&[
            "/data/notes/0/video/cover/url",
            "/data/items/0/note_card/video/cover/url",
            "/data/notes/0/image_list/0/url",
        ])?,
        video_link: rules(&["/data/notes/0/video/url", "/data/items/0/note_card/video/url"])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{HtmlDocument, JsonDocument};

    fn hosts() -> Vec<String> {
        DEFAULT_VIDEO_HOSTS.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn transcript_page_scenario() {
        let doc = HtmlDocument::parse(
            r#"<h1 class="entry-title">Hello</h1>
               <div class="ts-segment">World</div>
               <img class="featured-image" src="/img.jpg">
               <a href="https://youtu.be/abc">video</a>"#,
        );
        let strategies = html_article(&hosts()).unwrap();
        let origin = crate::resolver::origin_of("https://example.com/post");
        let draft = strategies.draft(&doc, &NoiseFilter::default(), &origin);
        let record = crate::validator::validate(draft).unwrap();

        assert_eq!(record.title, "Hello");
        assert_eq!(record.content, "World");
        assert_eq!(record.cover_image.as_deref(), Some("https://example.com/img.jpg"));
        assert_eq!(record.video_link.as_deref(), Some("https://youtu.be/abc"));
    }

    #[test]
    fn cover_image_prefers_featured_over_og_meta() {
        let doc = HtmlDocument::parse(
            r#"<html><head><meta property="og:image" content="https://cdn.example.com/og.jpg"></head>
               <body><img src="/any.jpg"><img class="featured-image" src="/featured.jpg"></body></html>"#,
        );
        let strategies = html_article(&hosts()).unwrap();
        let draft = strategies.draft(&doc, &NoiseFilter::default(), "https://example.com");
        assert_eq!(draft.cover_image.as_deref(), Some("https://example.com/featured.jpg"));
    }

    #[test]
    fn cover_image_falls_back_to_og_meta() {
        let doc = HtmlDocument::parse(
            r#"<html><head><meta property="og:image" content="https://cdn.example.com/og.jpg"></head>
               <body><p>text</p></body></html>"#,
        );
        let strategies = html_article(&hosts()).unwrap();
        let draft = strategies.draft(&doc, &NoiseFilter::default(), "https://example.com");
        assert_eq!(draft.cover_image.as_deref(), Some("https://cdn.example.com/og.jpg"));
    }

    #[test]
    fn transcript_segments_beat_paragraphs() {
        let doc = HtmlDocument::parse(
            r#"<div class="entry-content">
                 <p class="paragraph">summary</p>
                 <div class="ts-segment">segment one</div>
                 <div class="ts-segment">segment two</div>
               </div>"#,
        );
        let strategies = html_article(&hosts()).unwrap();
        let draft = strategies.draft(&doc, &NoiseFilter::default(), "https://example.com");
        let texts: Vec<_> = draft.blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["segment one", "segment two"]);
    }

    #[test]
    fn last_resort_paragraphs_are_noise_filtered() {
        let doc = HtmlDocument::parse(
            r#"<body><p>Skip to content</p><p>Real words.</p><p>Next post</p></body>"#,
        );
        let strategies = html_article(&hosts()).unwrap();
        let draft = strategies.draft(&doc, &NoiseFilter::default(), "https://example.com");
        let texts: Vec<_> = draft.blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["Real words."]);
    }

    #[test]
    fn video_note_fields_come_from_feed_response() {
        let doc = JsonDocument::parse(
            br#"{"code":0,"data":{"notes":[{
                "title":"Clip","desc":"A short clip",
                "video":{"url":"https://sns-video.example.com/v.mp4","cover":{"url":"https://sns-img.example.com/c.jpg"}}
            }]}}"#,
        )
        .unwrap();
        let strategies = json_video_note().unwrap();
        let draft = strategies.draft(&doc, &NoiseFilter::default(), "https://www.xiaohongshu.com");
        assert_eq!(draft.title.as_deref(), Some("Clip"));
        assert_eq!(draft.blocks[0].text, "A short clip");
        assert_eq!(draft.video_link.as_deref(), Some("https://sns-video.example.com/v.mp4"));
        assert_eq!(draft.cover_image.as_deref(), Some("https://sns-img.example.com/c.jpg"));
    }

    #[test]
    fn profile_uses_snake_case_names() {
        let profile: Profile = serde_json::from_str(r#""video_note""#).unwrap();
        assert_eq!(profile, Profile::VideoNote);
        assert_eq!(Profile::default(), Profile::Article);
    }
}
