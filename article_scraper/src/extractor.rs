use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cascade::{HtmlDocument, HtmlRule, JsonDocument, JsonRule};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::fetcher::{FetchRequest, Fetcher, HeaderAuth, NoAuth, RequestAuth};
use crate::noise::NoiseFilter;
use crate::resolver::origin_of;
use crate::strategies::{html_article, json_video_note, FieldStrategies, Profile};
use crate::targets::fetch_target;
use crate::validator::validate;
use crate::{DraftRecord, ExtractedRecord};

/// The whole pipeline: fetch, parse, run the field cascades, validate.
///
/// Holds no per-call state, so one instance can serve any number of
/// concurrent extractions.
pub struct Extractor {
    fetcher: Fetcher,
    noise: NoiseFilter,
    html: FieldStrategies<HtmlRule>,
    json: FieldStrategies<JsonRule>,
    timeout: Duration,
    max_attempts: u32,
    note_feed_api: String,
}

impl Extractor {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let fetcher = Fetcher::new(config.fetch_settings(), auth_from(config)?)
            .map_err(|e| ScrapeError::ClientSetup(e.to_string()))?;

        Ok(Self {
            fetcher,
            noise: NoiseFilter::new(&config.noise_keywords),
            html: html_article(&config.video_hosts)?,
            json: json_video_note()?,
            timeout: config.timeout,
            max_attempts: config.max_attempts,
            note_feed_api: config.note_feed_api.clone(),
        })
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn extract(
        &self,
        url: &str,
        profile: Profile,
        cancel: &CancellationToken,
    ) -> Result<ExtractedRecord, ScrapeError> {
        let target = fetch_target(profile, url, &self.note_feed_api)?;
        let request = FetchRequest::new(target.as_str())
            .with_timeout(self.timeout)
            .with_max_attempts(self.max_attempts);

        let body = self.fetcher.fetch(&request, cancel).await?;
        if cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }

        let origin = origin_of(&target);
        let draft = match profile {
            Profile::Article => self.draft_html(&body, &origin),
            Profile::VideoNote => self.draft_json(&body, &origin)?,
        };

        let record = validate(draft)?;
        tracing::info!(
            title = %record.title,
            chars = record.content_length(),
            has_video = record.video_link.is_some(),
            "extraction succeeded"
        );
        Ok(record)
    }

    /// Markup is decoded leniently; any byte sequence parses as HTML.
    fn draft_html(&self, body: &[u8], origin: &str) -> DraftRecord {
        let markup = String::from_utf8_lossy(body);
        let doc = HtmlDocument::parse(&markup);
        self.html.draft(&doc, &self.noise, origin)
    }

    fn draft_json(&self, body: &[u8], origin: &str) -> Result<DraftRecord, ScrapeError> {
        let doc = JsonDocument::parse(body)?;
        check_api_status(&doc)?;
        Ok(self.json.draft(&doc, &self.noise, origin))
    }
}

/// Feed APIs report refusals in-band with a non-zero `code`.
fn check_api_status(doc: &JsonDocument) -> Result<(), ScrapeError> {
    let Some(code) = doc.value().get("code").and_then(|c| c.as_i64()) else {
        return Ok(());
    };
    if code == 0 {
        return Ok(());
    }
    let message = doc
        .value()
        .get("msg")
        .and_then(|m| m.as_str())
        .unwrap_or_default()
        .to_string();
    Err(ScrapeError::UpstreamRejected { code, message })
}

fn auth_from(config: &ScraperConfig) -> Result<Arc<dyn RequestAuth>, ScrapeError> {
    let pairs: Vec<(&str, &str)> = [
        ("Cookie", config.cookie.as_deref()),
        ("Referer", config.referer.as_deref()),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name, v)))
    .collect();

    if pairs.is_empty() {
        return Ok(Arc::new(NoAuth));
    }
    Ok(Arc::new(HeaderAuth::from_pairs(pairs)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_api_code_is_a_rejection() {
        let doc = JsonDocument::parse(br#"{"code":-100,"msg":"login required"}"#).unwrap();
        assert_eq!(
            check_api_status(&doc),
            Err(ScrapeError::UpstreamRejected {
                code: -100,
                message: "login required".into()
            })
        );

        let ok = JsonDocument::parse(br#"{"code":0,"data":{}}"#).unwrap();
        assert!(check_api_status(&ok).is_ok());
        let no_code = JsonDocument::parse(br#"{"data":{}}"#).unwrap();
        assert!(check_api_status(&no_code).is_ok());
    }

    #[test]
    fn cookie_config_builds_an_extractor() {
        let config = ScraperConfig {
            cookie: Some("web_session=abc".into()),
            referer: Some("https://www.xiaohongshu.com".into()),
            ..ScraperConfig::default()
        };
        assert!(Extractor::new(&config).is_ok());
    }

    #[test]
    fn unusable_cookie_is_invalid_input() {
        let config = ScraperConfig {
            cookie: Some("bad\nvalue".into()),
            ..ScraperConfig::default()
        };
        assert!(matches!(
            Extractor::new(&config),
            Err(ScrapeError::InvalidInput(_))
        ));
    }
}
