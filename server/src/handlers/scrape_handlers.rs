use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use article_scraper::fetcher::validate_url;
use article_scraper::{utils, ScrapeError};

use crate::models::scrape::{ErrorResponse, ScrapePayload, ScrapeResponse};
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn status_for(err: &ScrapeError) -> StatusCode {
    match err {
        ScrapeError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScrapeError::Network(_) | ScrapeError::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,
        ScrapeError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        ScrapeError::Malformed(_)
        | ScrapeError::EmptyContent
        | ScrapeError::InvalidRule(_)
        | ScrapeError::ClientSetup(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn api_error(err: &ScrapeError) -> ApiError {
    (
        status_for(err),
        Json(ErrorResponse {
            error: err.kind().to_string(),
            detail: Some(err.to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}

/// POST /scrape
pub async fn scrape_article(
    State(state): State<AppState>,
    Json(payload): Json<ScrapePayload>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    validate_url(&payload.url).map_err(|e| api_error(&ScrapeError::from(e)))?;
    tracing::info!(url = %payload.url, profile = ?payload.profile, "scrape requested");

    // Cancelled on deadline, or when the client goes away and this future is dropped.
    let cancel = CancellationToken::new();
    let _on_drop = cancel.clone().drop_guard();
    let deadline = {
        let cancel = cancel.clone();
        let after = state.request_deadline;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            cancel.cancel();
        })
    };

    let outcome = state
        .extractor
        .extract(&payload.url, payload.profile, &cancel)
        .await;
    deadline.abort();

    let record = outcome.map_err(|err| {
        tracing::error!(url = %payload.url, kind = err.kind(), error = %err, "scrape failed");
        api_error(&err)
    })?;

    if let Some(path) = state.output_path.clone() {
        let saved = record.clone();
        tokio::task::spawn_blocking(move || utils::persist_record(&saved, &path));
    }

    tracing::info!(title = %record.title, "scrape succeeded");
    Ok(Json(record.into()))
}

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Article extraction API",
        "endpoints": {
            "scrape": "POST /scrape {\"url\": \"...\", \"profile\": \"article\" | \"video_note\"}",
            "health": "GET /health"
        }
    }))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use article_scraper::{AttemptError, Extractor, FetchError, Profile, ScraperConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state(deadline: Duration) -> AppState {
        let config = ScraperConfig {
            backoff_unit: Duration::from_millis(5),
            ..ScraperConfig::default()
        };
        AppState::new(Extractor::new(&config).unwrap(), deadline, None)
    }

    fn payload(url: String) -> Json<ScrapePayload> {
        Json(ScrapePayload {
            url,
            profile: Profile::Article,
        })
    }

    #[test]
    fn error_kinds_map_to_statuses() {
        assert_eq!(
            status_for(&ScrapeError::InvalidInput("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&ScrapeError::Network(FetchError::Exhausted {
                attempts: 3,
                last_error: AttemptError::RetryableStatus(503),
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_for(&ScrapeError::Cancelled), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&ScrapeError::EmptyContent),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn invalid_url_is_unprocessable() {
        let err = scrape_article(
            State(state(Duration::from_secs(5))),
            payload("not-a-url".into()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.1.error, "invalid_input");
    }

    #[tokio::test]
    async fn extracted_record_is_returned_as_json() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<h1 class="entry-title">Hello</h1><div class="ts-segment">World</div>"#,
            ))
            .mount(&upstream)
            .await;

        let Json(body) = scrape_article(
            State(state(Duration::from_secs(5))),
            payload(format!("{}/post", upstream.uri())),
        )
        .await
        .unwrap();
        assert_eq!(body.title, "Hello");
        assert_eq!(body.content, "World");
        assert_eq!(body.video_link, None);
    }

    #[tokio::test]
    async fn deadline_cancels_slow_extraction() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&upstream)
            .await;

        let err = scrape_article(
            State(state(Duration::from_millis(100))),
            payload(format!("{}/slow", upstream.uri())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.1.error, "cancelled");
    }
}
