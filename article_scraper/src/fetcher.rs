use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::future::retry_notify;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, RequestBuilder, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{AttemptError, FetchError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// One fetch, as asked for by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Applied to each attempt separately.
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// Deterministic exponential schedule: waits `unit * 2^i` after failed
/// attempt `i` (counting from zero) and stops once `max_attempts` attempts
/// have been made. Nothing is waited after the final attempt.
#[derive(Debug, Clone)]
pub struct AttemptBackoff {
    unit: Duration,
    max_attempts: u32,
    retries: u32,
}

impl AttemptBackoff {
    pub fn new(unit: Duration, max_attempts: u32) -> Self {
        Self {
            unit,
            max_attempts: max_attempts.max(1),
            retries: 0,
        }
    }

    /// Sum of every wait the schedule will hand out from a fresh start.
    pub fn total_delay(&self) -> Duration {
        let mut schedule = Self::new(self.unit, self.max_attempts);
        std::iter::from_fn(|| schedule.next_backoff()).sum()
    }
}

impl Backoff for AttemptBackoff {
    fn reset(&mut self) {
        self.retries = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries + 1 >= self.max_attempts {
            return None;
        }
        let delay = self.unit.checked_mul(1u32.checked_shl(self.retries)?)?;
        self.retries += 1;
        Some(delay)
    }
}

/// Per-target credentials, applied to every outgoing attempt.
pub trait RequestAuth: Send + Sync {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl RequestAuth for NoAuth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

/// Static headers such as a session `Cookie` or a `Referer`.
#[derive(Debug, Clone, Default)]
pub struct HeaderAuth {
    headers: HeaderMap,
}

impl HeaderAuth {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FetchError::InvalidInput(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FetchError::InvalidInput(format!("header value for {name}: {e}")))?;
            headers.insert(name, value);
        }
        Ok(Self { headers })
    }
}

impl RequestAuth for HeaderAuth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.headers(self.headers.clone())
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Base of the backoff schedule; one second in production.
    pub backoff_unit: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// HTTP GET with bounded retry. Cheap to share: the only state is the
/// connection pool inside the client.
pub struct Fetcher {
    client: Client,
    auth: Arc<dyn RequestAuth>,
    settings: FetchSettings,
}

impl Fetcher {
    pub fn new(settings: FetchSettings, auth: Arc<dyn RequestAuth>) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            auth,
            settings,
        })
    }

    pub async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        let url = validate_url(&request.url)?;
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let attempts = AtomicU32::new(0);
        let schedule = AttemptBackoff::new(self.settings.backoff_unit, request.max_attempts);
        let timeout = request.timeout;
        let (this, url_ref, counter) = (self, &url, &attempts);

        let run = retry_notify(
            schedule,
            || async move {
                let attempt = counter.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(url = %url_ref, attempt, "fetching");
                this.attempt(url_ref, timeout).await.map_err(|err| {
                    if err.is_retryable() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            },
            |err: AttemptError, wait: Duration| {
                tracing::warn!(
                    url = %url_ref,
                    error = %err,
                    wait = ?wait,
                    "fetch attempt failed, backing off"
                );
            },
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            outcome = run => outcome,
        };

        match outcome {
            Ok(body) => Ok(body),
            Err(AttemptError::ClientStatus(status)) => Err(FetchError::ClientError { status }),
            Err(last_error) => {
                let attempts = attempts.load(Ordering::Relaxed);
                tracing::warn!(url = %url, attempts, error = %last_error, "retries exhausted");
                Err(FetchError::Exhausted {
                    attempts,
                    last_error,
                })
            }
        }
    }

    async fn attempt(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, AttemptError> {
        let request = self.auth.apply(self.client.get(url.clone()).timeout(timeout));
        let response = request.send().await.map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let body = response.bytes().await.map_err(classify_transport)?;
        Ok(body.to_vec())
    }
}

/// Accepts only absolute http(s) URLs.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidInput(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidInput(format!(
            "{raw}: unsupported scheme {other:?}"
        ))),
    }
}

fn classify_status(status: StatusCode) -> AttemptError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AttemptError::RetryableStatus(status.as_u16())
    } else {
        AttemptError::ClientStatus(status.as_u16())
    }
}

fn classify_transport(err: reqwest::Error) -> AttemptError {
    if err.is_timeout() {
        AttemptError::Timeout(err.to_string())
    } else {
        AttemptError::ConnectionFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_doubles_and_stops_before_last_attempt() {
        let mut schedule = AttemptBackoff::new(Duration::from_secs(1), 4);
        let waits: Vec<_> = std::iter::from_fn(|| schedule.next_backoff()).collect();
        assert_eq!(
            waits,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn total_delay_is_sum_of_powers_of_two() {
        for n in 1..=6u32 {
            let expected: u64 = (0..n.saturating_sub(1)).map(|i| 1u64 << i).sum();
            let schedule = AttemptBackoff::new(Duration::from_millis(1), n);
            assert_eq!(schedule.total_delay(), Duration::from_millis(expected), "n = {n}");
        }
    }

    #[test]
    fn single_attempt_never_waits() {
        let mut schedule = AttemptBackoff::new(Duration::from_secs(1), 1);
        assert_eq!(schedule.next_backoff(), None);
    }

    #[test]
    fn reset_restarts_the_schedule() {
        let mut schedule = AttemptBackoff::new(Duration::from_secs(1), 3);
        schedule.next_backoff();
        schedule.next_backoff();
        assert_eq!(schedule.next_backoff(), None);
        schedule.reset();
        assert_eq!(schedule.next_backoff(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(validate_url("https://example.com/post").is_ok());
        assert!(matches!(
            validate_url("ftp://example.com/file"),
            Err(FetchError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_url("/relative/path"),
            Err(FetchError::InvalidInput(_))
        ));
    }

    #[test]
    fn too_many_requests_and_5xx_are_retryable() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            AttemptError::RetryableStatus(429)
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            AttemptError::RetryableStatus(502)
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            AttemptError::ClientStatus(404)
        );
    }

    #[test]
    fn header_auth_rejects_bad_header_names() {
        assert!(HeaderAuth::from_pairs([("Cookie", "a=b")]).is_ok());
        assert!(HeaderAuth::from_pairs([("bad header", "x")]).is_err());
    }

    #[test]
    fn request_clamps_attempts_to_one() {
        let request = FetchRequest::new("https://example.com").with_max_attempts(0);
        assert_eq!(request.max_attempts, 1);
        assert_eq!(request.timeout, DEFAULT_TIMEOUT);
    }
}
