use thiserror::Error;

/// Failure of a single fetch attempt. Only the last one of a run ever
/// reaches the caller, wrapped in [`FetchError::Exhausted`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("upstream returned retryable status {0}")]
    RetryableStatus(u16),
    #[error("upstream returned client error {0}")]
    ClientStatus(u16),
}

impl AttemptError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptError::ClientStatus(_))
    }
}

/// Terminal outcome of a fetch that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("client error: upstream returned status {status}")]
    ClientError { status: u16 },
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: AttemptError },
    #[error("fetch cancelled")]
    Cancelled,
}

/// Every way an extraction call can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Network(FetchError),
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("upstream rejected the request (code {code}): {message}")]
    UpstreamRejected { code: i64, message: String },
    #[error("no content could be extracted")]
    EmptyContent,
    #[error("extraction cancelled")]
    Cancelled,
    #[error("invalid extraction rule: {0}")]
    InvalidRule(String),
    #[error("http client setup failed: {0}")]
    ClientSetup(String),
}

/// Writing a record to disk failed. Never affects the extraction outcome.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FetchError> for ScrapeError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidInput(msg) => ScrapeError::InvalidInput(msg),
            FetchError::Cancelled => ScrapeError::Cancelled,
            other => ScrapeError::Network(other),
        }
    }
}

impl ScrapeError {
    /// Short stable name of the error kind, used in logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::InvalidInput(_) => "invalid_input",
            ScrapeError::Network(FetchError::ClientError { .. }) => "network.client_error",
            ScrapeError::Network(FetchError::Exhausted { last_error, .. }) => match last_error {
                AttemptError::Timeout(_) => "network.exhausted.timeout",
                AttemptError::ConnectionFailed(_) => "network.exhausted.connection_failed",
                _ => "network.exhausted",
            },
            ScrapeError::Network(_) => "network",
            ScrapeError::Malformed(_) => "parse.malformed",
            ScrapeError::UpstreamRejected { .. } => "upstream_rejected",
            ScrapeError::EmptyContent => "empty_content",
            ScrapeError::Cancelled => "cancelled",
            ScrapeError::InvalidRule(_) => "invalid_rule",
            ScrapeError::ClientSetup(_) => "client_setup",
        }
    }
}
