//! Typed errors for the enrichment pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match
//! on what went wrong. Transport failures never escape the transport layer as
//! errors; they are folded into [`FetchOutcome`](crate::types::FetchOutcome).

use thiserror::Error;

/// Errors that abort a whole batch.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The input rows could not be parsed at all.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A job for this actor is already running.
    #[error("a job is already running for actor {actor}")]
    AlreadyRunning { actor: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Storage operation failed outside the per-row boundary
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Classification of a failed fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Connection, DNS or body read failure. Transient.
    Network,
    /// 4xx response. Terminal.
    HttpClient,
    /// 5xx response. Transient.
    HttpServer,
    /// Both the direct and the proxy transport failed.
    Proxy,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Network => "network_error",
            FetchErrorKind::HttpClient => "http_client_error",
            FetchErrorKind::HttpServer => "http_server_error",
            FetchErrorKind::Proxy => "proxy_error",
        }
    }
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a single transport attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request could not be sent or the body could not be read
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a client error status
    #[error("HTTP {status} for {url}")]
    HttpClient { status: u16, url: String },

    /// Server answered with a server error status
    #[error("HTTP {status} for {url}")]
    HttpServer { status: u16, url: String },

    /// Proxy collaborator returned a structured error or was unreachable
    #[error("proxy error: {0}")]
    Proxy(String),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network(_) => FetchErrorKind::Network,
            FetchError::HttpClient { .. } => FetchErrorKind::HttpClient,
            FetchError::HttpServer { .. } => FetchErrorKind::HttpServer,
            FetchError::Proxy(_) => FetchErrorKind::Proxy,
        }
    }

    /// Client errors are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::HttpServer { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Errors from the persistence collaborator.
///
/// The orchestrator logs and swallows these inside a run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found
    #[error("{collection} record not found: {key}")]
    NotFound {
        collection: &'static str,
        key: String,
    },

    /// Backend failure
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Result type alias for transport attempts.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
