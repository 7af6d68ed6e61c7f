//! Page transport seams.

use async_trait::async_trait;

use crate::credentials::ApiKey;
use crate::error::FetchResult;
use crate::traits::log_sink::LogSink;
use crate::types::{facts::ClassStarts, FetchOutcome};

/// Fetches a results page through whatever transports are configured.
///
/// Never returns an error: every failure is folded into
/// [`FetchOutcome::Failure`] and every attempt is recorded in `log`.
#[async_trait]
pub trait ResultPageFetcher: Send + Sync {
    async fn fetch_result_page(&self, event_id: &str, url: &str, log: &dyn LogSink)
        -> FetchOutcome;
}

/// The proxy collaborator: a relay that fetches pages on our behalf and
/// exposes the site's class list API.
#[async_trait]
pub trait ProxyClient: Send + Sync {
    /// Fetch `url` through the proxy. Single attempt.
    async fn fetch_page(&self, url: &str) -> FetchResult<String>;

    /// Classes of an event with their starter counts.
    async fn class_starts(&self, event_id: &str, api_key: &ApiKey)
        -> FetchResult<Vec<ClassStarts>>;
}
