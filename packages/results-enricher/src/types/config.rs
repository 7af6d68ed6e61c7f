//! Configuration for transport and batch runs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::credentials::ApiKey;

/// Default Eventor installation.
pub const DEFAULT_BASE_URL: &str = "https://eventor.orientering.se";

/// Retry-with-backoff settings for the direct transport.
///
/// A transient failure of attempt `n` (zero-based) waits
/// `2^n * base_delay + random(0..max_jitter)` before the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Default: 3.
    pub max_retries: u32,

    /// Default: 1000 ms.
    pub base_delay: Duration,

    /// Upper bound of the random jitter. Default: 1000 ms.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping. Useful in tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Backoff after the failed zero-based `attempt`, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

/// Transport layer settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub retry: RetryPolicy,

    /// Base URL of the proxy collaborator. No proxy fallback when unset.
    pub proxy_url: Option<String>,

    /// Browser User-Agent sent on direct requests.
    pub user_agent: String,

    pub accept_language: String,

    /// Per-request timeout. None by default, leaving the retry loop as the
    /// only bound. A timed out request counts as a network error.
    pub request_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            proxy_url: None,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "sv-SE,sv;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            request_timeout: None,
        }
    }
}

impl TransportConfig {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Pause between rows. Default: 15 s.
    pub delay: Duration,

    /// Skip network and extraction, emitting rows with zeroed enrichment.
    pub dry_run: bool,

    /// Results site base URL.
    pub base_url: String,

    /// Enables the starter-count lookup through the proxy collaborator.
    pub api_key: Option<ApiKey>,

    /// Reuse the page of the previous row when the event id repeats.
    ///
    /// Default: true.
    pub reuse_pages: bool,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(15),
            dry_run: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            reuse_pages: true,
        }
    }
}

impl EnrichConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<ApiKey>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn with_page_reuse(mut self, reuse: bool) -> Self {
        self.reuse_pages = reuse;
        self
    }

    /// Results page URL for an event, grouped by class.
    pub fn result_url(&self, event_id: &str) -> String {
        format!(
            "{}/Events/ResultList?eventId={}&groupBy=EventClass",
            self.base_url.trim_end_matches('/'),
            event_id.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnrichConfig::default();
        assert_eq!(config.delay, Duration::from_secs(15));
        assert!(!config.dry_run);
        assert!(config.api_key.is_none());
        assert_eq!(RetryPolicy::default().max_retries, 3);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
        assert_eq!(RetryPolicy::immediate(3).backoff(2), Duration::ZERO);
    }

    #[test]
    fn test_no_request_timeout_unless_set() {
        assert_eq!(TransportConfig::default().request_timeout, None);
        let config = TransportConfig::default().with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_result_url() {
        let config = EnrichConfig::new().with_base_url("https://eventor.example/");
        assert_eq!(
            config.result_url(" 4711 "),
            "https://eventor.example/Events/ResultList?eventId=4711&groupBy=EventClass"
        );
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        assert!(EnrichConfig::new().with_api_key("").api_key.is_none());
        assert!(EnrichConfig::new().with_api_key("k").api_key.is_some());
    }
}
