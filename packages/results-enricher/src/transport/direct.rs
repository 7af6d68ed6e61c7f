//! Direct HTTP transport with browser-like headers and retry-with-backoff.

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use super::retry::{attempts, jittered_backoff};
use crate::error::{FetchError, FetchResult};
use crate::traits::log_sink::LogSink;
use crate::types::config::{RetryPolicy, TransportConfig};
use crate::types::log::{LogEntry, LogStatus};

/// Transport name used in audit entries.
pub const DIRECT: &str = "direct";

/// GETs pages straight from the results site.
pub struct DirectFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl DirectFetcher {
    pub fn new(config: &TransportConfig) -> FetchResult<Self> {
        // Look like a browser; the site answers bots with 403.
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .map_err(|e| FetchError::Network(format!("invalid Accept-Language: {}", e)))?,
        );
        headers.insert(reqwest::header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            reqwest::header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    /// One GET. 2xx and 3xx succeed, 4xx and 5xx are classified errors.
    pub async fn get_once(&self, url: &str) -> FetchResult<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_client_error() {
            return Err(FetchError::HttpClient {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        if status.is_server_error() {
            return Err(FetchError::HttpServer {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    /// GET with retries. Client errors end the loop at once; server and
    /// network errors are retried until the policy's attempts run out, and the
    /// last error is returned.
    pub async fn fetch_with_retry(
        &self,
        event_id: &str,
        url: &str,
        log: &dyn LogSink,
    ) -> FetchResult<String> {
        let max_attempts = attempts(&self.retry);
        let mut attempt = 0;

        loop {
            match self.get_once(url).await {
                Ok(html) => {
                    debug!(event_id = %event_id, url = %url, attempt = attempt + 1, bytes = html.len(), "Direct fetch succeeded");
                    log.record(LogEntry::new(
                        event_id,
                        url,
                        LogStatus::Fetched {
                            transport: DIRECT.to_string(),
                            bytes: html.len(),
                        },
                    ))
                    .await;
                    return Ok(html);
                }
                Err(e) => {
                    log.record(LogEntry::new(
                        event_id,
                        url,
                        LogStatus::FetchFailed {
                            transport: DIRECT.to_string(),
                            attempt: attempt + 1,
                            error: e.to_string(),
                        },
                    ))
                    .await;

                    if !e.is_retryable() || attempt + 1 >= max_attempts {
                        return Err(e);
                    }

                    let wait = jittered_backoff(&self.retry, attempt);
                    warn!(
                        event_id = %event_id,
                        url = %url,
                        attempt = attempt + 1,
                        error = %e,
                        wait_ms = wait.as_millis() as u64,
                        "Direct fetch failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
