//! Direct fetch first, proxy fallback second.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::direct::DirectFetcher;
use super::proxy::{HttpProxyClient, PROXY};
use crate::error::{FetchErrorKind, FetchResult};
use crate::traits::fetcher::{ProxyClient, ResultPageFetcher};
use crate::traits::log_sink::LogSink;
use crate::types::config::TransportConfig;
use crate::types::log::{LogEntry, LogStatus};
use crate::types::FetchOutcome;

/// The production [`ResultPageFetcher`].
///
/// Tries [`DirectFetcher`] with retries. When that fails for any reason,
/// including a 4xx, the page is requested once more through the proxy
/// collaborator if one is configured.
pub struct LayeredFetcher {
    direct: DirectFetcher,
    proxy: Option<Arc<dyn ProxyClient>>,
}

impl LayeredFetcher {
    /// Build from config. Uses [`HttpProxyClient`] when `proxy_url` is set.
    pub fn new(config: &TransportConfig) -> FetchResult<Self> {
        let direct = DirectFetcher::new(config)?;

        let proxy: Option<Arc<dyn ProxyClient>> = match &config.proxy_url {
            Some(url) if !url.trim().is_empty() => {
                info!(proxy_url = %url, "Proxy fallback enabled");
                Some(Arc::new(HttpProxyClient::new(
                    url.trim(),
                    config.request_timeout,
                )?))
            }
            _ => {
                info!("Proxy fallback disabled (no proxy URL)");
                None
            }
        };

        Ok(Self { direct, proxy })
    }

    /// Replace the proxy collaborator.
    pub fn with_proxy(mut self, proxy: Arc<dyn ProxyClient>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn proxy(&self) -> Option<Arc<dyn ProxyClient>> {
        self.proxy.clone()
    }
}

#[async_trait]
impl ResultPageFetcher for LayeredFetcher {
    async fn fetch_result_page(
        &self,
        event_id: &str,
        url: &str,
        log: &dyn LogSink,
    ) -> FetchOutcome {
        let direct_err = match self.direct.fetch_with_retry(event_id, url, log).await {
            Ok(html) => return FetchOutcome::Success { html },
            Err(e) => e,
        };

        let Some(proxy) = &self.proxy else {
            warn!(event_id = %event_id, url = %url, error = %direct_err, "Direct fetch failed and no proxy is configured");
            return FetchOutcome::failure(&direct_err);
        };

        warn!(
            event_id = %event_id,
            url = %url,
            error = %direct_err,
            "Direct fetch failed, falling back to proxy"
        );

        match proxy.fetch_page(url).await {
            Ok(html) => {
                log.record(LogEntry::new(
                    event_id,
                    url,
                    LogStatus::Fetched {
                        transport: PROXY.to_string(),
                        bytes: html.len(),
                    },
                ))
                .await;
                FetchOutcome::Success { html }
            }
            Err(proxy_err) => {
                log.record(LogEntry::new(
                    event_id,
                    url,
                    LogStatus::FetchFailed {
                        transport: PROXY.to_string(),
                        attempt: 1,
                        error: proxy_err.to_string(),
                    },
                ))
                .await;
                FetchOutcome::Failure {
                    kind: FetchErrorKind::Proxy,
                    message: format!("{}; {}", direct_err, proxy_err),
                }
            }
        }
    }
}
