//! HTTP client for the proxy collaborator.
//!
//! The proxy is a small relay service with two JSON endpoints:
//!
//! - `POST {base}/fetch` with `{"url"}`, answering `{"html"}` or `{"error"}`
//! - `POST {base}/classes` with `{"apiKey", "eventId"}`, answering
//!   `{"classes": [{"name", "numberOfStarts"}]}` or `{"error"}`

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::credentials::ApiKey;
use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::ProxyClient;
use crate::types::facts::ClassStarts;

/// Transport name used in audit entries.
pub const PROXY: &str = "proxy";

#[derive(Serialize)]
struct FetchRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct FetchResponse {
    html: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassesRequest<'a> {
    api_key: &'a str,
    event_id: &'a str,
}

#[derive(Deserialize)]
struct ClassesResponse {
    #[serde(default)]
    classes: Vec<ClassStarts>,
    error: Option<String>,
}

pub struct HttpProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProxyClient {
    /// `timeout` bounds each proxy request; `None` leaves requests unbounded.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> FetchResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Proxy(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        path: &str,
        body: &B,
    ) -> FetchResult<R> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::Proxy(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Proxy(format!(
                "HTTP {} from proxy: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        resp.json()
            .await
            .map_err(|e| FetchError::Proxy(format!("invalid proxy response: {}", e)))
    }
}

#[async_trait]
impl ProxyClient for HttpProxyClient {
    async fn fetch_page(&self, url: &str) -> FetchResult<String> {
        let response: FetchResponse = self.post("fetch", &FetchRequest { url }).await?;
        match (response.html, response.error) {
            (Some(html), _) => Ok(html),
            (None, Some(error)) => Err(FetchError::Proxy(error)),
            (None, None) => Err(FetchError::Proxy("empty proxy response".to_string())),
        }
    }

    async fn class_starts(
        &self,
        event_id: &str,
        api_key: &ApiKey,
    ) -> FetchResult<Vec<ClassStarts>> {
        let request = ClassesRequest {
            api_key: api_key.expose(),
            event_id,
        };
        let response: ClassesResponse = self.post("classes", &request).await?;
        match response.error {
            Some(error) => Err(FetchError::Proxy(error)),
            None => Ok(response.classes),
        }
    }
}
