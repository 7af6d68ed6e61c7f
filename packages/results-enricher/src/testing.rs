//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the enrichment
//! pipeline without making network calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::credentials::ApiKey;
use crate::error::{FetchError, FetchErrorKind, FetchResult};
use crate::traits::{
    fetcher::{ProxyClient, ResultPageFetcher},
    log_sink::LogSink,
    observer::BatchObserver,
};
use crate::types::{
    facts::ClassStarts,
    log::{LogEntry, LogStatus},
    row::EnrichedResult,
    FetchOutcome,
};

/// Transport name the mock fetcher writes into audit entries.
pub const MOCK: &str = "mock";

/// A mock page fetcher keyed by event id.
///
/// Events without a configured outcome fail with a network error.
#[derive(Default)]
pub struct MockFetcher {
    /// Predefined outcomes by event id
    outcomes: Arc<RwLock<HashMap<String, FetchOutcome>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockFetchCall>>>,
}

/// Record of a call made to the mock fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFetchCall {
    pub event_id: String,
    pub url: String,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for an event.
    pub fn with_page(self, event_id: impl Into<String>, html: impl Into<String>) -> Self {
        self.outcomes.write().unwrap().insert(
            event_id.into(),
            FetchOutcome::Success { html: html.into() },
        );
        self
    }

    /// Fail every fetch of an event.
    pub fn with_failure(
        self,
        event_id: impl Into<String>,
        kind: FetchErrorKind,
        message: impl Into<String>,
    ) -> Self {
        self.outcomes.write().unwrap().insert(
            event_id.into(),
            FetchOutcome::Failure {
                kind,
                message: message.into(),
            },
        );
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockFetchCall> {
        self.calls.read().unwrap().clone()
    }

    /// Event ids fetched, in call order.
    pub fn fetched_events(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .map(|c| c.event_id.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl ResultPageFetcher for MockFetcher {
    async fn fetch_result_page(
        &self,
        event_id: &str,
        url: &str,
        log: &dyn LogSink,
    ) -> FetchOutcome {
        self.calls.write().unwrap().push(MockFetchCall {
            event_id: event_id.to_string(),
            url: url.to_string(),
        });

        let outcome = self
            .outcomes
            .read()
            .unwrap()
            .get(event_id)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::Failure {
                kind: FetchErrorKind::Network,
                message: format!("no page configured for event {}", event_id),
            });

        let status = match &outcome {
            FetchOutcome::Success { html } => LogStatus::Fetched {
                transport: MOCK.to_string(),
                bytes: html.len(),
            },
            FetchOutcome::Failure { message, .. } => LogStatus::FetchFailed {
                transport: MOCK.to_string(),
                attempt: 1,
                error: message.clone(),
            },
        };
        log.record(LogEntry::new(event_id, url, status)).await;

        outcome
    }
}

/// A mock proxy collaborator.
#[derive(Default)]
pub struct MockProxy {
    /// Predefined pages by URL
    pages: Arc<RwLock<HashMap<String, String>>>,

    /// Predefined class lists by event id
    classes: Arc<RwLock<HashMap<String, Vec<ClassStarts>>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockProxyCall>>>,
}

/// Record of a call made to the mock proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockProxyCall {
    FetchPage { url: String },
    ClassStarts { event_id: String },
}

impl MockProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), html.into());
        self
    }

    /// Add a class with its starter count to an event's class list.
    pub fn with_class(
        self,
        event_id: impl Into<String>,
        name: impl Into<String>,
        number_of_starts: u32,
    ) -> Self {
        self.classes
            .write()
            .unwrap()
            .entry(event_id.into())
            .or_default()
            .push(ClassStarts {
                name: name.into(),
                number_of_starts,
            });
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockProxyCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of class list lookups made.
    pub fn class_lookups(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockProxyCall::ClassStarts { .. }))
            .count()
    }
}

#[async_trait]
impl ProxyClient for MockProxy {
    async fn fetch_page(&self, url: &str) -> FetchResult<String> {
        self.calls.write().unwrap().push(MockProxyCall::FetchPage {
            url: url.to_string(),
        });
        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Proxy(format!("proxy could not fetch {}", url)))
    }

    async fn class_starts(
        &self,
        event_id: &str,
        _api_key: &ApiKey,
    ) -> FetchResult<Vec<ClassStarts>> {
        self.calls.write().unwrap().push(MockProxyCall::ClassStarts {
            event_id: event_id.to_string(),
        });
        self.classes
            .read()
            .unwrap()
            .get(event_id)
            .cloned()
            .ok_or_else(|| FetchError::Proxy(format!("unknown event {}", event_id)))
    }
}

type SnapshotHook = Box<dyn Fn(&[EnrichedResult]) + Send + Sync>;

/// Observer that records every callback and can stop a run after a given
/// number of rows.
#[derive(Default)]
pub struct RecordingObserver {
    progress: RwLock<Vec<(u8, String)>>,
    snapshots: RwLock<Vec<usize>>,
    stop_after: Option<usize>,
    hook: Option<SnapshotHook>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `false` from `partial_results` once `rows` results exist.
    pub fn stop_after(mut self, rows: usize) -> Self {
        self.stop_after = Some(rows);
        self
    }

    /// Run `hook` on every partial-results snapshot, before deciding whether
    /// to continue.
    pub fn with_hook(mut self, hook: impl Fn(&[EnrichedResult]) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Every progress report, in order.
    pub fn progress_reports(&self) -> Vec<(u8, String)> {
        self.progress.read().unwrap().clone()
    }

    /// Size of each partial-results snapshot, in order.
    pub fn snapshot_sizes(&self) -> Vec<usize> {
        self.snapshots.read().unwrap().clone()
    }
}

impl BatchObserver for RecordingObserver {
    fn progress(&self, progress: u8, status: &str) {
        self.progress
            .write()
            .unwrap()
            .push((progress, status.to_string()));
    }

    fn partial_results(&self, results: &[EnrichedResult]) -> bool {
        self.snapshots.write().unwrap().push(results.len());
        if let Some(hook) = &self.hook {
            hook(results);
        }
        self.stop_after.map_or(true, |n| results.len() < n)
    }
}
