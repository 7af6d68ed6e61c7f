//! Batch orchestrator: drives source rows through transport and extraction.
//!
//! Rows are processed strictly in order, one network call at a time, with a
//! configurable pause between rows. A run ends `Completed` after the last
//! row, `Cancelled` when the observer declines more results or cancellation
//! is requested, and `Failed` only when the input itself is unusable.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audit::{FanoutLog, MemoryLog, StoreLog, TracingLog};
use crate::document::{normalize_ws, HtmlDocument};
use crate::error::{EnrichError, FetchErrorKind, Result};
use crate::extract::{class_facts_in, date_in, event_info_in, UNKNOWN_EVENT};
use crate::traits::{
    fetcher::{ProxyClient, ResultPageFetcher},
    log_sink::LogSink,
    observer::BatchObserver,
    store::ResultStore,
};
use crate::types::{
    config::EnrichConfig,
    facts::ClassStarts,
    job::{row_progress, Job, JobStatus, StopReason},
    log::{LogEntry, LogStatus},
    row::{EnrichedResult, SourceRow},
    FetchOutcome,
};

/// Transport name for class list lookups in audit entries.
const PROXY_CLASSES: &str = "proxy_classes";

/// Why a single row was emitted without enrichment.
#[derive(Debug, Error)]
enum RowError {
    #[error("row has no event id")]
    MissingEventId,

    #[error("{kind}: {message}")]
    Fetch {
        kind: FetchErrorKind,
        message: String,
    },
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub job: Job,
    /// Enriched rows in input order. Shorter than the input when the run
    /// stopped early.
    pub results: Vec<EnrichedResult>,
    /// Audit entries of this run, in order.
    pub log: Vec<LogEntry>,
}

/// Per-run scratch state.
#[derive(Default)]
struct RunState {
    /// Page of the previous row: (event id, html)
    last_page: Option<(String, String)>,
    /// Class lists fetched from the proxy, `None` when the lookup failed
    class_lists: HashMap<String, Option<Vec<ClassStarts>>>,
}

/// Removes the actor from the running set when the run ends, however it ends.
struct ActorGuard<'a> {
    running: &'a Mutex<HashSet<String>>,
    actor: String,
}

impl Drop for ActorGuard<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.actor);
    }
}

/// Runs batches of source rows for any number of actors, one run per actor
/// at a time.
pub struct BatchEnricher {
    fetcher: Arc<dyn ResultPageFetcher>,
    proxy: Option<Arc<dyn ProxyClient>>,
    store: Arc<dyn ResultStore>,
    config: EnrichConfig,
    running: Mutex<HashSet<String>>,
}

impl BatchEnricher {
    pub fn new(
        fetcher: Arc<dyn ResultPageFetcher>,
        store: Arc<dyn ResultStore>,
        config: EnrichConfig,
    ) -> Self {
        Self {
            fetcher,
            proxy: None,
            store,
            config,
            running: Mutex::new(HashSet::new()),
        }
    }

    /// Enable the starter-count lookup. Only used when the config also
    /// carries an API key.
    pub fn with_proxy(mut self, proxy: Arc<dyn ProxyClient>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Whether a run is in progress for `actor` in this process.
    pub fn is_running(&self, actor: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(actor)
    }

    /// Ask the actor's running job to stop before its next row.
    pub async fn request_cancellation(&self, actor: &str) -> Result<()> {
        self.store.set_cancellation_requested(actor, true).await?;
        info!(actor = %actor, "Cancellation requested");
        Ok(())
    }

    /// Parse a JSON array of source rows and run it.
    ///
    /// The actor is claimed before parsing, so bad input never touches the
    /// state of a run already in progress. Unparsable input records a
    /// `Failed` run and returns [`EnrichError::InvalidInput`].
    pub async fn run_json(
        &self,
        actor: &str,
        name: &str,
        input: &str,
        observer: &dyn BatchObserver,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome> {
        let _guard = self.claim(actor)?;

        let rows: Vec<SourceRow> = match serde_json::from_str(input) {
            Ok(rows) => rows,
            Err(e) => {
                let reason = e.to_string();
                warn!(actor = %actor, error = %reason, "Input rows could not be parsed");

                let mut job = Job::new(actor, name, 0);
                job.finish(JobStatus::Failed, format!("Invalid input: {}", reason));
                if let Err(e) = self.store.create_run(&job).await {
                    warn!(run_id = %job.id, error = %e, "Failed to persist failed run");
                }
                self.clear_actor_state(actor).await;

                return Err(EnrichError::InvalidInput { reason });
            }
        };

        self.execute(actor, name, rows, observer, cancel).await
    }

    /// Enrich `rows` in order.
    ///
    /// Per-row failures never abort the run: the row is emitted with zeroed
    /// enrichment and a `row_degraded` audit entry. Cancellation is checked
    /// after each row's partial-results callback and after the pause between
    /// rows; an in-flight fetch is never interrupted.
    pub async fn run(
        &self,
        actor: &str,
        name: &str,
        rows: Vec<SourceRow>,
        observer: &dyn BatchObserver,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome> {
        let _guard = self.claim(actor)?;
        self.execute(actor, name, rows, observer, cancel).await
    }

    /// Body of a run. The caller holds the actor's claim.
    async fn execute(
        &self,
        actor: &str,
        name: &str,
        rows: Vec<SourceRow>,
        observer: &dyn BatchObserver,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome> {
        let mut job = Job::new(actor, name, rows.len());
        job.status = JobStatus::Running;
        job.progress = row_progress(0, rows.len());
        info!(
            run_id = %job.id,
            actor = %actor,
            rows = rows.len(),
            dry_run = self.config.dry_run,
            "Batch run started"
        );

        // A flag left over from an earlier run must not stop this one.
        if let Err(e) = self.store.set_cancellation_requested(actor, false).await {
            warn!(actor = %actor, error = %e, "Failed to clear stale cancellation flag");
        }
        if let Err(e) = self.store.set_processing(actor, true).await {
            warn!(actor = %actor, error = %e, "Failed to mark actor as processing");
        }
        if let Err(e) = self.store.create_run(&job).await {
            warn!(run_id = %job.id, error = %e, "Failed to persist run");
        }

        let memory = Arc::new(MemoryLog::new());
        let log = FanoutLog::new()
            .with_sink(memory.clone())
            .with_sink(Arc::new(StoreLog::new(self.store.clone(), job.id)))
            .with_sink(Arc::new(TracingLog));

        let (results, stop) = self
            .process_rows(&mut job, &rows, observer, cancel, &log)
            .await;

        match stop {
            Some(reason) => {
                job.stop_reason = Some(reason);
                job.cancellation_requested = reason == StopReason::CancellationRequested;
                log.record(LogEntry::new(
                    "",
                    "",
                    LogStatus::Stopped {
                        reason: reason.to_string(),
                    },
                ))
                .await;
                job.finish(
                    JobStatus::Cancelled,
                    format!("Stopped after {} of {} rows: {}", results.len(), rows.len(), reason),
                );
            }
            None => {
                job.finish(
                    JobStatus::Completed,
                    format!(
                        "Processed {} rows, {} fully enriched",
                        job.processed_rows, job.enriched_rows
                    ),
                );
            }
        }

        observer.progress(job.progress, job.message.as_deref().unwrap_or_default());

        if let Err(e) = self.store.update_run(&job).await {
            warn!(run_id = %job.id, error = %e, "Failed to persist final run state");
        }
        self.clear_actor_state(actor).await;

        info!(
            run_id = %job.id,
            actor = %actor,
            status = ?job.status,
            processed = job.processed_rows,
            enriched = job.enriched_rows,
            "Batch run finished"
        );

        Ok(BatchOutcome {
            job,
            results,
            log: memory.entries(),
        })
    }

    fn claim(&self, actor: &str) -> Result<ActorGuard<'_>> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(actor.to_string()) {
            return Err(EnrichError::AlreadyRunning {
                actor: actor.to_string(),
            });
        }
        Ok(ActorGuard {
            running: &self.running,
            actor: actor.to_string(),
        })
    }

    /// Clears the cancellation flag and the processing marker.
    async fn clear_actor_state(&self, actor: &str) {
        if let Err(e) = self.store.set_cancellation_requested(actor, false).await {
            warn!(actor = %actor, error = %e, "Failed to clear cancellation flag");
        }
        if let Err(e) = self.store.set_processing(actor, false).await {
            warn!(actor = %actor, error = %e, "Failed to clear processing marker");
        }
    }

    async fn process_rows(
        &self,
        job: &mut Job,
        rows: &[SourceRow],
        observer: &dyn BatchObserver,
        cancel: &CancellationToken,
        log: &dyn LogSink,
    ) -> (Vec<EnrichedResult>, Option<StopReason>) {
        let total = rows.len();
        let mut results = Vec::with_capacity(total);
        let mut state = RunState::default();

        for (index, row) in rows.iter().enumerate() {
            let mut result = EnrichedResult::from_row(row);

            let progress = row_progress(index, total);
            job.progress = progress;
            observer.progress(
                progress,
                &format!(
                    "Row {} of {}: {} ({})",
                    index + 1,
                    total,
                    result.name,
                    result.event_id
                ),
            );

            if self.config.dry_run {
                log.record(LogEntry::new(
                    result.event_id.clone(),
                    self.config.result_url(&result.event_id),
                    LogStatus::DryRun,
                ))
                .await;
            } else if let Err(e) = self.enrich_row(&mut result, &mut state, log).await {
                warn!(
                    row = index + 1,
                    event_id = %result.event_id,
                    class = %result.class_name,
                    error = %e,
                    "Row left unenriched"
                );
                log.record(LogEntry::new(
                    result.event_id.clone(),
                    self.config.result_url(&result.event_id),
                    LogStatus::RowDegraded {
                        reason: e.to_string(),
                    },
                ))
                .await;
            }

            job.processed_rows += 1;
            if result.is_fully_enriched() {
                job.enriched_rows += 1;
            }
            if let Err(e) = self.store.insert_result(job.id, &result).await {
                warn!(run_id = %job.id, row = index + 1, error = %e, "Failed to persist result");
            }
            results.push(result);
            if let Err(e) = self.store.update_run(job).await {
                warn!(run_id = %job.id, error = %e, "Failed to persist run progress");
            }

            if !observer.partial_results(&results) {
                info!(run_id = %job.id, rows = results.len(), "Observer declined further rows");
                return (results, Some(StopReason::ObserverDeclined));
            }

            if self.cancellation_requested(&job.actor, cancel).await {
                info!(run_id = %job.id, rows = results.len(), "Cancellation requested");
                return (results, Some(StopReason::CancellationRequested));
            }

            if index + 1 < total && !self.config.delay.is_zero() {
                debug!(delay_ms = self.config.delay.as_millis() as u64, "Pausing before next row");
                tokio::select! {
                    _ = tokio::time::sleep(self.config.delay) => {}
                    _ = cancel.cancelled() => {}
                }
                if self.cancellation_requested(&job.actor, cancel).await {
                    info!(run_id = %job.id, rows = results.len(), "Cancellation requested during pause");
                    return (results, Some(StopReason::CancellationRequested));
                }
            }
        }

        (results, None)
    }

    async fn cancellation_requested(&self, actor: &str, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return true;
        }
        match self.store.cancellation_requested(actor).await {
            Ok(requested) => requested,
            Err(e) => {
                warn!(actor = %actor, error = %e, "Failed to read cancellation flag");
                false
            }
        }
    }

    /// Fetch the row's page and extract its facts. Extraction misses leave
    /// zeros; only a missing event id or a failed fetch is an error.
    async fn enrich_row(
        &self,
        result: &mut EnrichedResult,
        state: &mut RunState,
        log: &dyn LogSink,
    ) -> std::result::Result<(), RowError> {
        if result.event_id.is_empty() {
            return Err(RowError::MissingEventId);
        }
        let url = self.config.result_url(&result.event_id);

        let page = self.page_for(&result.event_id, &url, state, log).await;
        if let Ok(html) = &page {
            apply_page(result, html);
            log.record(LogEntry::new(
                result.event_id.clone(),
                url.clone(),
                LogStatus::Extracted {
                    length: result.length,
                    participants: result.total_participants,
                },
            ))
            .await;
        }

        if result.total_participants == 0 {
            self.complement_starts(result, &url, state, log).await;
        }

        page.map(|_| ())
    }

    async fn page_for(
        &self,
        event_id: &str,
        url: &str,
        state: &mut RunState,
        log: &dyn LogSink,
    ) -> std::result::Result<String, RowError> {
        if self.config.reuse_pages {
            if let Some((cached_event, html)) = &state.last_page {
                if cached_event == event_id {
                    log.record(LogEntry::new(
                        event_id,
                        url,
                        LogStatus::Reused { bytes: html.len() },
                    ))
                    .await;
                    return Ok(html.clone());
                }
            }
        }

        match self.fetcher.fetch_result_page(event_id, url, log).await {
            FetchOutcome::Success { html } => {
                state.last_page = Some((event_id.to_string(), html.clone()));
                Ok(html)
            }
            FetchOutcome::Failure { kind, message } => {
                state.last_page = None;
                Err(RowError::Fetch { kind, message })
            }
        }
    }

    /// Fill a missing starter count from the proxy's class list. The list is
    /// fetched at most once per event per run.
    async fn complement_starts(
        &self,
        result: &mut EnrichedResult,
        url: &str,
        state: &mut RunState,
        log: &dyn LogSink,
    ) {
        let (Some(proxy), Some(api_key)) = (&self.proxy, &self.config.api_key) else {
            return;
        };

        if !state.class_lists.contains_key(&result.event_id) {
            let list = match proxy.class_starts(&result.event_id, api_key).await {
                Ok(list) => Some(list),
                Err(e) => {
                    log.record(LogEntry::new(
                        result.event_id.clone(),
                        url,
                        LogStatus::FetchFailed {
                            transport: PROXY_CLASSES.to_string(),
                            attempt: 1,
                            error: e.to_string(),
                        },
                    ))
                    .await;
                    None
                }
            };
            state.class_lists.insert(result.event_id.clone(), list);
        }

        let Some(Some(classes)) = state.class_lists.get(&result.event_id) else {
            return;
        };
        // Class names carry å, ä and ö, so fold case beyond ASCII.
        let class_name = normalize_ws(&result.class_name).to_lowercase();
        let starts = classes
            .iter()
            .find(|c| normalize_ws(&c.name).to_lowercase() == class_name)
            .map(|c| c.number_of_starts)
            .unwrap_or(0);

        if starts > 0 {
            result.total_participants = starts;
            log.record(LogEntry::new(
                result.event_id.clone(),
                url,
                LogStatus::StartsFromProxy {
                    participants: starts,
                },
            ))
            .await;
        }
    }
}

/// Copy page facts onto a row. Page values replace row values only when the
/// page actually has them.
fn apply_page(result: &mut EnrichedResult, html: &str) {
    let document = HtmlDocument::parse(html);

    let facts = class_facts_in(&document, &result.class_name);
    result.length = facts.length;
    result.total_participants = facts.participants;

    let info = event_info_in(&document);
    if info.event_name != UNKNOWN_EVENT || result.event_name.is_empty() {
        result.event_name = info.event_name;
    }
    if let Some(organizer) = info.organizer {
        result.organizer = organizer;
    }

    let date = date_in(&document);
    if !date.is_empty() {
        result.date = date;
    }
}
