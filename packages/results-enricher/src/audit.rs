//! [`LogSink`] implementations: in-memory, persisted, tracing mirror and a
//! fan-out that feeds several sinks at once.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::traits::{log_sink::LogSink, store::ResultStore};
use crate::types::log::{LogEntry, LogStatus};

/// Keeps every entry in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entries recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LogSink for MemoryLog {
    async fn record(&self, entry: LogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

/// Persists entries to the `logs` collection of one run.
pub struct StoreLog<S: ResultStore + ?Sized> {
    store: Arc<S>,
    run_id: Uuid,
}

impl<S: ResultStore + ?Sized> StoreLog<S> {
    pub fn new(store: Arc<S>, run_id: Uuid) -> Self {
        Self { store, run_id }
    }
}

#[async_trait]
impl<S: ResultStore + ?Sized> LogSink for StoreLog<S> {
    async fn record(&self, entry: LogEntry) {
        if let Err(e) = self.store.insert_log(self.run_id, &entry).await {
            warn!(
                run_id = %self.run_id,
                event_id = %entry.event_id,
                error = %e,
                "Failed to persist log entry"
            );
        }
    }
}

/// Mirrors entries into `tracing`: failures at warn, everything else at info.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

#[async_trait]
impl LogSink for TracingLog {
    async fn record(&self, entry: LogEntry) {
        match &entry.status {
            LogStatus::FetchFailed { .. } | LogStatus::RowDegraded { .. } => warn!(
                event_id = %entry.event_id,
                url = %entry.url,
                status = %entry.status,
                "audit"
            ),
            _ => info!(
                event_id = %entry.event_id,
                url = %entry.url,
                status = %entry.status,
                "audit"
            ),
        }
    }
}

/// Forwards each entry to every inner sink, in order.
#[derive(Default)]
pub struct FanoutLog {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl LogSink for FanoutLog {
    async fn record(&self, entry: LogEntry) {
        for sink in &self.sinks {
            sink.record(entry.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;

    #[tokio::test]
    async fn test_fanout_reaches_memory_and_store() {
        let store = Arc::new(MemoryStore::new());
        let memory = Arc::new(MemoryLog::new());
        let run_id = Uuid::now_v7();

        let sink = FanoutLog::new()
            .with_sink(memory.clone())
            .with_sink(Arc::new(StoreLog::new(store.clone(), run_id)))
            .with_sink(Arc::new(TracingLog));

        sink.record(LogEntry::new(
            "4711",
            "https://eventor.example",
            LogStatus::Fetched {
                transport: "direct".into(),
                bytes: 120,
            },
        ))
        .await;
        sink.record(LogEntry::new("4711", "", LogStatus::DryRun)).await;

        assert_eq!(memory.len(), 2);
        let persisted = store.logs_for_run(run_id).await.unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[1].status, LogStatus::DryRun);
    }
}
