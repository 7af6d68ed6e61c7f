//! Audit sink for [`LogEntry`] records.

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::log::LogEntry;

/// Receives audit entries from the transport and the orchestrator.
///
/// Recording never fails from the caller's point of view; sinks that can
/// fail log the problem and drop the entry.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn record(&self, entry: LogEntry);
}

#[async_trait]
impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    async fn record(&self, entry: LogEntry) {
        (**self).record(entry).await
    }
}
