//! Persistence collaborator for runs, results, audit logs and the per-actor
//! processing state.
//!
//! Insert, update and select-by-key only. The orchestrator treats every
//! failure here as non-fatal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::{job::Job, log::LogEntry, row::EnrichedResult};

/// Per-actor processing state, including the external cancellation flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub actor: String,
    pub is_processing: bool,
    pub cancellation_requested: bool,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingState {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            is_processing: false,
            cancellation_requested: false,
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert a new run record.
    async fn create_run(&self, job: &Job) -> StoreResult<()>;

    /// Overwrite an existing run record.
    async fn update_run(&self, job: &Job) -> StoreResult<()>;

    async fn get_run(&self, run_id: Uuid) -> StoreResult<Option<Job>>;

    /// Append one enriched row to a run.
    async fn insert_result(&self, run_id: Uuid, result: &EnrichedResult) -> StoreResult<()>;

    /// Rows of a run in insertion order.
    async fn results_for_run(&self, run_id: Uuid) -> StoreResult<Vec<EnrichedResult>>;

    /// Append one audit entry to a run.
    async fn insert_log(&self, run_id: Uuid, entry: &LogEntry) -> StoreResult<()>;

    async fn logs_for_run(&self, run_id: Uuid) -> StoreResult<Vec<LogEntry>>;

    /// Processing state of an actor, if one was ever recorded.
    async fn processing_state(&self, actor: &str) -> StoreResult<Option<ProcessingState>>;

    /// Upsert the processing state of an actor.
    async fn set_processing_state(&self, state: &ProcessingState) -> StoreResult<()>;

    /// Whether someone asked the actor's running job to stop.
    async fn cancellation_requested(&self, actor: &str) -> StoreResult<bool> {
        Ok(self
            .processing_state(actor)
            .await?
            .map(|s| s.cancellation_requested)
            .unwrap_or(false))
    }

    /// Set or clear the external cancellation flag.
    async fn set_cancellation_requested(&self, actor: &str, requested: bool) -> StoreResult<()> {
        let mut state = self
            .processing_state(actor)
            .await?
            .unwrap_or_else(|| ProcessingState::new(actor));
        state.cancellation_requested = requested;
        state.updated_at = Utc::now();
        self.set_processing_state(&state).await
    }

    /// Mark the actor as processing or idle.
    async fn set_processing(&self, actor: &str, processing: bool) -> StoreResult<()> {
        let mut state = self
            .processing_state(actor)
            .await?
            .unwrap_or_else(|| ProcessingState::new(actor));
        state.is_processing = processing;
        state.updated_at = Utc::now();
        self.set_processing_state(&state).await
    }
}
