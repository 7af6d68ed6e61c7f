//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{ProcessingState, ResultStore};
use crate::types::{job::Job, log::LogEntry, row::EnrichedResult};

/// In-memory storage for runs, results, logs and processing state.
///
/// Useful for testing and for the CLI. Not suitable for production as data is
/// lost on restart.
pub struct MemoryStore {
    runs: RwLock<HashMap<Uuid, Job>>,
    results: RwLock<HashMap<Uuid, Vec<EnrichedResult>>>,
    logs: RwLock<HashMap<Uuid, Vec<LogEntry>>>,
    states: RwLock<HashMap<String, ProcessingState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            results: RwLock::new(HashMap::new()),
            logs: RwLock::new(HashMap::new()),
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.runs.write().unwrap().clear();
        self.results.write().unwrap().clear();
        self.logs.write().unwrap().clear();
        self.states.write().unwrap().clear();
    }

    /// Get the number of stored runs.
    pub fn run_count(&self) -> usize {
        self.runs.read().unwrap().len()
    }

    /// All stored runs, oldest first.
    pub fn runs(&self) -> Vec<Job> {
        let mut runs: Vec<Job> = self.runs.read().unwrap().values().cloned().collect();
        runs.sort_by_key(|j| j.id);
        runs
    }

    /// Get the number of stored results across all runs.
    pub fn result_count(&self) -> usize {
        self.results.read().unwrap().values().map(Vec::len).sum()
    }

    /// Get the number of stored log entries across all runs.
    pub fn log_count(&self) -> usize {
        self.logs.read().unwrap().values().map(Vec::len).sum()
    }

    /// Raise the external cancellation flag for an actor.
    ///
    /// Synchronous so it can be called from observer callbacks.
    pub fn request_cancellation(&self, actor: &str) {
        let mut states = self.states.write().unwrap();
        let state = states
            .entry(actor.to_string())
            .or_insert_with(|| ProcessingState::new(actor));
        state.cancellation_requested = true;
        state.updated_at = chrono::Utc::now();
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn create_run(&self, job: &Job) -> StoreResult<()> {
        self.runs.write().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn update_run(&self, job: &Job) -> StoreResult<()> {
        let mut runs = self.runs.write().unwrap();
        match runs.get_mut(&job.id) {
            Some(existing) => {
                *existing = job.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                collection: "runs",
                key: job.id.to_string(),
            }),
        }
    }

    async fn get_run(&self, run_id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.runs.read().unwrap().get(&run_id).cloned())
    }

    async fn insert_result(&self, run_id: Uuid, result: &EnrichedResult) -> StoreResult<()> {
        self.results
            .write()
            .unwrap()
            .entry(run_id)
            .or_default()
            .push(result.clone());
        Ok(())
    }

    async fn results_for_run(&self, run_id: Uuid) -> StoreResult<Vec<EnrichedResult>> {
        Ok(self
            .results
            .read()
            .unwrap()
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_log(&self, run_id: Uuid, entry: &LogEntry) -> StoreResult<()> {
        self.logs
            .write()
            .unwrap()
            .entry(run_id)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn logs_for_run(&self, run_id: Uuid) -> StoreResult<Vec<LogEntry>> {
        Ok(self
            .logs
            .read()
            .unwrap()
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn processing_state(&self, actor: &str) -> StoreResult<Option<ProcessingState>> {
        Ok(self.states.read().unwrap().get(actor).cloned())
    }

    async fn set_processing_state(&self, state: &ProcessingState) -> StoreResult<()> {
        self.states
            .write()
            .unwrap()
            .insert(state.actor.clone(), state.clone());
        Ok(())
    }
}
