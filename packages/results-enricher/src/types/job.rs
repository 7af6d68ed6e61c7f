//! Batch run bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Failed
        )
    }
}

/// Why a run stopped before the last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The partial-results observer returned `false`.
    ObserverDeclined,
    /// The cancellation token fired or the stored flag was set.
    CancellationRequested,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::ObserverDeclined => f.write_str("stopped by partial-results callback"),
            StopReason::CancellationRequested => f.write_str("cancellation requested"),
        }
    }
}

/// One batch run, persisted in the `runs` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Who started the run. At most one run per actor at a time.
    pub actor: String,
    pub name: String,
    pub status: JobStatus,
    /// 0..=100
    pub progress: u8,
    pub cancellation_requested: bool,
    pub total_rows: usize,
    pub processed_rows: usize,
    /// Rows where both length and starter count were found
    pub enriched_rows: usize,
    pub message: Option<String>,
    pub stop_reason: Option<StopReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(actor: impl Into<String>, name: impl Into<String>, total_rows: usize) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor: actor.into(),
            name: name.into(),
            status: JobStatus::Idle,
            progress: 0,
            cancellation_requested: false,
            total_rows,
            processed_rows: 0,
            enriched_rows: 0,
            message: None,
            stop_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to a terminal state. A run that got past its input reports 100%
    /// whether it completed or was cancelled.
    pub fn finish(&mut self, status: JobStatus, message: impl Into<String>) {
        self.status = status;
        self.message = Some(message.into());
        self.finished_at = Some(Utc::now());
        if status != JobStatus::Failed {
            self.progress = 100;
        }
    }
}

/// Progress reported before row `index` of `total`: 10 + floor(80 * index / total).
pub fn row_progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 10;
    }
    let pct = 10 + (80 * index.min(total)) / total;
    pct as u8
}
