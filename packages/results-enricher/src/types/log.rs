//! Audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened at a network attempt or decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogStatus {
    /// A transport attempt returned a page.
    Fetched { transport: String, bytes: usize },
    /// A transport attempt failed.
    FetchFailed {
        transport: String,
        attempt: u32,
        error: String,
    },
    /// The page of the previous row was reused.
    Reused { bytes: usize },
    /// Extraction finished for a row.
    Extracted { length: u32, participants: u32 },
    /// Starter count taken from the proxy class list.
    StartsFromProxy { participants: u32 },
    /// Row skipped network and extraction.
    DryRun,
    /// Row failed and was emitted without enrichment.
    RowDegraded { reason: String },
    /// The run stopped before the next row.
    Stopped { reason: String },
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogStatus::Fetched { transport, bytes } => {
                write!(f, "{} ok ({} bytes)", transport, bytes)
            }
            LogStatus::FetchFailed {
                transport,
                attempt,
                error,
            } => write!(f, "{} attempt {} failed: {}", transport, attempt, error),
            LogStatus::Reused { bytes } => write!(f, "reused page ({} bytes)", bytes),
            LogStatus::Extracted {
                length,
                participants,
            } => write!(f, "extracted {} m, {} starters", length, participants),
            LogStatus::StartsFromProxy { participants } => {
                write!(f, "{} starters from class list", participants)
            }
            LogStatus::DryRun => f.write_str("dry run"),
            LogStatus::RowDegraded { reason } => write!(f, "row degraded: {}", reason),
            LogStatus::Stopped { reason } => write!(f, "stopped: {}", reason),
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub event_id: String,
    pub url: String,
    pub status: LogStatus,
}

impl LogEntry {
    pub fn new(event_id: impl Into<String>, url: impl Into<String>, status: LogStatus) -> Self {
        Self {
            timestamp: Utc::now(),
            event_id: event_id.into(),
            url: url.into(),
            status,
        }
    }
}
