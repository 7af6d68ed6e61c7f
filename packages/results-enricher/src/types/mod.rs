//! Data types shared by the extraction engine, transport and orchestrator.

pub mod config;
pub mod facts;
pub mod job;
pub mod log;
pub mod row;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, FetchErrorKind};

/// Result of fetching one page through the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success { html: String },
    Failure { kind: FetchErrorKind, message: String },
}

impl FetchOutcome {
    pub fn failure(err: &FetchError) -> Self {
        FetchOutcome::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            FetchOutcome::Success { html } => Some(html),
            FetchOutcome::Failure { .. } => None,
        }
    }
}
