//! Facts produced by the extraction engine.

use serde::{Deserialize, Serialize};

/// Course length and starter count for one class.
///
/// Always fully populated: a field that could not be extracted is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFacts {
    /// Meters
    pub length: u32,
    pub participants: u32,
}

impl ClassFacts {
    pub fn new(length: u32, participants: u32) -> Self {
        Self {
            length,
            participants,
        }
    }

    /// True when nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.length == 0 && self.participants == 0
    }
}

/// A placing and the size of the field it was achieved in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionFacts {
    pub position: u32,
    pub total: u32,
}

impl PositionFacts {
    pub fn new(position: u32, total: u32) -> Self {
        Self { position, total }
    }
}

/// Event-level facts read from the page header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub event_name: String,
    pub organizer: Option<String>,
}

/// Starter count reported by the proxy collaborator for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStarts {
    pub name: String,
    #[serde(default)]
    pub number_of_starts: u32,
}
