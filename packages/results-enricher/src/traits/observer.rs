//! Progress and partial-result reporting for batch runs.

use crate::types::row::EnrichedResult;

/// Observer of a running batch.
///
/// Both callbacks have no-op defaults, so implementors override only what
/// they need.
pub trait BatchObserver: Send + Sync {
    /// Called before each row with the current progress (0..=100) and a
    /// human-readable status.
    fn progress(&self, _progress: u8, _status: &str) {}

    /// Called after each row with every result collected so far.
    ///
    /// Returning `false` stops the run before the next row. Rows already
    /// collected are kept.
    fn partial_results(&self, _results: &[EnrichedResult]) -> bool {
        true
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}
