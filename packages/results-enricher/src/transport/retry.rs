//! Backoff timing for the direct transport.

use std::time::Duration;

use crate::types::config::RetryPolicy;

/// Wait after the failed zero-based `attempt`: exponential backoff plus a
/// uniformly random jitter in `0..=max_jitter`.
pub fn jittered_backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
    let jitter_ms = u64::try_from(policy.max_jitter.as_millis()).unwrap_or(u64::MAX);
    let jitter = if jitter_ms == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis(fastrand::u64(0..=jitter_ms))
    };
    policy.backoff(attempt).saturating_add(jitter)
}

/// Total attempts allowed by a policy. At least one.
pub fn attempts(policy: &RetryPolicy) -> u32 {
    policy.max_retries.max(1)
}
