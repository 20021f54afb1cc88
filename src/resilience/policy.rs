use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounded exponential backoff settings.
///
/// The wait before retry number `attempt` (counting from 0) is
/// `base_delay * 2^attempt` plus a uniform jitter in `[0, max_jitter]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first. Default: 3
    pub max_attempts: u32,
    /// Default: 300ms
    pub base_delay: Duration,
    /// Default: 100ms
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(300),
            max_jitter: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry `attempt`, excluding jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }
}
