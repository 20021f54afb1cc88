//! Sleep and jitter sources for the executor.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

/// Suspends the current task between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Draws the random jitter added to each backoff.
pub trait JitterSource: Send + Sync {
    /// A value in `[0, max]`.
    fn jitter(&self, max: Duration) -> Duration;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Uniform jitter from the thread-local RNG, in whole milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn jitter(&self, max: Duration) -> Duration {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

#[cfg(any(test, feature = "mocks"))]
pub use recording::{FixedJitter, RecordingSleeper};

#[cfg(any(test, feature = "mocks"))]
mod recording {
    #![allow(clippy::unwrap_used)]

    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{JitterSource, Sleeper};

    /// Records requested sleeps and returns immediately.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSleeper {
        pub slept: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.slept.lock().unwrap().clone()
        }

        pub fn total(&self) -> Duration {
            self.slept.lock().unwrap().iter().sum()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    /// Always returns the same jitter, capped at the requested maximum.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FixedJitter(pub Duration);

    impl JitterSource for FixedJitter {
        fn jitter(&self, max: Duration) -> Duration {
            self.0.min(max)
        }
    }
}
