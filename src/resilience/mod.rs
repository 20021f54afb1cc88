//! Resilient operation executor.
//!
//! Wraps storage calls with error classification and bounded exponential
//! backoff. Only the transient codes (unavailable, aborted,
//! deadline-exceeded, resource-exhausted) are retried; everything else is
//! returned on the first failure.
//!
//! Sleep and jitter are injected through [`Sleeper`] and [`JitterSource`] so
//! retry timing is deterministic under test.

mod backoff;
mod classify;
mod executor;
mod policy;

pub use backoff::{JitterSource, Sleeper, ThreadRngJitter, TokioSleeper};
#[cfg(any(test, feature = "mocks"))]
pub use backoff::{FixedJitter, RecordingSleeper};
pub use classify::Classification;
pub use executor::ResilientExecutor;
pub use policy::RetryPolicy;
