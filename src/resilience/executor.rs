use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::json;

use super::{
    Classification, JitterSource, RetryPolicy, Sleeper, ThreadRngJitter, TokioSleeper,
};
use crate::audit::{actions, AuditEvent, AuditTrail, Severity};
use crate::repository::StoreError;

/// Runs storage operations with classification-based retry.
///
/// Each call keeps its own attempt counter, so one executor can be shared by
/// any number of concurrent callers. Before every retry a `storage.retry`
/// warning is written to the audit trail.
#[derive(Clone)]
pub struct ResilientExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn JitterSource>,
    audit: AuditTrail,
}

impl ResilientExecutor {
    /// Creates an executor that sleeps on the tokio timer and draws jitter
    /// from the thread RNG.
    pub fn new(policy: RetryPolicy, audit: AuditTrail) -> Self {
        Self::with_sources(policy, TokioSleeper, ThreadRngJitter, audit)
    }

    /// Creates an executor with explicit sleep and jitter sources.
    pub fn with_sources(
        policy: RetryPolicy,
        sleeper: impl Sleeper + 'static,
        jitter: impl JitterSource + 'static,
        audit: AuditTrail,
    ) -> Self {
        Self {
            policy,
            sleeper: Arc::new(sleeper),
            jitter: Arc::new(jitter),
            audit,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Runs a storage operation under the default policy, classifying
    /// failures by their [`StoreErrorCode`](crate::repository::StoreErrorCode).
    pub async fn execute<T, F, Fut>(&self, operation: &str, op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let policy = self.policy.clone();
        self.execute_with(operation, &policy, StoreError::classification, op)
            .await
    }

    /// Runs `op` until it succeeds, fails terminally, or `policy.max_attempts`
    /// attempts have been made. The last error is returned as is.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resilient_execute", skip_all, fields(operation = %operation))
    )]
    pub async fn execute_with<T, E, F, Fut, C>(
        &self,
        operation: &str,
        policy: &RetryPolicy,
        classify: C,
        mut op: F,
    ) -> Result<T, E>
    where
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> Classification,
    {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let class = classify(&err);
            if !class.retryable {
                return Err(err);
            }

            if attempt + 1 >= max_attempts {
                log::warn!(
                    target: "leasehold",
                    "msg=\"retries exhausted\", operation=\"{operation}\", code=\"{}\", attempts={max_attempts}, error=\"{err}\"",
                    class.code
                );
                return Err(err);
            }

            let delay = policy
                .backoff(attempt)
                .saturating_add(self.jitter.jitter(policy.max_jitter));
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);

            log::warn!(
                target: "leasehold",
                "msg=\"retrying storage operation\", operation=\"{operation}\", code=\"{}\", attempt={}, delay_ms={delay_ms}",
                class.code,
                attempt + 1
            );

            self.audit
                .record(
                    AuditEvent::new("system", actions::STORAGE_RETRY, "operation", operation)
                        .with_severity(Severity::Warning)
                        .with_metadata(json!({
                            "operation": operation,
                            "code": class.code.as_str(),
                            "attempt": attempt + 1,
                            "delay_ms": delay_ms,
                        })),
                )
                .await;

            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::repository::StoreErrorCode;
    use crate::resilience::{FixedJitter, RecordingSleeper};

    fn setup(jitter_ms: u64) -> (ResilientExecutor, RecordingSleeper, MemoryAuditSink) {
        let sleeper = RecordingSleeper::new();
        let sink = MemoryAuditSink::new();
        let executor = ResilientExecutor::with_sources(
            RetryPolicy::default(),
            sleeper.clone(),
            FixedJitter(Duration::from_millis(jitter_ms)),
            AuditTrail::new().with_sink(sink.clone()),
        );
        (executor, sleeper, sink)
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt_after_two_unavailable() {
        let (executor, sleeper, sink) = setup(40);
        let calls = &AtomicU32::new(0);

        let result = executor
            .execute("profiles.create", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(StoreError::unavailable("backend down"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_millis(340), Duration::from_millis(640)]
        );
        assert!(sleeper.total() >= Duration::from_millis(300 * (1 + 2)));

        let retries = sink.with_action(actions::STORAGE_RETRY);
        assert_eq!(retries.len(), 2);
        assert_eq!(retries[0].severity, Severity::Warning);
        assert_eq!(retries[0].entity_id, "profiles.create");
        assert_eq!(retries[0].meta_str("code"), Some("unavailable"));
        assert_eq!(retries[0].metadata["attempt"], 1);
        assert_eq!(retries[1].metadata["attempt"], 2);
        assert_eq!(retries[1].metadata["delay_ms"], 640);
    }

    #[tokio::test]
    async fn test_terminal_error_returns_immediately() {
        let (executor, sleeper, sink) = setup(40);
        let calls = &AtomicU32::new(0);

        let result: Result<(), StoreError> = executor
            .execute("invitations.create", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::new(StoreErrorCode::PermissionDenied, "nope"))
            })
            .await;

        assert_eq!(result.unwrap_err().code, StoreErrorCode::PermissionDenied);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.sleeps().is_empty());
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error_without_extra_delay() {
        let (executor, sleeper, sink) = setup(0);
        let calls = &AtomicU32::new(0);

        let result: Result<(), StoreError> = executor
            .execute("properties.find_by_id", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::new(
                    StoreErrorCode::Aborted,
                    format!("attempt {n}"),
                ))
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.code, StoreErrorCode::Aborted);
        assert_eq!(err.message, "attempt 2");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.sleeps().len(), 2);
        assert_eq!(sink.events().len(), 2);
    }

    #[tokio::test]
    async fn test_custom_classifier_and_policy() {
        let (executor, sleeper, _sink) = setup(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            max_jitter: Duration::ZERO,
        };
        let calls = &AtomicU32::new(0);

        let result = executor
            .execute_with(
                "custom",
                &policy,
                |e: &String| {
                    if e == "busy" {
                        Classification::of(StoreErrorCode::ResourceExhausted)
                    } else {
                        Classification::terminal(StoreErrorCode::Unknown)
                    }
                },
                || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 4 {
                        Err("busy".to_owned())
                    } else {
                        Ok("done")
                    }
                },
            )
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(
            sleeper.sleeps(),
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(40),
                Duration::from_millis(80),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_callers_have_independent_counters() {
        let (executor, sleeper, sink) = setup(0);
        let a_calls = &AtomicU32::new(0);
        let b_calls = &AtomicU32::new(0);

        let a = executor.execute("op", || async move {
            if a_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::unavailable("a"))
            } else {
                Ok("a")
            }
        });
        let b = executor.execute("op", || async move {
            if b_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::unavailable("b"))
            } else {
                Ok("b")
            }
        });

        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap(), "b");

        // each caller starts from attempt 0, so both first retries use the base delay
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_millis(300), Duration::from_millis(300)]
        );
        assert!(sink
            .events()
            .iter()
            .all(|e| e.metadata["attempt"] == 1));
    }
}
