//! Retry decorator for the reasoning port.
//!
//! Transient failures (transport, timeout, rate limiting) are retried with
//! capped exponential backoff plus jitter. Sleeping and jitter are injected so
//! tests run without wall-clock delays.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::warn;

use super::ports::{ReasoningRequest, ReasoningResponse, ReasoningSource, ReasoningSourceError};

/// Retry limits for reasoning calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasoningRetryConfig {
    /// Maximum calls per request, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay before jitter.
    pub max_backoff: Duration,
}

impl Default for ReasoningRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Async sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use reference_enrichment::domain::BackoffJitter;
    /// use chrono::{TimeZone, Utc};
    /// use std::time::Duration;
    ///
    /// struct Fixed;
    /// impl BackoffJitter for Fixed {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: chrono::DateTime<Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt))
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid time");
    /// assert_eq!(Fixed.jittered_delay(Duration::from_millis(100), 2, now), Duration::from_millis(102));
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Tokio-based sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic jitter adding up to a quarter of the base delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptJitter;

impl BackoffJitter for AttemptJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        let extra = seed % max_extra.saturating_add(1);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

/// [`ReasoningSource`] that retries transient failures of an inner source.
pub struct RetryingReasoningSource {
    inner: Arc<dyn ReasoningSource>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: ReasoningRetryConfig,
}

impl RetryingReasoningSource {
    /// Wrap `inner` using Tokio sleeping and [`AttemptJitter`].
    pub fn new(
        inner: Arc<dyn ReasoningSource>,
        clock: Arc<dyn Clock>,
        config: ReasoningRetryConfig,
    ) -> Self {
        Self::with_runtime(inner, clock, Arc::new(TokioSleeper), Arc::new(AttemptJitter), config)
    }

    /// Wrap `inner` with injected sleeping and jitter.
    pub fn with_runtime(
        inner: Arc<dyn ReasoningSource>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn RetrySleeper>,
        jitter: Arc<dyn BackoffJitter>,
        config: ReasoningRetryConfig,
    ) -> Self {
        Self {
            inner,
            clock,
            sleeper,
            jitter,
            config,
        }
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

#[async_trait]
impl ReasoningSource for RetryingReasoningSource {
    async fn resolve(
        &self,
        request: &ReasoningRequest,
    ) -> Result<ReasoningResponse, ReasoningSourceError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.resolve(request).await {
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let delay = self.jitter.jittered_delay(
                        self.retry_base_delay(attempt),
                        attempt,
                        self.clock.utc(),
                    );
                    warn!(attempt, ?delay, error = %error, "reasoning call failed; retrying");
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferenceData;
    use crate::domain::ports::MockReasoningSource;
    use crate::test_support::{MutableClock, NoJitter, RecordingSleeper};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> ReasoningRequest {
        ReasoningRequest {
            mappings: Vec::new(),
            unresolved_fields: vec!["Finish".to_owned()],
            reference_data: ReferenceData::default(),
        }
    }

    fn clock() -> Arc<dyn Clock> {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("time");
        Arc::new(MutableClock::new(now))
    }

    fn retrying(
        inner: MockReasoningSource,
        sleeper: Arc<RecordingSleeper>,
        config: ReasoningRetryConfig,
    ) -> RetryingReasoningSource {
        RetryingReasoningSource::with_runtime(
            Arc::new(inner),
            clock(),
            sleeper,
            Arc::new(NoJitter),
            config,
        )
    }

    #[rstest]
    #[tokio::test]
    async fn retries_transient_failures_with_exponential_backoff(request: ReasoningRequest) {
        let mut inner = MockReasoningSource::new();
        let mut calls = 0;
        inner.expect_resolve().times(3).returning(move |_| {
            calls += 1;
            if calls < 3 {
                Err(ReasoningSourceError::timeout("30s elapsed"))
            } else {
                Ok(ReasoningResponse::default())
            }
        });
        let sleeper = Arc::new(RecordingSleeper::default());

        let source = retrying(inner, Arc::clone(&sleeper), ReasoningRetryConfig::default());
        source.resolve(&request).await.expect("third attempt succeeds");

        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(500), Duration::from_millis(1_000)]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn gives_up_after_max_attempts(request: ReasoningRequest) {
        let mut inner = MockReasoningSource::new();
        inner
            .expect_resolve()
            .times(3)
            .returning(|_| Err(ReasoningSourceError::rate_limited("429")));
        let sleeper = Arc::new(RecordingSleeper::default());

        let source = retrying(inner, Arc::clone(&sleeper), ReasoningRetryConfig::default());
        let err = source.resolve(&request).await.expect_err("exhausted");

        assert_eq!(err, ReasoningSourceError::rate_limited("429"));
        assert_eq!(sleeper.recorded().len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn permanent_failures_are_not_retried(request: ReasoningRequest) {
        let mut inner = MockReasoningSource::new();
        inner
            .expect_resolve()
            .times(1)
            .returning(|_| Err(ReasoningSourceError::decode("not json")));
        let sleeper = Arc::new(RecordingSleeper::default());

        let source = retrying(inner, Arc::clone(&sleeper), ReasoningRetryConfig::default());
        assert!(source.resolve(&request).await.is_err());
        assert!(sleeper.recorded().is_empty());
    }

    #[rstest]
    fn backoff_is_capped() {
        let source = retrying(
            MockReasoningSource::new(),
            Arc::new(RecordingSleeper::default()),
            ReasoningRetryConfig {
                max_attempts: 10,
                initial_backoff: Duration::from_secs(1),
                max_backoff: Duration::from_secs(5),
            },
        );
        assert_eq!(source.retry_base_delay(1), Duration::from_secs(1));
        assert_eq!(source.retry_base_delay(3), Duration::from_secs(4));
        assert_eq!(source.retry_base_delay(4), Duration::from_secs(5));
    }

    #[rstest]
    fn attempt_jitter_stays_within_a_quarter() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("time");
        let delay = AttemptJitter.jittered_delay(Duration::from_millis(400), 2, now);
        assert!(delay >= Duration::from_millis(400));
        assert!(delay <= Duration::from_millis(500));
    }
}
