use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify::Classify;
use crate::events::{NoopListener, RetryEvent, RetryListener, SharedListener};
use crate::jitter::{JitterSource, RandJitter};

/// Configuration for one call site's use of [`retry`].
///
/// Built once (typically at startup) and shared across every invocation of
/// that call site, the way `RetryConfig` is built once per `RetryLayer` in
/// the rest of the workspace.
pub struct RetryConfig<E> {
    max_attempts: u32,
    classify: Arc<dyn Classify<E>>,
    jitter: Arc<dyn JitterSource>,
    listener: SharedListener,
}

impl<E> RetryConfig<E> {
    /// `max_attempts` is the number of *retries* after the initial attempt,
    /// so a value of 5 allows up to 6 calls total.
    pub fn new(classify: Arc<dyn Classify<E>>, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            classify,
            jitter: Arc::new(RandJitter),
            listener: Arc::new(NoopListener),
        }
    }

    pub fn with_jitter_source(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_listener(mut self, listener: SharedListener) -> Self {
        self.listener = listener;
        self
    }
}

/// The successful result of [`retry`], carrying the number of attempts it
/// took in addition to the value, for logging/metrics.
#[derive(Debug, Clone)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
}

/// Runs `op` until it succeeds, the error is classified as non-retryable,
/// or `max_attempts` retries are exhausted.
///
/// `op` receives the 0-based attempt number it is being called for.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig<E>, mut op: F) -> Result<RetryOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match op(attempt).await {
            Ok(value) => {
                config.listener.on_event(&RetryEvent::Succeeded { attempt });
                debug!(attempt, "retry: attempt succeeded");
                return Ok(RetryOutcome { value, attempts: attempt + 1 });
            }
            Err(error) => {
                let classification = config.classify.classify(&error);
                let exhausted = attempt >= config.max_attempts;
                if exhausted || !classification.class.should_retry() {
                    config.listener.on_event(&RetryEvent::GaveUp { attempt, class: classification.class });
                    warn!(attempt, class = ?classification.class, exhausted, "retry: giving up");
                    return Err(error);
                }

                let delay = crate::backoff::compute_backoff(
                    attempt,
                    classification.class,
                    classification.retry_after,
                    config.jitter.as_ref(),
                );
                config.listener.on_event(&RetryEvent::Retrying {
                    attempt,
                    class: classification.class,
                    delay,
                });
                debug!(attempt, class = ?classification.class, ?delay, "retry: backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classification, ErrorClass, FnClassify};
    use crate::jitter::FixedJitter;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn permanent_classifier() -> Arc<dyn Classify<&'static str>> {
        Arc::new(FnClassify::new(|_: &&str| Classification::new(ErrorClass::Permanent, None)))
    }

    fn transient_classifier() -> Arc<dyn Classify<&'static str>> {
        Arc::new(FnClassify::new(|_: &&str| Classification::new(ErrorClass::Network, None)))
    }

    #[tokio::test]
    async fn succeeds_immediately_without_retrying() {
        let config = RetryConfig::new(permanent_classifier(), 3);
        let result: Result<RetryOutcome<i32>, &str> = retry(&config, |_attempt| async { Ok(7) }).await;
        assert_eq!(result.unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let config = RetryConfig::new(permanent_classifier(), 5);
        let calls = AtomicU32::new(0);
        let result: Result<RetryOutcome<i32>, &str> = retry(&config, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("nope") }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_retry_until_success() {
        let config = RetryConfig::new(transient_classifier(), 5).with_jitter_source(Arc::new(FixedJitter::new(0.5)));
        let calls = AtomicU32::new(0);
        let result: Result<RetryOutcome<i32>, &str> = retry(&config, |_attempt| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err("transient") } else { Ok(42) } }
        })
        .await;
        let outcome = result.unwrap();
        assert_eq!(outcome.value, 42);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn exhausting_max_attempts_returns_last_error() {
        let config = RetryConfig::new(transient_classifier(), 2).with_jitter_source(Arc::new(FixedJitter::new(0.5)));
        let calls = AtomicU32::new(0);
        let result: Result<RetryOutcome<i32>, &str> = retry(&config, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("always") }
        })
        .await;
        assert_eq!(result.unwrap_err(), "always");
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial + 2 retries
    }
}
