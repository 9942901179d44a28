use std::sync::Arc;
use std::time::Duration;

/// The error classes a retryable operation can fail with.
///
/// Mirrors the taxonomy produced by the original error classifier, with one
/// addition: `Permanent` for errors that must never be retried (client
/// errors other than 429, validation failures, and the like). The original
/// implementation encoded "don't retry" implicitly by leaving the error
/// unclassified; here it is a first-class variant so every call site has to
/// make the decision explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimit,
    Quota,
    Server,
    Network,
    Permanent,
}

impl ErrorClass {
    /// Whether an error of this class should ever be retried.
    pub fn should_retry(self) -> bool {
        !matches!(self, ErrorClass::Permanent)
    }
}

/// A classification of one failed attempt: its class, whether to retry, and
/// an optional provider-supplied hint for how long to wait before retrying
/// (taken from a `Retry-After` style header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub class: ErrorClass,
    pub retry_after: Option<Duration>,
}

impl Classification {
    pub fn new(class: ErrorClass, retry_after: Option<Duration>) -> Self {
        Self { class, retry_after }
    }
}

/// Trait for classifying whether, and how, a failed attempt should be
/// retried.
///
/// Implementors are the bridge between a call site's concrete error type
/// and the shared backoff policy below.
pub trait Classify<E>: Send + Sync {
    fn classify(&self, error: &E) -> Classification;
}

/// A [`Classify`] backed by a plain closure, for call sites that don't need
/// a dedicated type.
#[derive(Clone)]
pub struct FnClassify<F> {
    f: Arc<F>,
}

impl<F> FnClassify<F> {
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F, E> Classify<E> for FnClassify<F>
where
    F: Fn(&E) -> Classification + Send + Sync,
{
    fn classify(&self, error: &E) -> Classification {
        (self.f)(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_is_never_retried() {
        assert!(!ErrorClass::Permanent.should_retry());
        assert!(ErrorClass::RateLimit.should_retry());
        assert!(ErrorClass::Quota.should_retry());
        assert!(ErrorClass::Server.should_retry());
        assert!(ErrorClass::Network.should_retry());
    }

    #[test]
    fn fn_classify_delegates_to_closure() {
        let classify = FnClassify::new(|e: &&str| {
            if *e == "429" {
                Classification::new(ErrorClass::RateLimit, Some(Duration::from_secs(5)))
            } else {
                Classification::new(ErrorClass::Permanent, None)
            }
        });
        let c = classify.classify(&"429");
        assert_eq!(c.class, ErrorClass::RateLimit);
        assert_eq!(c.retry_after, Some(Duration::from_secs(5)));
    }
}
