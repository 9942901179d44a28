use std::sync::Arc;
use std::time::Duration;

use crate::classify::ErrorClass;

/// Observability hook fired as the retry executor makes decisions.
///
/// Mirrors the `ResilienceEvent`/`EventListener` shape used throughout the
/// rest of the workspace's resilience crates: a small, cheap-to-construct
/// enum plus a listener trait, so callers can wire up metrics or logging
/// without the executor knowing about either.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and will be retried after `delay`.
    Retrying { attempt: u32, class: ErrorClass, delay: Duration },
    /// An attempt failed and will not be retried (permanent error, or
    /// attempts exhausted).
    GaveUp { attempt: u32, class: ErrorClass },
    /// An attempt succeeded, possibly after prior retries.
    Succeeded { attempt: u32 },
}

/// Receives [`RetryEvent`]s as they occur.
pub trait RetryListener: Send + Sync {
    fn on_event(&self, event: &RetryEvent);
}

impl<F> RetryListener for F
where
    F: Fn(&RetryEvent) + Send + Sync,
{
    fn on_event(&self, event: &RetryEvent) {
        self(event)
    }
}

/// A listener that discards every event; the default when no observability
/// is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl RetryListener for NoopListener {
    fn on_event(&self, _event: &RetryEvent) {}
}

pub(crate) type SharedListener = Arc<dyn RetryListener>;
