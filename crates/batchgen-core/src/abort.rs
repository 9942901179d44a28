use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Why a run was aborted before processing every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// A database error was classified as systemic: the pool or connection
    /// itself is unhealthy, not the individual write.
    SystemicDatabaseError,
    /// The process received a termination signal (Ctrl-C).
    Interrupted,
}

/// A shared flag a run checks to decide whether to keep submitting new
/// work.
///
/// Any collaborator that discovers a condition the whole run must stop for
/// calls [`AbortSignal::trigger`]; the orchestrator polls
/// [`AbortSignal::is_triggered`] between items so work already in flight
/// drains normally while no new work starts.
#[derive(Default)]
pub struct AbortSignal {
    triggered: AtomicBool,
    reason: Mutex<Option<(AbortReason, String)>>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the abort reason, if one is not already set. The first
    /// trigger wins; later calls are no-ops so the original cause isn't
    /// overwritten by a different failure racing in behind it.
    pub fn trigger(&self, reason: AbortReason, message: impl Into<String>) {
        let mut guard = self.reason.lock().expect("abort signal lock poisoned");
        if guard.is_none() {
            *guard = Some((reason, message.into()));
            self.triggered.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<AbortReason> {
        self.reason.lock().expect("abort signal lock poisoned").as_ref().map(|(reason, _)| *reason)
    }

    pub fn message(&self) -> Option<String> {
        self.reason.lock().expect("abort signal lock poisoned").as_ref().map(|(_, message)| message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_untriggered() {
        let signal = AbortSignal::new();
        assert!(!signal.is_triggered());
        assert_eq!(signal.reason(), None);
    }

    #[test]
    fn trigger_records_reason_and_message() {
        let signal = AbortSignal::new();
        signal.trigger(AbortReason::Interrupted, "Ctrl-C received");
        assert!(signal.is_triggered());
        assert_eq!(signal.reason(), Some(AbortReason::Interrupted));
        assert_eq!(signal.message().as_deref(), Some("Ctrl-C received"));
    }

    #[test]
    fn first_trigger_wins() {
        let signal = AbortSignal::new();
        signal.trigger(AbortReason::SystemicDatabaseError, "db unhealthy");
        signal.trigger(AbortReason::Interrupted, "Ctrl-C received");
        assert_eq!(signal.reason(), Some(AbortReason::SystemicDatabaseError));
    }
}
