use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{Mutex, Notify};
use tracing::{info, warn};

struct PauseDetails {
    reason: Option<String>,
    resume_at: Option<DateTime<Local>>,
}

/// A pause/resume gate shared across all workers.
///
/// `paused` is a lock-free flag so [`PauseController::is_paused`] never
/// blocks; `reason`/`resume_at` live behind a `tokio::sync::Mutex` since
/// they only need to be consistent with each other, not with every read of
/// `paused`.
///
/// Rust has no built-in reentrant mutex, so unlike the threading-based
/// original this controller is written so no method ever acquires the
/// lock while already holding it: [`PauseController::wait_if_paused`]
/// computes whether an auto-resume is due under one lock acquisition,
/// drops the guard, and only then calls [`PauseController::resume`], which
/// takes its own, separate lock.
pub struct PauseController {
    paused: AtomicBool,
    details: Mutex<PauseDetails>,
    notify: Notify,
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseController {
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            details: Mutex::new(PauseDetails { reason: None, resume_at: None }),
            notify: Notify::new(),
        }
    }

    /// Pauses processing. Idempotent: returns `false` without changing
    /// anything if already paused.
    pub async fn pause(&self, reason: impl Into<String>, resume_at: Option<DateTime<Local>>) -> bool {
        let reason = reason.into();
        {
            let mut details = self.details.lock().await;
            if self.paused.load(Ordering::SeqCst) {
                return false;
            }
            self.paused.store(true, Ordering::SeqCst);
            details.reason = Some(reason.clone());
            details.resume_at = resume_at;
        }

        match resume_at {
            Some(at) => warn!(reason, resume_at = %at, "PAUSED: will resume automatically"),
            None => warn!(reason, "PAUSED: manual resume required"),
        }
        true
    }

    /// Resumes processing and wakes every waiting worker.
    pub async fn resume(&self, reason: impl Into<String>) {
        let reason = reason.into();
        {
            let mut details = self.details.lock().await;
            self.paused.store(false, Ordering::SeqCst);
            details.reason = None;
            details.resume_at = None;
        }
        self.notify.notify_waiters();
        info!(reason, "RESUMED");
    }

    /// Schedules an automatic resume without changing the current pause
    /// state — call [`Self::pause`] first to actually pause.
    pub async fn schedule_resume_at(&self, at: DateTime<Local>) {
        let mut details = self.details.lock().await;
        details.resume_at = Some(at);
        if self.paused.load(Ordering::SeqCst) {
            info!(resume_at = %at, "auto-resume scheduled");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub async fn pause_reason(&self) -> Option<String> {
        self.details.lock().await.reason.clone()
    }

    /// Blocks until unpaused, an auto-resume time passes, or `timeout`
    /// elapses — whichever comes first. Returns immediately if not
    /// currently paused.
    pub async fn wait_if_paused(&self, timeout: Option<Duration>) {
        if let Some(due_reason) = self.auto_resume_due().await {
            self.resume(due_reason).await;
            return;
        }

        // Enable the notification before checking `is_paused` again: if a
        // `resume()` (which calls `notify_waiters`) lands between the check
        // and the eventual `.await` below, it must not be missed.
        // `notify_waiters` only wakes waiters registered at the time it is
        // called, so registration has to happen before the check, not after.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if !self.is_paused() {
            return;
        }

        let adjusted_timeout = self.adjust_timeout(timeout).await;

        match adjusted_timeout {
            Some(duration) => {
                if tokio::time::timeout(duration, notified.as_mut()).await.is_err() {
                    if let Some(due_reason) = self.auto_resume_due().await {
                        self.resume(due_reason).await;
                    } else if Some(duration) == timeout {
                        warn!("pause wait timeout reached");
                    }
                }
            }
            None => notified.as_mut().await,
        }
    }

    async fn auto_resume_due(&self) -> Option<&'static str> {
        let details = self.details.lock().await;
        if self.paused.load(Ordering::SeqCst) {
            if let Some(at) = details.resume_at {
                if Local::now() >= at {
                    return Some("Auto-resume time reached");
                }
            }
        }
        None
    }

    async fn adjust_timeout(&self, timeout: Option<Duration>) -> Option<Duration> {
        let details = self.details.lock().await;
        match (details.resume_at, timeout) {
            (Some(at), Some(requested)) => {
                let now = Local::now();
                let until_resume = (at - now).to_std().unwrap_or(Duration::ZERO);
                Some(requested.min(until_resume + Duration::from_millis(10)))
            }
            (Some(at), None) => {
                let now = Local::now();
                Some((at - now).to_std().unwrap_or(Duration::ZERO) + Duration::from_millis(10))
            }
            (None, requested) => requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;

    #[tokio::test]
    async fn starts_unpaused() {
        let controller = PauseController::new();
        assert!(!controller.is_paused());
    }

    #[tokio::test]
    async fn pausing_twice_is_idempotent() {
        let controller = PauseController::new();
        assert!(controller.pause("first", None).await);
        assert!(!controller.pause("second", None).await);
        assert_eq!(controller.pause_reason().await, Some("first".to_string()));
    }

    #[tokio::test]
    async fn resume_clears_state_and_wakes_waiters() {
        let controller = PauseController::new();
        controller.pause("busy", None).await;
        assert!(controller.is_paused());
        controller.resume("manual").await;
        assert!(!controller.is_paused());
        assert_eq!(controller.pause_reason().await, None);
    }

    #[tokio::test]
    async fn wait_if_paused_returns_immediately_when_not_paused() {
        let controller = PauseController::new();
        tokio::time::timeout(Duration::from_millis(50), controller.wait_if_paused(None))
            .await
            .expect("should not block when unpaused");
    }

    #[tokio::test]
    async fn concurrent_resume_wakes_a_blocked_waiter() {
        let controller = Arc::new(PauseController::new());
        controller.pause("busy", None).await;

        let waiter = controller.clone();
        let handle = tokio::spawn(async move { waiter.wait_if_paused(None).await });

        tokio::task::yield_now().await;
        controller.resume("manual").await;

        tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .expect("wait_if_paused should return once resume() is called")
            .unwrap();
    }

    #[tokio::test]
    async fn auto_resume_fires_once_resume_at_passes() {
        let controller = PauseController::new();
        let resume_at = Local::now() + ChronoDuration::milliseconds(20);
        controller.pause("quota", Some(resume_at)).await;

        tokio::time::sleep(Duration::from_millis(40)).await;

        controller.wait_if_paused(Some(Duration::from_millis(500))).await;
        assert!(!controller.is_paused());
    }
}
