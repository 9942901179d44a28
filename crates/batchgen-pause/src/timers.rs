use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinHandle;
use tracing::debug;

/// Tracks spawned auto-resume timers so they can all be cancelled together,
/// e.g. when the orchestrator shuts down.
#[derive(Default)]
pub struct TimerManager {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `fut` as a tracked background task.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        self.handles.lock().expect("timer manager lock poisoned").push(handle);
    }

    /// Aborts every still-running timer. Already-completed timers are
    /// silently skipped.
    pub fn cancel_all(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().expect("timer manager lock poisoned"));
        let count = handles.len();
        for handle in handles {
            handle.abort();
        }
        debug!(count, "cancelled pending auto-resume timers");
    }

    pub fn pending_count(&self) -> usize {
        self.handles.lock().expect("timer manager lock poisoned").iter().filter(|h| !h.is_finished()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_all_aborts_pending_timers() {
        let manager = TimerManager::new();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        manager.spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            ran_clone.store(true, Ordering::SeqCst);
        });

        assert_eq!(manager.pending_count(), 1);
        manager.cancel_all();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn completed_timers_are_not_counted_as_pending() {
        let manager = TimerManager::new();
        manager.spawn(async move {});
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.pending_count(), 0);
    }
}
