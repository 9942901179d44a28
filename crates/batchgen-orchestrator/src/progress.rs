use std::time::{Duration, Instant};

use tracing::info;

const MIN_TIME_BETWEEN_LOGS: Duration = Duration::from_secs(5);

/// Tracks completion counts and emits periodic progress summaries during a
/// concurrent run.
pub struct ProgressTracker {
    total_items: usize,
    successful: usize,
    failed: usize,
    start_time: Instant,
    last_log_time: Instant,
    last_logged_count: usize,
    log_interval: usize,
}

impl ProgressTracker {
    /// `log_interval_percent` controls how often [`Self::should_log_summary`]
    /// fires based on item count alone (in addition to the fixed
    /// time-based trigger below); 10 means roughly every 10% of the batch.
    pub fn new(total_items: usize, log_interval_percent: usize) -> Self {
        let log_interval_percent = log_interval_percent.max(1);
        let log_interval = if total_items == 0 { 1 } else { (total_items / (100 / log_interval_percent)).max(1) };
        let now = Instant::now();
        Self {
            total_items,
            successful: 0,
            failed: 0,
            start_time: now,
            last_log_time: now,
            last_logged_count: 0,
            log_interval,
        }
    }

    pub fn update(&mut self, success: bool) {
        if success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }

    fn total_processed(&self) -> usize {
        self.successful + self.failed
    }

    pub fn should_log_summary(&self) -> bool {
        let processed = self.total_processed();
        if processed == self.total_items {
            return true;
        }
        if processed.saturating_sub(self.last_logged_count) >= self.log_interval {
            return true;
        }
        self.last_log_time.elapsed() >= MIN_TIME_BETWEEN_LOGS
    }

    pub fn log_summary(&mut self, quota_status_message: &str) {
        let processed = self.total_processed();
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { processed as f64 / elapsed } else { 0.0 };
        let remaining_items = self.total_items.saturating_sub(processed);
        let eta_secs = if rate > 0.0 { remaining_items as f64 / rate } else { 0.0 };
        let percent = if self.total_items > 0 { processed as f64 / self.total_items as f64 * 100.0 } else { 0.0 };

        info!(
            processed,
            total = self.total_items,
            percent,
            rate_per_sec = rate,
            eta_secs,
            quota_status = quota_status_message,
            "progress"
        );

        self.last_log_time = Instant::now();
        self.last_logged_count = processed;
    }

    pub fn stats(&self) -> (usize, usize) {
        (self.successful, self.failed)
    }
}
