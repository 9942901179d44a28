use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::header::parse_rate_limit_headers;
use crate::metrics::{calculate_usage_metrics, should_pause_processing, QuotaMetrics};
use crate::snapshot::QuotaSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    #[error("failed to persist quota state to {path}: {source}")]
    Persist { path: String, #[source] source: std::io::Error },
    #[error("failed to serialize quota state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct PersistedState {
    daily_limit_requests: Option<u64>,
    pause_threshold: f64,
    requests_used_today: u64,
    last_reset: DateTime<Local>,
    quota_status: Option<QuotaSnapshot>,
    quota_metrics: Option<QuotaMetrics>,
}

struct QuotaState {
    daily_limit_requests: Option<u64>,
    pause_threshold: f64,
    requests_used_today: u64,
    last_reset: DateTime<Local>,
    current_status: Option<QuotaSnapshot>,
    current_metrics: Option<QuotaMetrics>,
}

fn start_of_today() -> DateTime<Local> {
    Local::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_local_timezone(Local).unwrap()
}

/// Tracks provider rate-limit usage and decides when processing should
/// pause.
///
/// All state lives behind a single `tokio::sync::Mutex`; every public
/// method acquires it at most once per call — `can_resume` calls
/// `should_pause` as a plain async function call that completes (and
/// releases the lock) before returning, rather than nesting a second lock
/// acquisition inside the first. Rust's `Mutex` types are not reentrant, so
/// this crate structures state transitions to never need reentrancy in the
/// first place.
pub struct QuotaMonitor {
    state: Mutex<QuotaState>,
}

impl QuotaMonitor {
    pub fn new(daily_limit_requests: Option<u64>, pause_threshold: f64) -> Self {
        info!(?daily_limit_requests, pause_threshold, "quota monitor initialized");
        Self {
            state: Mutex::new(QuotaState {
                daily_limit_requests,
                pause_threshold,
                requests_used_today: 0,
                last_reset: start_of_today(),
                current_status: None,
                current_metrics: None,
            }),
        }
    }

    /// Updates quota state from the remote service's response headers and
    /// returns the freshly calculated metrics.
    pub async fn update_from_response(
        &self,
        headers: &HashMap<String, String>,
        total_tokens_used: Option<u64>,
    ) -> QuotaMetrics {
        let mut state = self.state.lock().await;

        let status = parse_rate_limit_headers(headers, total_tokens_used);
        state.current_status = Some(status);

        let today = start_of_today();
        if today.date_naive() > state.last_reset.date_naive() {
            info!(previous = state.requests_used_today, "resetting daily request counter");
            state.requests_used_today = 0;
            state.last_reset = today;
        }
        state.requests_used_today += 1;

        let metrics = calculate_usage_metrics(
            state.current_status.as_ref().expect("just set above"),
            state.daily_limit_requests,
            state.requests_used_today,
        );
        state.current_metrics = Some(metrics.clone());
        metrics
    }

    /// Whether processing should pause right now, and why.
    pub async fn should_pause(&self) -> (bool, String) {
        let state = self.state.lock().await;
        match &state.current_metrics {
            None => (false, "No quota data available".to_string()),
            Some(metrics) => should_pause_processing(metrics, state.pause_threshold),
        }
    }

    /// Whether processing can resume — the inverse of [`Self::should_pause`].
    pub async fn can_resume(&self) -> bool {
        let (should_pause, _) = self.should_pause().await;
        !should_pause
    }

    pub async fn current_metrics(&self) -> Option<QuotaMetrics> {
        self.state.lock().await.current_metrics.clone()
    }

    pub async fn current_status(&self) -> Option<QuotaSnapshot> {
        self.state.lock().await.current_status.clone()
    }

    /// Persists the current state to `path` using a write-to-temp-then-
    /// rename sequence, so a crash mid-write never leaves a truncated file
    /// behind.
    pub async fn persist_state(&self, path: &Path) -> Result<(), QuotaError> {
        let snapshot = {
            let state = self.state.lock().await;
            PersistedState {
                daily_limit_requests: state.daily_limit_requests,
                pause_threshold: state.pause_threshold,
                requests_used_today: state.requests_used_today,
                last_reset: state.last_reset,
                quota_status: state.current_status.clone(),
                quota_metrics: state.current_metrics.clone(),
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| QuotaError::Persist {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }

        let tmp_path = path.with_extension("tmp");
        let body = serde_json::to_vec(&snapshot)?;
        let write_result = tokio::fs::write(&tmp_path, &body).await;
        match write_result {
            Ok(()) => {
                tokio::fs::rename(&tmp_path, path).await.map_err(|source| QuotaError::Persist {
                    path: path.display().to_string(),
                    source,
                })?;
                debug!(path = %path.display(), "persisted quota state");
                Ok(())
            }
            Err(source) => {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                error!(path = %path.display(), %source, "failed to persist quota state");
                Err(QuotaError::Persist { path: path.display().to_string(), source })
            }
        }
    }

    /// Loads previously persisted state, if any. Returns `false` (without
    /// error) when the file does not exist, mirroring a first run.
    pub async fn load_state(&self, path: &Path) -> Result<bool, QuotaError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no quota state file found");
                return Ok(false);
            }
            Err(source) => return Err(QuotaError::Persist { path: path.display().to_string(), source }),
        };

        let persisted: PersistedState = serde_json::from_slice(&bytes)?;
        let mut state = self.state.lock().await;
        state.daily_limit_requests = persisted.daily_limit_requests;
        state.pause_threshold = persisted.pause_threshold;
        state.requests_used_today = persisted.requests_used_today;
        state.last_reset = persisted.last_reset;
        state.current_status = persisted.quota_status;
        state.current_metrics = persisted.quota_metrics;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn no_data_means_no_pause() {
        let monitor = QuotaMonitor::new(None, 0.8);
        let (should_pause, reason) = monitor.should_pause().await;
        assert!(!should_pause);
        assert_eq!(reason, "No quota data available");
    }

    #[tokio::test]
    async fn repeated_updates_increment_daily_counter() {
        let monitor = QuotaMonitor::new(Some(1000), 0.8);
        let h = headers(&[("x-ratelimit-remaining-requests", "900"), ("x-ratelimit-limit-requests", "1000")]);
        monitor.update_from_response(&h, None).await;
        let metrics = monitor.update_from_response(&h, None).await;
        assert_eq!(metrics.requests_used_today, 2);
    }

    #[tokio::test]
    async fn can_resume_mirrors_should_pause() {
        let monitor = QuotaMonitor::new(Some(10), 0.5);
        let h = headers(&[("x-ratelimit-remaining-requests", "1"), ("x-ratelimit-limit-requests", "1000")]);
        for _ in 0..9 {
            monitor.update_from_response(&h, None).await;
        }
        assert!(!monitor.can_resume().await);
    }

    #[tokio::test]
    async fn persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota_state.json");

        let monitor = QuotaMonitor::new(Some(500), 0.8);
        let h = headers(&[("x-ratelimit-remaining-requests", "10"), ("x-ratelimit-limit-requests", "100")]);
        monitor.update_from_response(&h, None).await;
        monitor.persist_state(&path).await.unwrap();

        let restored = QuotaMonitor::new(None, 0.0);
        let loaded = restored.load_state(&path).await.unwrap();
        assert!(loaded);
        assert_eq!(restored.current_metrics().await.unwrap().requests_used_today, 1);
    }

    #[tokio::test]
    async fn load_missing_file_returns_false() {
        let monitor = QuotaMonitor::new(None, 0.8);
        let loaded = monitor.load_state(Path::new("/nonexistent/path/quota.json")).await.unwrap();
        assert!(!loaded);
    }
}
