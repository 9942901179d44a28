use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use batchgen_core::WorkItem;
use batchgen_pause::{PauseController, TimerManager};
use batchgen_pipeline::{RequestContext, ResponseProcessor};
use batchgen_quota::QuotaMonitor;
use batchgen_remote::{GenerationRequest, RemoteError, TextGenClient};
use batchgen_retry::{retry, RetryConfig};
use chrono::Local;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::progress::ProgressTracker;
use crate::remote_classify::RemoteErrorClassifier;
use crate::resume::estimate_resume_time;

/// Coordinates bounded-concurrency processing of a batch of work items
/// against the remote text-generation service.
///
/// Parallelism is capped by a `tokio::sync::Semaphore` sized to
/// `max_workers` rather than an OS thread pool, since every call in the
/// hot path (remote request, database write) is already `async`.
pub struct Orchestrator {
    client: Arc<dyn TextGenClient>,
    processor: Arc<ResponseProcessor>,
    pause_controller: Arc<PauseController>,
    quota_monitor: Option<Arc<QuotaMonitor>>,
    timer_manager: Arc<TimerManager>,
    retry_config: Arc<RetryConfig<RemoteError>>,
    max_workers: usize,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn TextGenClient>,
        processor: Arc<ResponseProcessor>,
        pause_controller: Arc<PauseController>,
        quota_monitor: Option<Arc<QuotaMonitor>>,
        max_workers: usize,
        max_retries: u32,
    ) -> Self {
        let retry_config = RetryConfig::new(Arc::new(RemoteErrorClassifier), max_retries);
        Self {
            client,
            processor,
            pause_controller,
            quota_monitor,
            timer_manager: Arc::new(TimerManager::new()),
            retry_config: Arc::new(retry_config),
            max_workers: max_workers.max(1),
        }
    }

    /// Processes every item in `items` with up to `max_workers` concurrent
    /// in-flight calls, returning `(successful, failed)` counts.
    pub async fn process_items(&self, items: Vec<WorkItem>, context: RequestContext) -> (usize, usize) {
        let total = items.len();
        info!(workers = self.max_workers, total, "starting concurrent processing");

        let tracker = Arc::new(StdMutex::new(ProgressTracker::new(total, 10)));
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let next_worker = Arc::new(AtomicUsize::new(0));

        let tasks = items.into_iter().map(|item| {
            let semaphore = semaphore.clone();
            let client = self.client.clone();
            let processor = self.processor.clone();
            let pause_controller = self.pause_controller.clone();
            let quota_monitor = self.quota_monitor.clone();
            let timer_manager = self.timer_manager.clone();
            let retry_config = self.retry_config.clone();
            let tracker = tracker.clone();
            let context = context.clone();
            let next_worker = next_worker.clone();
            let max_workers = self.max_workers;

            async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");

                let worker_id = format!("W{:02}", next_worker.fetch_add(1, Ordering::Relaxed) % max_workers + 1);
                let mut item_context = context.clone();
                item_context.worker_id = worker_id;

                if item_context.abort.is_triggered() {
                    processor.process_error(item, "run aborted, skipping remaining work", &item_context).await;
                    let mut tracker = tracker.lock().expect("progress tracker lock poisoned");
                    tracker.update(false);
                    return tracker.should_log_summary();
                }

                pause_controller.wait_if_paused(None).await;

                let request = GenerationRequest::new(
                    item_context.prompt_id.clone(),
                    item_context.prompt_version.clone(),
                    variables_for(&item),
                );

                let outcome = retry(&retry_config, |_attempt| client.generate(request.clone())).await;

                let success = match outcome {
                    Ok(retry_outcome) => {
                        let result = processor.process(item, retry_outcome.value, &item_context).await;
                        let success = result.error.is_none();
                        if success {
                            if let Some(monitor) = quota_monitor.as_ref() {
                                maybe_pause_for_quota(monitor, &pause_controller, &timer_manager).await;
                            }
                        }
                        success
                    }
                    Err(err) => {
                        processor.process_error(item, err.to_string(), &item_context).await;
                        false
                    }
                };

                let mut tracker = tracker.lock().expect("progress tracker lock poisoned");
                tracker.update(success);
                tracker.should_log_summary()
            }
        });

        let should_log_flags = join_all(tasks).await;
        if should_log_flags.into_iter().any(|should_log| should_log) {
            let mut tracker = tracker.lock().expect("progress tracker lock poisoned");
            tracker.log_summary("");
        }

        self.timer_manager.cancel_all();

        let stats = tracker.lock().expect("progress tracker lock poisoned").stats();
        info!(successful = stats.0, failed = stats.1, "concurrent processing completed");
        stats
    }
}

fn variables_for(item: &WorkItem) -> HashMap<String, String> {
    let mut variables = HashMap::new();
    variables.insert("artist_name".to_string(), item.name().to_string());
    variables.insert(
        "artist_data".to_string(),
        item.extra().map(str::to_string).unwrap_or_else(|| "No additional data provided".to_string()),
    );
    variables
}

async fn maybe_pause_for_quota(monitor: &QuotaMonitor, pause_controller: &Arc<PauseController>, timer_manager: &TimerManager) {
    let (should_pause, reason) = monitor.should_pause().await;
    if !should_pause {
        return;
    }

    let resume_at = estimate_resume_time(monitor).await;
    if !pause_controller.pause(reason.clone(), resume_at).await {
        return;
    }

    match resume_at {
        Some(at) => {
            let delay = (at - Local::now()).to_std().unwrap_or(Duration::ZERO);
            let controller = pause_controller.clone();
            timer_manager.spawn(async move {
                tokio::time::sleep(delay).await;
                controller.resume("Auto-resume: quota reset").await;
            });
            info!(resume_at = %at, delay_secs = delay.as_secs_f64(), "auto-resume scheduled");
        }
        None => warn!(reason, "processing paused due to quota, manual resume required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use batchgen_pipeline::ResponseProcessor;
    use batchgen_remote::{GenerationResponse, RawResponse};
    use std::sync::atomic::AtomicU32;
    use uuid::Uuid;

    struct StubClient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TextGenClient for StubClient {
        async fn generate(&self, request: GenerationRequest) -> Result<RawResponse, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawResponse {
                headers: HashMap::new(),
                body: GenerationResponse {
                    output_text: format!("bio for {}", request.variables.get("artist_name").cloned().unwrap_or_default()),
                    response_id: "resp".to_string(),
                    created_epoch_seconds: 0,
                    total_tokens: None,
                },
            })
        }
    }

    #[tokio::test]
    async fn processes_every_item_successfully() {
        let client = Arc::new(StubClient { calls: AtomicU32::new(0) });
        let processor = Arc::new(ResponseProcessor::default());
        let pause_controller = Arc::new(PauseController::new());

        let orchestrator = Orchestrator::new(client.clone(), processor, pause_controller, None, 2, 3);
        let items = vec![
            WorkItem::new(Uuid::new_v4(), "A", None).unwrap(),
            WorkItem::new(Uuid::new_v4(), "B", None).unwrap(),
            WorkItem::new(Uuid::new_v4(), "C", None).unwrap(),
        ];
        let context = RequestContext::new("main", "pmpt_1", None);

        let (successful, failed) = orchestrator.process_items(items, context).await;
        assert_eq!(successful, 3);
        assert_eq!(failed, 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }
}
