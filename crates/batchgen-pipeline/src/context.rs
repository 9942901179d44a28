use std::sync::Arc;
use std::time::{Duration, Instant};

use batchgen_core::{AbortSignal, PersistenceStatus, ResponseRecord, WorkItem};
use batchgen_db::DbPool;
use batchgen_quota::QuotaMonitor;
use batchgen_remote::RawResponse;
use batchgen_resultlog::ResultLog;

/// Shared configuration and collaborators every step in a pipeline run may
/// consult. Cheap to clone: the collaborators are held behind `Arc`.
#[derive(Clone)]
pub struct RequestContext {
    pub worker_id: String,
    pub prompt_id: String,
    pub prompt_version: Option<String>,
    pub skip_existing: bool,
    pub test_mode: bool,
    pub db_pool: Option<Arc<DbPool>>,
    pub quota_monitor: Option<Arc<QuotaMonitor>>,
    pub result_log: Option<Arc<ResultLog>>,
    /// Set by a stage that discovers a systemic failure (for example, an
    /// unhealthy database pool); the orchestrator polls it to stop
    /// submitting new work.
    pub abort: Arc<AbortSignal>,
}

impl RequestContext {
    pub fn new(worker_id: impl Into<String>, prompt_id: impl Into<String>, prompt_version: Option<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            prompt_id: prompt_id.into(),
            prompt_version,
            skip_existing: false,
            test_mode: false,
            db_pool: None,
            quota_monitor: None,
            result_log: None,
            abort: Arc::new(AbortSignal::new()),
        }
    }
}

/// State threaded through the processing pipeline for one work item.
///
/// Every field is populated best-effort: a stage that fails records its
/// failure on `error` (and, for the database stage, on `persistence_status`)
/// and returns the result unchanged rather than aborting the remaining
/// stages, so a record is always in a loggable, streamable state at the
/// end of the run.
pub struct ProcessingResult {
    pub item: WorkItem,
    pub raw_response: Option<RawResponse>,
    pub response_text: String,
    pub response_id: String,
    pub created_epoch_seconds: i64,
    pub persistence_status: PersistenceStatus,
    pub error: Option<String>,
    started_at: Instant,
    pub duration: Option<Duration>,
}

impl ProcessingResult {
    pub fn from_success(item: WorkItem, raw_response: RawResponse) -> Self {
        Self {
            item,
            raw_response: Some(raw_response),
            response_text: String::new(),
            response_id: String::new(),
            created_epoch_seconds: 0,
            persistence_status: PersistenceStatus::None,
            error: None,
            started_at: Instant::now(),
            duration: None,
        }
    }

    pub fn from_error(item: WorkItem, error: impl Into<String>) -> Self {
        Self {
            item,
            raw_response: None,
            response_text: String::new(),
            response_id: String::new(),
            created_epoch_seconds: 0,
            persistence_status: PersistenceStatus::None,
            error: Some(error.into()),
            started_at: Instant::now(),
            duration: None,
        }
    }

    pub fn ensure_duration(&mut self) -> Duration {
        let duration = self.started_at.elapsed();
        self.duration = Some(duration);
        duration
    }

    pub fn to_response_record(&self) -> ResponseRecord {
        let mut record = ResponseRecord::new(
            self.item.id(),
            self.item.name(),
            self.item.extra().map(str::to_string),
            self.response_text.clone(),
            self.response_id.clone(),
            self.created_epoch_seconds,
        );
        record.persistence_status = self.persistence_status;
        record.error_message = self.error.clone();
        record
    }
}
