use std::path::PathBuf;
use std::sync::Arc;

use batchgen_db::DbPool;
use batchgen_pause::PauseController;
use batchgen_quota::QuotaMonitor;
use batchgen_resultlog::ResultLog;
use tracing::warn;

/// Owns every long-lived collaborator a run acquires up front — result log,
/// quota monitor, pause controller, database pool — and tears them down
/// together, in the reverse of their acquisition order, once the run
/// completes.
///
/// This is a distinct concept from [`batchgen_pipeline::RequestContext`]:
/// that type is a cheaply-cloned bag of references handed to every pipeline
/// stage for one item, while this type is the single owner responsible for
/// an orderly shutdown. Teardown errors are logged, never propagated — a
/// failure releasing a resource must not mask the run's actual outcome.
pub struct ResourceContext {
    db_pool: Option<Arc<DbPool>>,
    quota_monitor: Option<Arc<QuotaMonitor>>,
    quota_state_path: Option<PathBuf>,
    result_log: Option<Arc<ResultLog>>,
    pause_controller: Arc<PauseController>,
}

impl ResourceContext {
    pub fn new(
        db_pool: Option<Arc<DbPool>>,
        quota_monitor: Option<Arc<QuotaMonitor>>,
        quota_state_path: Option<PathBuf>,
        result_log: Option<Arc<ResultLog>>,
        pause_controller: Arc<PauseController>,
    ) -> Self {
        Self { db_pool, quota_monitor, quota_state_path, result_log, pause_controller }
    }

    /// Tears resources down in the reverse of their acquisition order:
    /// pause controller, result log, quota monitor (persisting its state
    /// first), then the database pool.
    pub async fn shutdown(self) {
        drop(self.pause_controller);
        drop(self.result_log);

        if let Some(monitor) = self.quota_monitor {
            if let Some(path) = self.quota_state_path {
                if let Err(err) = monitor.persist_state(&path).await {
                    warn!(%err, path = %path.display(), "failed to persist quota state during shutdown");
                }
            }
        }

        drop(self.db_pool);
    }
}
