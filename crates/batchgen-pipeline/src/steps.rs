use std::time::Duration;

use async_trait::async_trait;
use batchgen_core::{AbortReason, PersistenceStatus};
use batchgen_db::{classify_diesel_error, classify_pool_error, update_bio, DbErrorClass, DbWriteOutcome};
use batchgen_resultlog::JsonlRecord;
use tracing::{debug, error, info, warn};

use crate::context::{ProcessingResult, RequestContext};
use crate::text::strip_trailing_citations;

/// One stage of the per-item response pipeline.
///
/// A step never aborts the pipeline: any failure it encounters is recorded
/// on the result (`error`, or `persistence_status` for the database stage)
/// and the result is handed to the next step as-is.
#[async_trait]
pub trait ProcessingStep: Send + Sync {
    async fn process(&self, result: ProcessingResult, context: &RequestContext) -> ProcessingResult;

    fn name(&self) -> &'static str;
}

/// Extracts the generated text and response metadata from the remote call,
/// stripping trailing citation/link blocks from the text.
pub struct ResponseParsingStep;

#[async_trait]
impl ProcessingStep for ResponseParsingStep {
    async fn process(&self, mut result: ProcessingResult, context: &RequestContext) -> ProcessingResult {
        let Some(raw) = result.raw_response.as_ref() else { return result };

        let raw_text = raw.body.output_text.clone();
        result.response_id = raw.body.response_id.clone();
        result.created_epoch_seconds = raw.body.created_epoch_seconds;

        let cleaned = strip_trailing_citations(&raw_text);
        if cleaned != raw_text {
            info!(worker = %context.worker_id, name = result.item.name(), "stripped trailing citations from response");
        }
        result.response_text = cleaned;

        result
    }

    fn name(&self) -> &'static str {
        "ResponseParsingStep"
    }
}

/// Feeds the remote call's rate-limit headers and token usage into the
/// quota monitor, if one is configured.
pub struct QuotaUpdateStep;

#[async_trait]
impl ProcessingStep for QuotaUpdateStep {
    async fn process(&self, result: ProcessingResult, context: &RequestContext) -> ProcessingResult {
        let Some(monitor) = context.quota_monitor.as_ref() else { return result };
        let Some(raw) = result.raw_response.as_ref() else { return result };

        let metrics = monitor.update_from_response(&raw.headers, raw.body.total_tokens).await;
        debug!(
            worker = %context.worker_id,
            used_today = metrics.requests_used_today,
            usage_pct = metrics.usage_percentage,
            should_pause = metrics.should_pause,
            "quota metrics updated"
        );

        result
    }

    fn name(&self) -> &'static str {
        "QuotaUpdateStep"
    }
}

/// Retries after a transient database failure up to this many times, with
/// `1 * 2^attempt` seconds between tries.
const DB_MAX_RETRIES: u32 = 3;

async fn db_retry_backoff(attempt: u32) {
    let delay = Duration::from_secs_f64(2f64.powi(attempt as i32));
    tokio::time::sleep(delay).await;
}

/// Writes the generated text to the destination database, if a pool is
/// configured and no earlier stage has already recorded an error.
///
/// Transient failures (timeouts, deadlocks, connection resets) are retried
/// in place, up to [`DB_MAX_RETRIES`] times. A systemic failure — the pool
/// or connection itself unhealthy, rather than this one write — aborts the
/// whole run via `context.abort` instead of just this item.
pub struct DatabaseUpdateStep;

#[async_trait]
impl ProcessingStep for DatabaseUpdateStep {
    async fn process(&self, mut result: ProcessingResult, context: &RequestContext) -> ProcessingResult {
        let Some(pool) = context.db_pool.as_ref() else { return result };
        if result.error.is_some() {
            return result;
        }

        let mut attempt = 0u32;
        loop {
            let mut conn = match pool.get().await {
                Ok(conn) => conn,
                Err(err) => {
                    let class = classify_pool_error(&err);
                    if class == DbErrorClass::Transient && attempt < DB_MAX_RETRIES {
                        warn!(worker = %context.worker_id, name = result.item.name(), %err, attempt, "database connection checkout failed, retrying");
                        db_retry_backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    if class == DbErrorClass::Systemic {
                        context.abort.trigger(AbortReason::SystemicDatabaseError, err.to_string());
                        error!(worker = %context.worker_id, name = result.item.name(), %err, "systemic database error, aborting run");
                    } else {
                        warn!(worker = %context.worker_id, name = result.item.name(), %err, "failed to check out database connection");
                    }
                    result.persistence_status = PersistenceStatus::Error;
                    return result;
                }
            };

            match update_bio(&mut conn, result.item.id(), &result.response_text, context.skip_existing, context.test_mode).await {
                Ok(outcome) => {
                    result.persistence_status = match outcome {
                        DbWriteOutcome::Updated => PersistenceStatus::Updated,
                        DbWriteOutcome::Skipped => PersistenceStatus::Skipped,
                    };
                    debug!(worker = %context.worker_id, name = result.item.name(), ?result.persistence_status, "database update complete");
                    return result;
                }
                Err(err) => {
                    let class = classify_diesel_error(&err);
                    if class == DbErrorClass::Transient && attempt < DB_MAX_RETRIES {
                        warn!(worker = %context.worker_id, name = result.item.name(), %err, attempt, "database update failed, retrying");
                        db_retry_backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    if class == DbErrorClass::Systemic {
                        context.abort.trigger(AbortReason::SystemicDatabaseError, err.to_string());
                        error!(worker = %context.worker_id, name = result.item.name(), %err, "systemic database error, aborting run");
                    } else {
                        warn!(worker = %context.worker_id, name = result.item.name(), %err, "database update failed");
                    }
                    result.persistence_status = PersistenceStatus::Error;
                    return result;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "DatabaseUpdateStep"
    }
}

/// Emits a structured log line recording the outcome of processing this
/// item, once a database update (if any) has been attempted.
pub struct TransactionLoggingStep;

#[async_trait]
impl ProcessingStep for TransactionLoggingStep {
    async fn process(&self, mut result: ProcessingResult, context: &RequestContext) -> ProcessingResult {
        let duration = result.ensure_duration();

        if context.db_pool.is_none() {
            return result;
        }

        match (result.persistence_status, &result.error) {
            (PersistenceStatus::Updated | PersistenceStatus::Skipped, None) => {
                info!(
                    worker = %context.worker_id,
                    name = result.item.name(),
                    duration_secs = duration.as_secs_f64(),
                    db_status = ?result.persistence_status,
                    response_id = %result.response_id,
                    "transaction succeeded"
                );
            }
            (status, error) => {
                let message = error.clone().unwrap_or_else(|| format!("database operation failed: {status:?}"));
                error!(
                    worker = %context.worker_id,
                    name = result.item.name(),
                    duration_secs = duration.as_secs_f64(),
                    error = %message,
                    "transaction failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &'static str {
        "TransactionLoggingStep"
    }
}

/// Appends the outcome to the append-only JSONL result log, if one is
/// configured.
pub struct OutputStreamingStep;

#[async_trait]
impl ProcessingStep for OutputStreamingStep {
    async fn process(&self, result: ProcessingResult, context: &RequestContext) -> ProcessingResult {
        let Some(log) = context.result_log.as_ref() else { return result };

        let record = JsonlRecord::new(
            result.item.id(),
            result.item.name(),
            result.item.extra().map(str::to_string),
            context.prompt_id.clone(),
            context.prompt_version.clone(),
            result.response_text.clone(),
            result.response_id.clone(),
            result.created_epoch_seconds,
            result.persistence_status,
            result.error.clone(),
        );

        if let Err(err) = log.append(&record).await {
            error!(worker = %context.worker_id, name = result.item.name(), %err, "failed to stream result to output log");
        } else {
            debug!(worker = %context.worker_id, name = result.item.name(), "streamed result to output log");
        }

        result
    }

    fn name(&self) -> &'static str {
        "OutputStreamingStep"
    }
}
