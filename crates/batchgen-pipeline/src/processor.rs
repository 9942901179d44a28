use batchgen_core::WorkItem;
use batchgen_remote::RawResponse;
use tracing::{error, info};

use crate::context::{ProcessingResult, RequestContext};
use crate::steps::{DatabaseUpdateStep, OutputStreamingStep, ProcessingStep, QuotaUpdateStep, ResponseParsingStep, TransactionLoggingStep};

/// Drives a [`ProcessingResult`] through an ordered list of
/// [`ProcessingStep`]s.
///
/// The default pipeline — parse the response, update quota tracking, write
/// to the database, log the transaction, stream to the output file — is
/// what most callers want; a custom step list is mainly useful for tests.
pub struct ResponseProcessor {
    steps: Vec<Box<dyn ProcessingStep>>,
}

impl Default for ResponseProcessor {
    fn default() -> Self {
        Self {
            steps: vec![
                Box::new(ResponseParsingStep),
                Box::new(QuotaUpdateStep),
                Box::new(DatabaseUpdateStep),
                Box::new(TransactionLoggingStep),
                Box::new(OutputStreamingStep),
            ],
        }
    }
}

impl ResponseProcessor {
    pub fn new(steps: Vec<Box<dyn ProcessingStep>>) -> Self {
        Self { steps }
    }

    /// Runs a successful remote-call result through the full pipeline.
    pub async fn process(&self, item: WorkItem, raw_response: RawResponse, context: &RequestContext) -> ProcessingResult {
        let name = item.name().to_string();
        let mut result = ProcessingResult::from_success(item, raw_response);

        for step in &self.steps {
            result = step.process(result, context).await;
        }

        if result.duration.is_none() {
            result.ensure_duration();
        }

        let duration = result.duration.unwrap_or_default();
        match &result.error {
            Some(err) => error!(worker = %context.worker_id, name, duration_secs = duration.as_secs_f64(), %err, "item processing failed"),
            None => info!(worker = %context.worker_id, name, duration_secs = duration.as_secs_f64(), db_status = ?result.persistence_status, "item processing completed"),
        }

        result
    }

    /// Builds an error result for an item whose remote call itself failed,
    /// still running the logging and output-streaming stages so the
    /// failure is recorded rather than silently dropped.
    pub async fn process_error(&self, item: WorkItem, error_message: impl Into<String>, context: &RequestContext) -> ProcessingResult {
        let mut result = ProcessingResult::from_error(item, error_message);
        result.ensure_duration();

        let logging = TransactionLoggingStep;
        let streaming = OutputStreamingStep;
        result = logging.process(result, context).await;
        result = streaming.process(result, context).await;

        let name = result.item.name().to_string();
        let duration = result.duration.unwrap_or_default();
        error!(worker = %context.worker_id, name, duration_secs = duration.as_secs_f64(), error = result.error.as_deref().unwrap_or(""), "item processing failed");

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchgen_core::PersistenceStatus;
    use batchgen_remote::GenerationResponse;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn sample_item() -> WorkItem {
        WorkItem::new(Uuid::new_v4(), "Miles Davis", None).unwrap()
    }

    fn sample_raw_response(text: &str) -> RawResponse {
        RawResponse {
            headers: HashMap::new(),
            body: GenerationResponse {
                output_text: text.to_string(),
                response_id: "resp_1".to_string(),
                created_epoch_seconds: 1_700_000_000,
                total_tokens: Some(50),
            },
        }
    }

    #[tokio::test]
    async fn successful_processing_without_db_or_output_leaves_status_none() {
        let processor = ResponseProcessor::default();
        let context = RequestContext::new("worker-1", "pmpt_1", None);

        let result = processor.process(sample_item(), sample_raw_response("A great bio."), &context).await;

        assert_eq!(result.response_text, "A great bio.");
        assert_eq!(result.persistence_status, PersistenceStatus::None);
        assert!(result.error.is_none());
        assert!(result.duration.is_some());
    }

    #[tokio::test]
    async fn citations_are_stripped_during_processing() {
        let processor = ResponseProcessor::default();
        let context = RequestContext::new("worker-1", "pmpt_1", None);

        let text = "Bio text. (https://example.com/a, https://example.com/b)";
        let result = processor.process(sample_item(), sample_raw_response(text), &context).await;

        assert_eq!(result.response_text, "Bio text.");
    }

    #[tokio::test]
    async fn process_error_records_the_failure() {
        let processor = ResponseProcessor::default();
        let context = RequestContext::new("worker-1", "pmpt_1", None);

        let result = processor.process_error(sample_item(), "remote call timed out", &context).await;

        assert_eq!(result.error.as_deref(), Some("remote call timed out"));
        assert!(result.duration.is_some());
    }
}
