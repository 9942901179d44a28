//! Per-item response processing: clean the generated text, update quota
//! tracking, persist to the database, log the transaction, and stream the
//! result to the output file — all best-effort, so one failing stage never
//! stops the others from running.

mod context;
mod processor;
mod steps;
mod text;

pub use context::{ProcessingResult, RequestContext};
pub use processor::ResponseProcessor;
pub use steps::{DatabaseUpdateStep, OutputStreamingStep, ProcessingStep, QuotaUpdateStep, ResponseParsingStep, TransactionLoggingStep};
pub use text::strip_trailing_citations;
