//! Coordinates a bounded-concurrency run of the processing pipeline over a
//! batch of work items: submits remote calls through the shared retry
//! executor, checks the pause gate between items, reacts to quota-driven
//! pause requests, and reports progress as the batch completes.

mod orchestrator;
mod progress;
mod remote_classify;
mod resource_context;
mod resume;

pub use orchestrator::Orchestrator;
pub use progress::ProgressTracker;
pub use remote_classify::RemoteErrorClassifier;
pub use resource_context::ResourceContext;
pub use resume::{estimate_resume_time, parse_reset_to_timestamp};
