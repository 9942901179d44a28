//! Provider quota tracking.
//!
//! Parses rate-limit headers off the remote service's responses, keeps a
//! rolling daily request counter, decides when processing should pause, and
//! persists that state atomically so a restarted process picks up where it
//! left off.

mod header;
mod metrics;
mod monitor;
mod snapshot;

pub use header::parse_rate_limit_headers;
pub use metrics::{calculate_usage_metrics, should_pause_processing, QuotaMetrics};
pub use monitor::{QuotaError, QuotaMonitor};
pub use snapshot::QuotaSnapshot;
