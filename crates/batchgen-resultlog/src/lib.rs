//! An append-only JSONL log of every processed work item, written as
//! results complete rather than buffered until the end, so a crash mid-run
//! loses at most the item in flight.

mod log;
mod record;
mod resume;

pub use log::{ResultLog, ResultLogError};
pub use record::JsonlRecord;
pub use resume::get_processed_ids;
