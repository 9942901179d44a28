//! Connection-pooled writes to the destination database.
//!
//! The pool itself is a thin wrapper over `diesel-async` + `bb8`; the
//! write path is a single `UPDATE` statement with a `skip_existing`
//! variant, plus an error classifier that sorts `diesel` failures into
//! buckets a caller can act on (retry, don't retry, or treat the whole
//! pool as unhealthy).

mod classify;
mod pool;
mod writer;

pub use classify::{classify_diesel_error, classify_pool_error, DbErrorClass};
pub use pool::{DbPool, PoolConfig, PoolError};
pub use writer::{update_bio, DbWriteOutcome};
