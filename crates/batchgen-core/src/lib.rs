//! Shared domain types for the batch text-generation orchestrator.
//!
//! This crate has no async runtime dependency and no I/O: it exists so that
//! every other crate in the workspace can agree on the shape of a work item,
//! a response record and the process's exit codes without depending on each
//! other.

mod abort;
pub mod exit_codes;
mod response;
mod work_item;

pub use abort::{AbortReason, AbortSignal};
pub use response::{PersistenceStatus, ResponseRecord};
pub use work_item::{WorkItem, WorkItemError};
