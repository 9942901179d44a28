//! Process exit codes.
//!
//! These mirror the conventions of the original implementation so that
//! operators' existing automation (monitoring exit status in a shell
//! pipeline) keeps working unchanged.

/// The run completed with no unrecoverable errors.
pub const SUCCESS: i32 = 0;
/// The input file was missing, unreadable, or contained no usable rows.
pub const INPUT_ERROR: i32 = 2;
/// Required configuration (API key, database URL, ...) was missing or invalid.
pub const CONFIG_ERROR: i32 = 3;
/// One or more work items failed permanently against the remote service.
pub const API_FAILURES: i32 = 4;
/// The process was interrupted (SIGINT/Ctrl-C).
pub const INTERRUPTED: i32 = 130;
/// An error occurred that does not fit any other category.
pub const UNEXPECTED_ERROR: i32 = 10;
