use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::pool::PoolError;

/// How a database failure should be handled by a caller deciding whether to
/// retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorClass {
    /// Retrying will not help: bad data, a missing row, a malformed query.
    Permanent,
    /// The pool or connection itself is unhealthy; retrying the same
    /// connection won't help, but a fresh one might.
    Systemic,
    /// A transient condition (serialization conflict, timeout); retrying
    /// the same way is likely to succeed.
    Transient,
}

/// Classifies a `diesel::result::Error`.
pub fn classify_diesel_error(error: &DieselError) -> DbErrorClass {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
            match kind {
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation => DbErrorClass::Permanent,
                DatabaseErrorKind::ClosedConnection => DbErrorClass::Systemic,
                DatabaseErrorKind::SerializationFailure
                | DatabaseErrorKind::ReadOnlyTransaction
                | DatabaseErrorKind::UnableToSendCommand => DbErrorClass::Transient,
                _ => DbErrorClass::Transient,
            }
        }
        DieselError::NotFound => DbErrorClass::Permanent,
        DieselError::QueryBuilderError(_) => DbErrorClass::Permanent,
        _ => {
            debug!(error_type = %std::any::type_name_of_val(error), "diesel operation failed");
            DbErrorClass::Transient
        }
    }
}

/// Classifies a [`PoolError`]: both variants indicate the pool itself needs
/// attention, not the query that was attempted.
pub fn classify_pool_error(_error: &PoolError) -> DbErrorClass {
    DbErrorClass::Systemic
}
