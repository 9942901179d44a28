use uuid::Uuid;

/// Outcome of persisting a [`ResponseRecord`] to the destination database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceStatus {
    /// The row was written.
    Updated,
    /// The row already had a value and `skip_existing` was set.
    Skipped,
    /// A database error occurred; the error text is carried on the record.
    Error,
    /// No database was configured, or persistence was never attempted.
    None,
}

/// The result of a single work item's trip through the processing pipeline.
///
/// Every field is populated best-effort: a stage that fails still leaves the
/// record in a valid, loggable state rather than aborting the whole item.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseRecord {
    pub work_id: Uuid,
    pub name: String,
    pub extra: Option<String>,
    pub text: String,
    pub remote_id: String,
    pub created_epoch_seconds: i64,
    pub persistence_status: PersistenceStatus,
    pub error_message: Option<String>,
}

impl ResponseRecord {
    /// Builds a record representing a successful remote call that has not
    /// yet gone through the persistence stage.
    pub fn new(
        work_id: Uuid,
        name: impl Into<String>,
        extra: Option<String>,
        text: impl Into<String>,
        remote_id: impl Into<String>,
        created_epoch_seconds: i64,
    ) -> Self {
        Self {
            work_id,
            name: name.into(),
            extra,
            text: text.into(),
            remote_id: remote_id.into(),
            created_epoch_seconds,
            persistence_status: PersistenceStatus::None,
            error_message: None,
        }
    }
}
