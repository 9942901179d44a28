use batchgen_core::PersistenceStatus;
use uuid::Uuid;

/// One line of the JSONL result log.
///
/// Field names and omission rules are part of the on-disk contract:
/// `artist_data` is omitted entirely (not written as `null`) when the work
/// item carried none, and `request.version` is omitted when no prompt
/// version was configured. `db_status` is always present, even on a
/// database-less run, where it reads `"none"`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JsonlRecord {
    pub artist_id: Uuid,
    pub artist_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_data: Option<String>,
    pub request: JsonlRequest,
    pub response_text: String,
    pub response_id: String,
    pub created: i64,
    pub db_status: PersistenceStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JsonlRequest {
    pub prompt_id: String,
    pub variables: JsonlVariables,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JsonlVariables {
    pub artist_name: String,
    pub artist_data: String,
}

impl JsonlRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        artist_id: Uuid,
        artist_name: impl Into<String>,
        artist_data: Option<String>,
        prompt_id: impl Into<String>,
        version: Option<String>,
        response_text: impl Into<String>,
        response_id: impl Into<String>,
        created: i64,
        db_status: PersistenceStatus,
        error: Option<String>,
    ) -> Self {
        let artist_name = artist_name.into();
        let variables_data = artist_data.clone().unwrap_or_else(|| "No additional data provided".to_string());
        Self {
            artist_id,
            artist_name: artist_name.clone(),
            artist_data,
            request: JsonlRequest {
                prompt_id: prompt_id.into(),
                variables: JsonlVariables { artist_name, artist_data: variables_data },
                version,
            },
            response_text: response_text.into(),
            response_id: response_id.into(),
            created,
            db_status,
            error,
        }
    }
}
