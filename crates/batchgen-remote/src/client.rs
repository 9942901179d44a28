use std::collections::HashMap;

use async_trait::async_trait;

/// A single call to the remote text-generation service.
///
/// Mirrors a `responses.create(prompt={id, variables, version?})`
/// invocation: a named, versioned prompt template filled in with
/// per-item variables rather than an ad-hoc free-text completion.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt_id: String,
    pub prompt_version: Option<String>,
    pub variables: HashMap<String, String>,
}

impl GenerationRequest {
    pub fn new(prompt_id: impl Into<String>, prompt_version: Option<String>, variables: HashMap<String, String>) -> Self {
        Self { prompt_id: prompt_id.into(), prompt_version, variables }
    }
}

/// The parsed body of a successful generation call.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub output_text: String,
    pub response_id: String,
    pub created_epoch_seconds: i64,
    pub total_tokens: Option<u64>,
}

/// A generation response alongside the raw response headers, so callers
/// that need rate-limit metadata (the Quota Monitor, the retry executor)
/// can read it without the client baking that concern into every call
/// site.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub headers: HashMap<String, String>,
    pub body: GenerationResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("network error calling remote service: {0}")]
    Network(String),
    #[error("remote service returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("failed to parse remote service response: {0}")]
    Parse(String),
    #[error("rate limited, retry_after_seconds={retry_after_seconds:?}")]
    RateLimited { retry_after_seconds: Option<u64> },
    #[error("quota exhausted, retry_after_seconds={retry_after_seconds:?}")]
    QuotaExceeded { retry_after_seconds: Option<u64> },
}

/// The contract the orchestrator and retry executor depend on; a concrete
/// client is just one implementation of it.
#[async_trait]
pub trait TextGenClient: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<RawResponse, RemoteError>;
}
