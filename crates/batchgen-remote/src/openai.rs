use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use crate::client::{GenerationRequest, GenerationResponse, RawResponse, RemoteError, TextGenClient};

/// Client for an OpenAI-compatible "responses" endpoint.
///
/// Works against OpenAI itself or any compatible gateway that speaks the
/// same `prompt={id, variables, version}` request shape and returns
/// `output_text`/`id`/`created_at`.
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

        let client = Client::builder().default_headers(headers).build().expect("failed to build HTTP client");

        Self { client, base_url: base_url.into(), api_key }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("https://api.openai.com/v1", Some(api_key.into()))
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    fn auth_header(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| format!("Bearer {key}"))
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequestBody {
    prompt: PromptRef,
}

#[derive(Debug, Serialize)]
struct PromptRef {
    id: String,
    variables: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponseBody {
    output_text: String,
    id: String,
    created_at: i64,
    usage: Option<UsageBody>,
}

#[derive(Debug, Deserialize)]
struct UsageBody {
    total_tokens: u64,
}

/// The error envelope an OpenAI-compatible 429 response carries, used to
/// tell hard quota exhaustion apart from an ordinary rate limit.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
}

/// Error codes an OpenAI-compatible 429 can carry that mean the account's
/// quota is exhausted rather than a transient rate limit being hit.
const QUOTA_ERROR_CODES: [&str; 2] = ["insufficient_quota", "quota_exceeded"];

fn is_quota_error_code(body: &str) -> bool {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.code)
        .is_some_and(|code| QUOTA_ERROR_CODES.contains(&code.as_str()))
}

fn header_map_to_plain(headers: &header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_lowercase(), v.to_string())))
        .collect()
}

#[async_trait]
impl TextGenClient for OpenAiCompatibleClient {
    async fn generate(&self, request: GenerationRequest) -> Result<RawResponse, RemoteError> {
        let body = ResponsesRequestBody {
            prompt: PromptRef { id: request.prompt_id, variables: request.variables, version: request.prompt_version },
        };

        let mut http_request = self.client.post(self.responses_url()).json(&body);
        if let Some(auth) = self.auth_header() {
            http_request = http_request.header(header::AUTHORIZATION, auth);
        }

        let response = http_request.send().await.map_err(|e| RemoteError::Network(e.to_string()))?;
        let status = response.status();
        let headers = header_map_to_plain(response.headers());

        if status.as_u16() == 429 {
            let retry_after_seconds = headers.get("retry-after").and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            if is_quota_error_code(&body) {
                return Err(RemoteError::QuotaExceeded { retry_after_seconds });
            }
            return Err(RemoteError::RateLimited { retry_after_seconds });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RemoteError::Http { status: status.as_u16(), body: text });
        }

        let parsed: ResponsesResponseBody = response.json().await.map_err(|e| RemoteError::Parse(e.to_string()))?;

        Ok(RawResponse {
            headers,
            body: GenerationResponse {
                output_text: parsed.output_text,
                response_id: parsed.id,
                created_epoch_seconds: parsed.created_at,
                total_tokens: parsed.usage.map(|u| u.total_tokens),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> GenerationRequest {
        let mut variables = HashMap::new();
        variables.insert("artist_name".to_string(), "Miles Davis".to_string());
        variables.insert("artist_data".to_string(), "No additional data provided".to_string());
        GenerationRequest::new("pmpt_123", None, variables)
    }

    #[tokio::test]
    async fn successful_response_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ratelimit-remaining-requests", "999")
                    .set_body_json(serde_json::json!({
                        "output_text": "A short bio.",
                        "id": "resp_1",
                        "created_at": 1_700_000_000i64,
                        "usage": {"total_tokens": 42}
                    })),
            )
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(server.uri(), None);
        let result = client.generate(sample_request()).await.unwrap();

        assert_eq!(result.body.output_text, "A short bio.");
        assert_eq!(result.body.response_id, "resp_1");
        assert_eq!(result.body.total_tokens, Some(42));
        assert_eq!(result.headers.get("x-ratelimit-remaining-requests").map(String::as_str), Some("999"));
    }

    #[tokio::test]
    async fn rate_limit_status_surfaces_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(server.uri(), None);
        let err = client.generate(sample_request()).await.unwrap_err();

        match err {
            RemoteError::RateLimited { retry_after_seconds } => assert_eq!(retry_after_seconds, Some(30)),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn quota_error_code_on_429_surfaces_as_quota_exceeded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "60").set_body_json(serde_json::json!({
                "error": {"message": "You exceeded your current quota", "type": "insufficient_quota", "code": "insufficient_quota"}
            })))
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(server.uri(), None);
        let err = client.generate(sample_request()).await.unwrap_err();

        match err {
            RemoteError::QuotaExceeded { retry_after_seconds } => assert_eq!(retry_after_seconds, Some(60)),
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_surfaced_as_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(server.uri(), None);
        let err = client.generate(sample_request()).await.unwrap_err();

        match err {
            RemoteError::Http { status, .. } => assert_eq!(status, 500),
            other => panic!("expected Http, got {other:?}"),
        }
    }
}
