//! HTTP implementation of the research service client

use super::envelope::{decode, ServiceResponse};
use super::error::{ServiceError, ServiceResult};
use super::types::*;
use super::ResearchService;
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Research service reached over HTTP
pub struct HttpResearchService {
    client: Client,
    api_base: String,
}

impl HttpResearchService {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> ServiceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ServiceResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned + Default,
    {
        let url = self.endpoint(path);
        debug!(%method, %url, "research service request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let body = read_body(response).await?;
        decode(ServiceResponse::classify(body))
    }

    async fn get<T>(&self, path: &str) -> ServiceResult<T>
    where
        T: DeserializeOwned + Default,
    {
        self.send::<(), T>(Method::GET, path, None).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ServiceResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Default,
    {
        self.send(Method::POST, path, Some(body)).await
    }
}

/// Read a response body, turning non-success statuses into `ServiceError::Status`.
async fn read_body(response: Response) -> ServiceResult<Value> {
    let status = response.status();
    if status.is_success() {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&text).unwrap_or(Value::Null));
    }

    let detail = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| error_detail(&body));
    Err(ServiceError::Status {
        status: status.as_u16(),
        detail: detail.or_else(|| status.canonical_reason().map(str::to_string)),
    })
}

/// Pull the human-readable message out of an error body.
fn error_detail(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) if !other.is_null() => Some(other.to_string()),
        _ => body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

#[async_trait]
impl ResearchService for HttpResearchService {
    async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResponse> {
        self.post("/search", &request).await
    }

    async fn analyze(&self, request: AnalyzeRequest) -> ServiceResult<AnalyzeResponse> {
        self.post("/analyze", &request).await
    }

    async fn analyze_deep(&self, request: AnalyzeRequest) -> ServiceResult<DeepAnalyzeResponse> {
        self.post("/api/mcp/analyze-deep", &request).await
    }

    async fn consensus(&self, request: AnalyzeRequest) -> ServiceResult<ConsensusResponse> {
        self.post("/api/mcp/consensus", &request).await
    }

    async fn library(&self) -> ServiceResult<LibraryResponse> {
        self.get("/api/mcp/library").await
    }

    async fn notes(&self) -> ServiceResult<NotesResponse> {
        self.get("/api/mcp/notes").await
    }

    async fn add_note(&self, request: NoteRequest) -> ServiceResult<NotesResponse> {
        self.post("/api/mcp/note", &request).await
    }

    async fn save(&self, request: SaveRequest) -> ServiceResult<SaveResponse> {
        self.post("/api/mcp/save", &request).await
    }

    async fn graph(&self) -> ServiceResult<GraphResponse> {
        self.get("/api/mcp/graph").await
    }

    async fn validate_key(&self, request: ValidateKeyRequest) -> ServiceResult<ValidateKeyResponse> {
        self.post("/api/validate-key", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let service = HttpResearchService::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(service.api_base(), "http://localhost:8000");
        assert_eq!(service.endpoint("/search"), "http://localhost:8000/search");
    }

    #[test]
    fn error_detail_prefers_detail_field() {
        assert_eq!(
            error_detail(&json!({ "detail": "Unknown provider: foo" })).as_deref(),
            Some("Unknown provider: foo")
        );
        assert_eq!(
            error_detail(&json!({ "error": "rate limited" })).as_deref(),
            Some("rate limited")
        );
        assert_eq!(error_detail(&json!({})), None);
    }

    #[test]
    fn validation_error_detail_is_stringified() {
        let detail = error_detail(&json!({ "detail": [{ "msg": "field required" }] })).unwrap();
        assert!(detail.contains("field required"));
    }
}
