//! Remote research service client
//!
//! Defines the client trait the store and orchestrator depend on, the wire
//! types, and two implementations:
//! - `HttpResearchService`: talks to the research backend over HTTP (production)
//! - `MockService`: scripted responses with call counting and gates (testing)

mod envelope;
mod error;
mod http;
pub mod mock;
pub mod types;

pub use envelope::{decode, ServiceResponse};
pub use error::{ServiceError, ServiceResult};
pub use http::HttpResearchService;
pub use mock::MockService;

use async_trait::async_trait;
use types::*;

/// Client trait for the research service.
///
/// Abstracts over transport so the store and orchestrator don't depend on
/// how the service is reached. Implementations return decoded payloads;
/// envelope handling happens inside the implementation.
#[async_trait]
pub trait ResearchService: Send + Sync {
    async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResponse>;

    async fn analyze(&self, request: AnalyzeRequest) -> ServiceResult<AnalyzeResponse>;

    async fn analyze_deep(&self, request: AnalyzeRequest) -> ServiceResult<DeepAnalyzeResponse>;

    async fn consensus(&self, request: AnalyzeRequest) -> ServiceResult<ConsensusResponse>;

    async fn library(&self) -> ServiceResult<LibraryResponse>;

    async fn notes(&self) -> ServiceResult<NotesResponse>;

    async fn add_note(&self, request: NoteRequest) -> ServiceResult<NotesResponse>;

    async fn save(&self, request: SaveRequest) -> ServiceResult<SaveResponse>;

    async fn graph(&self) -> ServiceResult<GraphResponse>;

    async fn validate_key(&self, request: ValidateKeyRequest) -> ServiceResult<ValidateKeyResponse>;
}
