//! ResearchDesk: one entry point over the store, the orchestrator, and the graph
//!
//! The CLI and the MCP bridge both go through the desk so that a tool call
//! and an interactive command produce the same results.

use crate::analysis::{AnalysisOrchestrator, TriggerOutcome};
use crate::config::{ClientConfig, ConfigError};
use crate::graph::{GraphModel, GraphModelBuilder, Point};
use crate::layout::ForceLayoutEngine;
use crate::model::Tier;
use crate::notice::{self, NoticeBoard, NoticeEmitter};
use crate::service::types::{ValidateKeyRequest, ValidateKeyResponse};
use crate::service::{HttpResearchService, ResearchService, ServiceError};
use crate::store::{LoadMoreOutcome, PaperCacheStore, SearchOutcome};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PaperscopeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

pub type PaperscopeResult<T> = Result<T, PaperscopeError>;

pub struct ResearchDesk {
    service: Arc<dyn ResearchService>,
    store: PaperCacheStore,
    orchestrator: AnalysisOrchestrator,
    notices: NoticeEmitter,
    config: ClientConfig,
}

impl ResearchDesk {
    /// A desk whose notices go nowhere.
    pub fn new(service: Arc<dyn ResearchService>, config: ClientConfig) -> Self {
        Self::assemble(service, config, NoticeEmitter::disconnected())
    }

    /// A desk plus the board its notices are published to.
    pub fn with_notice_board(service: Arc<dyn ResearchService>, config: ClientConfig) -> (Self, NoticeBoard) {
        let (emitter, board) = notice::channel(config.notice_lifetime(), config.max_notices);
        (Self::assemble(service, config, emitter), board)
    }

    /// A desk talking to the HTTP service at `config.api_base`.
    pub fn connect(config: ClientConfig) -> PaperscopeResult<Self> {
        config.validate()?;
        let service = HttpResearchService::new(config.api_base.clone(), config.request_timeout())?;
        info!(api_base = %config.api_base, "research service configured");
        Ok(Self::new(Arc::new(service), config))
    }

    fn assemble(service: Arc<dyn ResearchService>, config: ClientConfig, notices: NoticeEmitter) -> Self {
        Self {
            store: PaperCacheStore::new(Arc::clone(&service)).with_notices(notices.clone()),
            orchestrator: AnalysisOrchestrator::new(Arc::clone(&service)).with_notices(notices.clone()),
            service,
            notices,
            config,
        }
    }

    pub fn store(&self) -> &PaperCacheStore {
        &self.store
    }

    pub fn orchestrator(&self) -> &AnalysisOrchestrator {
        &self.orchestrator
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn notices(&self) -> &NoticeEmitter {
        &self.notices
    }

    /// Search with the configured source and page size unless given.
    pub async fn search(&self, query: &str, source: Option<&str>, limit: Option<usize>) -> SearchOutcome {
        let source = source.unwrap_or(&self.config.default_source);
        let limit = limit.unwrap_or(self.config.page_size);
        self.store.search(query, source, limit).await
    }

    pub async fn load_more(&self, limit: Option<usize>) -> LoadMoreOutcome {
        self.store.load_more(limit.unwrap_or(self.config.page_size)).await
    }

    pub async fn analyze(&self, paper_id: &str, provider: Option<&str>, api_key: Option<&str>) -> TriggerOutcome {
        self.run_tier(Tier::Basic, paper_id, provider, api_key).await
    }

    pub async fn analyze_deep(&self, paper_id: &str, provider: Option<&str>, api_key: Option<&str>) -> TriggerOutcome {
        self.run_tier(Tier::Deep, paper_id, provider, api_key).await
    }

    pub async fn generate_consensus(
        &self,
        paper_id: &str,
        provider: Option<&str>,
        api_key: Option<&str>,
    ) -> TriggerOutcome {
        self.run_tier(Tier::Consensus, paper_id, provider, api_key).await
    }

    /// Run a tier. A ready basic or deep analysis marks the paper analyzed.
    pub async fn run_tier(
        &self,
        tier: Tier,
        paper_id: &str,
        provider: Option<&str>,
        api_key: Option<&str>,
    ) -> TriggerOutcome {
        let provider = provider.unwrap_or(&self.config.default_provider);
        let outcome = self.orchestrator.trigger(tier, paper_id, provider, api_key).await;
        let ready = outcome.record().is_some_and(|r| r.state.is_ready());
        if ready && matches!(tier, Tier::Basic | Tier::Deep) {
            self.store.mark_analyzed(paper_id);
        }
        outcome
    }

    pub async fn save(&self, paper_id: &str) -> bool {
        self.store.save(paper_id).await
    }

    /// Check a caller-supplied key with the service.
    ///
    /// A request that fails outright is reported as an invalid key.
    pub async fn validate_key(&self, provider: &str, api_key: &str) -> ValidateKeyResponse {
        let request = ValidateKeyRequest {
            provider: provider.to_string(),
            api_key: api_key.to_string(),
        };
        match self.service.validate_key(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider, error = %e, "key validation request failed");
                ValidateKeyResponse {
                    valid: false,
                    provider: provider.to_string(),
                    model: String::new(),
                    error: Some(e.message_or("Key validation failed")),
                }
            }
        }
    }

    /// Fetch the graph and resolve it around `center`. `None` if the fetch failed.
    pub async fn build_graph(&self, center: Point) -> Option<GraphModel> {
        let response = self.store.fetch_graph().await?;
        let model = GraphModelBuilder::new().with_center(center).build_response(&response);
        info!(nodes = model.node_count(), edges = model.edge_count(), "graph built");
        Some(model)
    }

    /// A layout engine for `model` using the configured constants.
    pub fn layout(&self, model: GraphModel, center: Point) -> ForceLayoutEngine {
        ForceLayoutEngine::new(model, self.config.layout.clone()).with_center(center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BasicAnalysis, PaperStatus};
    use crate::service::mock::{numbered_papers, MockOp, MockService};
    use crate::service::types::{EdgeEndpoint, GraphEdgeData, GraphNodeData, GraphResponse};
    use std::time::Instant;

    fn desk(service: MockService) -> (Arc<MockService>, ResearchDesk) {
        let service = Arc::new(service);
        (service.clone(), ResearchDesk::new(service, ClientConfig::default()))
    }

    #[tokio::test]
    async fn search_uses_configured_defaults() {
        let (service, desk) = desk(MockService::new().with_corpus("agents", numbered_papers("2501", 12)));
        desk.search("agents", None, None).await;
        let request = &service.search_requests()[0];
        assert_eq!((request.source.as_str(), request.limit), ("hysts", 10));
    }

    #[tokio::test]
    async fn ready_analysis_marks_paper_analyzed() {
        let (_, desk) = desk(
            MockService::new()
                .with_corpus("agents", numbered_papers("2501", 3))
                .with_analysis("2501.00001", BasicAnalysis::default()),
        );
        desk.search("agents", None, None).await;
        desk.analyze("2501.00001", None, None).await;
        assert_eq!(desk.store().paper("2501.00001").unwrap().status, PaperStatus::Analyzed);

        // A failed tier leaves the status alone
        desk.analyze_deep("2501.00002", None, None).await;
        assert_eq!(desk.store().paper("2501.00002").unwrap().status, PaperStatus::New);
    }

    #[tokio::test]
    async fn provider_defaults_from_config() {
        let (service, desk) = desk(MockService::new());
        desk.generate_consensus("2501.12345", None, None).await;
        desk.generate_consensus("2501.12345", Some("anthropic"), Some("sk-test")).await;
        let requests = service.analyze_requests();
        assert_eq!(requests[0].provider, "gemini");
        assert_eq!(requests[1].provider, "anthropic");
        assert_eq!(service.calls(MockOp::Consensus), 2);
    }

    #[tokio::test]
    async fn validate_key_reports_service_answer() {
        let (_, desk) = desk(MockService::new().with_valid_key("openai", "gpt-4o"));
        let ok = desk.validate_key("openai", "sk-live").await;
        assert!(ok.valid);
        assert_eq!(ok.model, "gpt-4o");

        let bad = desk.validate_key("anthropic", "sk-live").await;
        assert!(!bad.valid);
        assert!(bad.error.is_some());
    }

    #[tokio::test]
    async fn build_graph_drops_dangling_edges() {
        let graph = GraphResponse {
            nodes: vec![
                GraphNodeData {
                    id: "arxiv:1".into(),
                    title: "A".into(),
                    kind: "paper".into(),
                    ..Default::default()
                },
                GraphNodeData {
                    id: "analysis_1".into(),
                    title: "Analysis (gemini)".into(),
                    kind: "analysis".into(),
                    ..Default::default()
                },
            ],
            edges: vec![
                GraphEdgeData {
                    source: EdgeEndpoint::Index(0),
                    target: EdgeEndpoint::Index(1),
                    relation: "analyzed_by".into(),
                    tag: None,
                },
                GraphEdgeData {
                    source: EdgeEndpoint::Index(0),
                    target: EdgeEndpoint::Index(9),
                    relation: "analyzed_by".into(),
                    tag: None,
                },
            ],
            ..Default::default()
        };
        let (_, desk) = desk(MockService::new().with_graph(Ok(graph)));
        let model = desk.build_graph(Point::new(400.0, 300.0)).await.unwrap();
        assert_eq!((model.node_count(), model.edge_count()), (2, 1));
    }

    #[tokio::test]
    async fn graph_fetch_failure_builds_nothing() {
        let (_, desk) = desk(MockService::new().with_graph(Err(ServiceError::Transport("refused".into()))));
        assert!(desk.build_graph(Point::ORIGIN).await.is_none());
        assert_eq!(desk.store().graph_error().as_deref(), Some("Failed to load graph"));
    }

    #[tokio::test]
    async fn failures_reach_the_notice_board() {
        let service = Arc::new(MockService::new().with_search_failure(
            "agents",
            ServiceError::Status {
                status: 503,
                detail: Some("Search backend unavailable".into()),
            },
        ));
        let (desk, mut board) = ResearchDesk::with_notice_board(service, ClientConfig::default());
        desk.search("agents", None, None).await;
        let shown = board.visible(Instant::now());
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].message, "Search backend unavailable");
    }
}
