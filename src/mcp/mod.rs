//! MCP server for paperscope: exposes search and the three analysis tiers
//! over the Model Context Protocol.
//!
//! Every tool goes through the same `ResearchDesk` entry points as the CLI
//! and returns the payload a direct caller would receive, as JSON text.

pub mod params;

use crate::analysis::{TierState, TriggerOutcome};
use crate::config::ClientConfig;
use crate::desk::ResearchDesk;
use crate::model::Tier;
use crate::store::SearchOutcome;
use params::*;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

fn ok_text(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => ok_text(text),
        Err(e) => err_text(format!("failed to encode result: {}", e)),
    }
}

/// Map a tier outcome to a tool result.
pub fn tier_result(tier: Tier, paper_id: &str, outcome: &TriggerOutcome) -> Result<CallToolResult, McpError> {
    match outcome.record().map(|r| &r.state) {
        None => err_text(format!("{} analysis already running for {}", tier, paper_id)),
        Some(TierState::Ready { payload }) => ok_json(payload),
        Some(TierState::Failed { error }) => err_text(error.clone()),
        Some(state) => err_text(format!("{} analysis for {} is {}", tier, paper_id, state.label())),
    }
}

#[derive(Serialize)]
struct SearchResult<'a> {
    query: &'a str,
    results: &'a [crate::model::Paper],
    count: usize,
    has_more: bool,
    offset: usize,
}

#[derive(Clone)]
pub struct PaperscopeMcpServer {
    desk: Arc<ResearchDesk>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PaperscopeMcpServer {
    pub fn new(desk: Arc<ResearchDesk>) -> Self {
        Self {
            desk,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Search the paper corpus and start a new result session")]
    async fn search_papers(
        &self,
        Parameters(p): Parameters<SearchPapersParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.desk.search(&p.query, p.source.as_deref(), p.limit).await;
        match outcome {
            SearchOutcome::Committed(papers) => {
                let snapshot = self.desk.store().snapshot();
                ok_json(&SearchResult {
                    query: p.query.trim(),
                    count: papers.len(),
                    results: &papers,
                    has_more: snapshot.has_more,
                    offset: 0,
                })
            }
            SearchOutcome::Skipped => err_text("query must not be empty".to_string()),
            SearchOutcome::Superseded => err_text("search was superseded by a newer one".to_string()),
            SearchOutcome::Failed(message) => err_text(message),
        }
    }

    #[tool(description = "Run a basic single-pass AI analysis of a paper")]
    async fn analyze_paper(
        &self,
        Parameters(p): Parameters<AnalyzePaperParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .desk
            .analyze(&p.paper_id, p.provider.as_deref(), p.api_key.as_deref())
            .await;
        tier_result(Tier::Basic, &p.paper_id, &outcome)
    }

    #[tool(description = "Run a deep multi-pass analysis over the paper's full text")]
    async fn analyze_paper_deep(
        &self,
        Parameters(p): Parameters<AnalyzePaperParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .desk
            .analyze_deep(&p.paper_id, p.provider.as_deref(), p.api_key.as_deref())
            .await;
        tier_result(Tier::Deep, &p.paper_id, &outcome)
    }

    #[tool(description = "Compare analyses from several agents and synthesize a consensus")]
    async fn generate_consensus(
        &self,
        Parameters(p): Parameters<AnalyzePaperParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .desk
            .generate_consensus(&p.paper_id, p.provider.as_deref(), p.api_key.as_deref())
            .await;
        tier_result(Tier::Consensus, &p.paper_id, &outcome)
    }
}

#[tool_handler]
impl ServerHandler for PaperscopeMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "paperscope MCP server: paper search plus basic, deep, and consensus analysis".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Serve the bridge on stdio until the client disconnects. Returns an exit code.
pub fn run_mcp_server(config: ClientConfig) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let desk = match ResearchDesk::connect(config) {
            Ok(desk) => desk,
            Err(e) => {
                eprintln!("failed to configure research service: {}", e);
                return 1;
            }
        };
        let server = PaperscopeMcpServer::new(Arc::new(desk));

        info!("paperscope mcp server starting on stdio");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to start MCP server");
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            error!(error = %e, "MCP server error");
            return 1;
        }

        0
    })
}
