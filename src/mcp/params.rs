//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchPapersParams {
    #[schemars(description = "Free-text search query")]
    pub query: String,
    #[schemars(description = "Maximum number of results (default from config)")]
    pub limit: Option<usize>,
    #[schemars(description = "Corpus to search, e.g. 'hysts'")]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzePaperParams {
    #[schemars(description = "Paper identifier, e.g. an arXiv id")]
    pub paper_id: String,
    #[schemars(description = "Model provider: 'gemini', 'openai', or 'anthropic'")]
    pub provider: Option<String>,
    #[schemars(description = "Provider API key to use for this request only")]
    pub api_key: Option<String>,
}
