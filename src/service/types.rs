//! Request and response shapes of the research service.
//!
//! Fields beyond the ones modeled here are ignored on decode. Every response
//! type implements `Default` so that a missing or malformed payload decodes
//! to an empty result instead of an error.

use crate::model::{BasicAnalysis, Consensus, DeepAnalysis, Note, Paper};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub source: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Paper>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub offset: usize,
}

/// Request body shared by the three analysis tiers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeRequest {
    pub paper_id: String,
    pub provider: String,
    /// Caller-supplied key, forwarded as-is and never stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(paper_id: impl Into<String>, provider: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            paper_id: paper_id.into(),
            provider: provider.into(),
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub paper_id: String,
    #[serde(default)]
    pub analysis: Option<BasicAnalysis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepAnalyzeResponse {
    #[serde(default)]
    pub paper_id: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub sections_extracted: u32,
    #[serde(default)]
    pub analysis: Option<DeepAnalysis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResponse {
    #[serde(default)]
    pub paper_id: String,
    #[serde(default)]
    pub consensus: Option<Consensus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryResponse {
    #[serde(default)]
    pub papers: Vec<Paper>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteRequest {
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesResponse {
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveRequest {
    pub paper_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub paper_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateKeyRequest {
    pub provider: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateKeyResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// A graph node as served by the graph endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNodeData {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// `paper` or `analysis`
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// An edge endpoint: a position in the node list, a node id, or an embedded node.
///
/// Anything else lands in `Unknown` so one bad edge cannot fail the whole
/// graph; the builder drops such edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeEndpoint {
    Index(i64),
    Id(String),
    Node(GraphNodeData),
    Unknown(serde_json::Value),
}

impl Default for EdgeEndpoint {
    fn default() -> Self {
        Self::Unknown(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdgeData {
    #[serde(default)]
    pub source: EdgeEndpoint,
    #[serde(default)]
    pub target: EdgeEndpoint,
    /// Relation kind (`analyzed_by`, `shared_tag`, ...)
    #[serde(default, rename = "type")]
    pub relation: String,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    #[serde(default)]
    pub papers: usize,
    #[serde(default)]
    pub analyses: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphResponse {
    #[serde(default)]
    pub nodes: Vec<GraphNodeData>,
    #[serde(default)]
    pub edges: Vec<GraphEdgeData>,
    #[serde(default)]
    pub stats: GraphStats,
}
