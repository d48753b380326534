//! Analysis tiers and their payloads

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of the three independent enrichment levels a paper may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Deep,
    Consensus,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Basic, Tier::Deep, Tier::Consensus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Deep => "deep",
            Self::Consensus => "consensus",
        }
    }

    /// Message recorded when the service gives no reason for a failure
    pub fn fallback_error(&self) -> &'static str {
        match self {
            Self::Basic => "Analysis failed",
            Self::Deep => "Deep analysis failed",
            Self::Consensus => "Consensus generation failed",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "deep" => Ok(Self::Deep),
            "consensus" => Ok(Self::Consensus),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 10.0)
    }
}

/// Provider metadata attached to a generated analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    #[serde(default)]
    pub bias_disclaimer: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub analysis_type: Option<String>,
    #[serde(default)]
    pub passes: Option<u32>,
}

/// Single-pass abstract analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicAnalysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub methodology: String,
    #[serde(default)]
    pub relevance_tags: Vec<String>,
    #[serde(default)]
    pub research_gaps: Vec<String>,
    #[serde(default)]
    pub strength_score: f64,
    #[serde(default)]
    pub provenance: HashMap<String, String>,
    #[serde(default, rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<AnalysisMeta>,
}

impl BasicAnalysis {
    /// Strength score bounded to [0, 10]
    pub fn strength(&self) -> f64 {
        clamp_score(self.strength_score)
    }
}

/// Findings of one pass of a deep analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAnalysis {
    /// `overview`, `methodology`, or `results`
    pub pass: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Multi-pass full-text analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepAnalysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub methodology_detail: String,
    #[serde(default)]
    pub key_contributions: Vec<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
    #[serde(default)]
    pub future_work: Vec<String>,
    #[serde(default)]
    pub strength_score: f64,
    #[serde(default)]
    pub relevance_tags: Vec<String>,
    #[serde(default)]
    pub research_gaps: Vec<String>,
    #[serde(default)]
    pub section_analyses: Vec<SectionAnalysis>,
    #[serde(default, rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<AnalysisMeta>,
}

impl DeepAnalysis {
    pub fn strength(&self) -> f64 {
        clamp_score(self.strength_score)
    }
}

/// A topic the compared agents disagreed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergencePoint {
    pub topic: String,
    #[serde(default)]
    pub positions: HashMap<String, String>,
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Cross-agent consensus synthesized server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    #[serde(default)]
    pub arxiv_id: String,
    #[serde(default)]
    pub agents_compared: Vec<String>,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub generated_by: String,
    #[serde(default)]
    pub agreement_score: f64,
    #[serde(default)]
    pub synthesized_summary: String,
    #[serde(default)]
    pub convergence_points: Vec<String>,
    #[serde(default)]
    pub divergence_points: Vec<DivergencePoint>,
    #[serde(default)]
    pub recommended_action: Option<String>,
    #[serde(default)]
    pub bias_cross_check: Option<String>,
    #[serde(default)]
    pub confidence_distribution: Option<HashMap<String, f64>>,
}

/// The result held by a `ready` tier record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tier", rename_all = "lowercase")]
pub enum TierPayload {
    Basic(BasicAnalysis),
    Deep {
        page_count: u32,
        sections_extracted: u32,
        analysis: DeepAnalysis,
    },
    Consensus(Consensus),
}

impl TierPayload {
    pub fn tier(&self) -> Tier {
        match self {
            Self::Basic(_) => Tier::Basic,
            Self::Deep { .. } => Tier::Deep,
            Self::Consensus(_) => Tier::Consensus,
        }
    }
}
