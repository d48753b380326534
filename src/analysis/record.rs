//! Per-(paper, tier) analysis records

use crate::model::{Tier, TierPayload};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Key of the record table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub paper_id: String,
    pub tier: Tier,
}

impl RecordKey {
    pub fn new(paper_id: impl Into<String>, tier: Tier) -> Self {
        Self {
            paper_id: paper_id.into(),
            tier,
        }
    }
}

/// State of one tier for one paper
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TierState {
    #[default]
    Absent,
    Loading,
    Ready { payload: TierPayload },
    Failed { error: String },
}

impl TierState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn payload(&self) -> Option<&TierPayload> {
        match self {
            Self::Ready { payload } => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Loading => "loading",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }
}

/// The analysis record of one tier for one paper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub paper_id: String,
    pub tier: Tier,
    pub state: TierState,
    /// Provider that served (or is serving) the latest attempt
    pub provider: Option<String>,
    /// Number of requests issued for this tier
    pub attempts: u32,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn absent(paper_id: impl Into<String>, tier: Tier) -> Self {
        Self {
            paper_id: paper_id.into(),
            tier,
            state: TierState::Absent,
            provider: None,
            attempts: 0,
            updated_at: Utc::now(),
        }
    }

    /// Enter `loading` for a new attempt.
    pub(crate) fn begin(&mut self, provider: &str) {
        self.state = TierState::Loading;
        self.provider = Some(provider.to_string());
        self.attempts += 1;
        self.updated_at = Utc::now();
    }

    pub(crate) fn settle(&mut self, state: TierState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}
