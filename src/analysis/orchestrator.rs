//! Analysis orchestrator for coordinating the three enrichment tiers
//!
//! Enforces at most one in-flight request per (paper, tier) and keeps each
//! tier's loading, ready, and failed state independent of the others.

use super::record::{AnalysisRecord, RecordKey, TierState};
use crate::model::{Tier, TierPayload};
use crate::notice::NoticeEmitter;
use crate::service::types::AnalyzeRequest;
use crate::service::{ResearchService, ServiceError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a tier trigger did
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// The tier was already loading for this paper; no request was issued
    Ignored,
    /// The request finished; the record is now `ready` or `failed`
    Settled(AnalysisRecord),
}

impl TriggerOutcome {
    pub fn record(&self) -> Option<&AnalysisRecord> {
        match self {
            Self::Settled(record) => Some(record),
            Self::Ignored => None,
        }
    }
}

/// Fails a `loading` record whose request future was dropped before settling,
/// so the tier can be triggered again.
struct Pending<'a> {
    records: &'a DashMap<RecordKey, AnalysisRecord>,
    key: &'a RecordKey,
    armed: bool,
}

impl<'a> Pending<'a> {
    fn new(records: &'a DashMap<RecordKey, AnalysisRecord>, key: &'a RecordKey) -> Self {
        Self {
            records,
            key,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(mut record) = self.records.get_mut(self.key) {
            if record.state.is_loading() {
                let tier = self.key.tier;
                warn!(paper_id = %self.key.paper_id, %tier, "analysis abandoned while loading");
                record.settle(TierState::Failed {
                    error: tier.fallback_error().to_string(),
                });
            }
        }
    }
}

/// Orchestrates basic, deep, and consensus analysis per paper.
///
/// Records are keyed by paper id and survive changes to the search session.
pub struct AnalysisOrchestrator {
    service: Arc<dyn ResearchService>,
    records: DashMap<RecordKey, AnalysisRecord>,
    notices: NoticeEmitter,
}

impl AnalysisOrchestrator {
    pub fn new(service: Arc<dyn ResearchService>) -> Self {
        Self {
            service,
            records: DashMap::new(),
            notices: NoticeEmitter::disconnected(),
        }
    }

    pub fn with_notices(mut self, notices: NoticeEmitter) -> Self {
        self.notices = notices;
        self
    }

    /// Basic single-pass analysis.
    ///
    /// `api_key` is forwarded with the request and not retained.
    pub async fn analyze(&self, paper_id: &str, provider: &str, api_key: Option<&str>) -> TriggerOutcome {
        self.trigger(Tier::Basic, paper_id, provider, api_key).await
    }

    /// Deep multi-pass analysis. Does not require a basic analysis.
    pub async fn analyze_deep(&self, paper_id: &str, provider: &str, api_key: Option<&str>) -> TriggerOutcome {
        self.trigger(Tier::Deep, paper_id, provider, api_key).await
    }

    /// Cross-agent consensus, aggregated by the service.
    pub async fn generate_consensus(
        &self,
        paper_id: &str,
        provider: &str,
        api_key: Option<&str>,
    ) -> TriggerOutcome {
        self.trigger(Tier::Consensus, paper_id, provider, api_key).await
    }

    /// Run one tier for one paper.
    pub async fn trigger(
        &self,
        tier: Tier,
        paper_id: &str,
        provider: &str,
        api_key: Option<&str>,
    ) -> TriggerOutcome {
        let key = RecordKey::new(paper_id, tier);
        if !self.begin(&key, provider) {
            debug!(paper_id, %tier, "tier already loading; ignoring trigger");
            return TriggerOutcome::Ignored;
        }

        debug!(paper_id, %tier, provider, byok = api_key.is_some(), "analysis issued");
        let mut pending = Pending::new(&self.records, &key);
        let request = AnalyzeRequest::new(paper_id, provider, api_key);
        let state = match self.request(tier, request).await {
            Ok(payload) => TierState::Ready { payload },
            Err(message) => TierState::Failed { error: message },
        };
        pending.disarm();

        let record = self.settle(&key, state);
        match &record.state {
            TierState::Ready { .. } => {
                info!(paper_id, %tier, "analysis ready");
                self.notices.success(format!("{} analysis ready for {}", tier, paper_id));
            }
            TierState::Failed { error } => {
                warn!(paper_id, %tier, error = %error, "analysis failed");
                self.notices.error(error.clone());
            }
            _ => {}
        }
        TriggerOutcome::Settled(record)
    }

    /// Move the record to `loading`. False if it already is.
    fn begin(&self, key: &RecordKey, provider: &str) -> bool {
        match self.records.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().state.is_loading() {
                    return false;
                }
                entry.get_mut().begin(provider);
            }
            Entry::Vacant(entry) => {
                let mut record = AnalysisRecord::absent(key.paper_id.clone(), key.tier);
                record.begin(provider);
                entry.insert(record);
            }
        }
        true
    }

    fn settle(&self, key: &RecordKey, state: TierState) -> AnalysisRecord {
        let mut record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| AnalysisRecord::absent(key.paper_id.clone(), key.tier));
        record.settle(state);
        record.clone()
    }

    /// Issue the tier's request and reduce the response to a payload or an error message.
    async fn request(&self, tier: Tier, request: AnalyzeRequest) -> Result<TierPayload, String> {
        let fallback = tier.fallback_error();
        let message = |e: ServiceError| e.message_or(fallback);
        let payload = match tier {
            Tier::Basic => {
                let response = self.service.analyze(request).await.map_err(message)?;
                response.analysis.map(TierPayload::Basic)
            }
            Tier::Deep => {
                let response = self.service.analyze_deep(request).await.map_err(message)?;
                let (page_count, sections_extracted) = (response.page_count, response.sections_extracted);
                response.analysis.map(|analysis| TierPayload::Deep {
                    page_count,
                    sections_extracted,
                    analysis,
                })
            }
            Tier::Consensus => {
                let response = self.service.consensus(request).await.map_err(message)?;
                response.consensus.map(TierPayload::Consensus)
            }
        };
        payload.ok_or_else(|| {
            warn!(%tier, "response carried no payload");
            fallback.to_string()
        })
    }

    /// Current record, or an `absent` one if the tier was never triggered.
    pub fn record(&self, paper_id: &str, tier: Tier) -> AnalysisRecord {
        self.records
            .get(&RecordKey::new(paper_id, tier))
            .map(|r| r.clone())
            .unwrap_or_else(|| AnalysisRecord::absent(paper_id, tier))
    }

    pub fn state(&self, paper_id: &str, tier: Tier) -> TierState {
        self.record(paper_id, tier).state
    }

    /// All three tier records for a paper, in tier order.
    pub fn records_for(&self, paper_id: &str) -> [AnalysisRecord; 3] {
        Tier::ALL.map(|tier| self.record(paper_id, tier))
    }

    pub fn is_loading(&self, paper_id: &str, tier: Tier) -> bool {
        self.state(paper_id, tier).is_loading()
    }

    /// Number of (paper, tier) records ever triggered
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
