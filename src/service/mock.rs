//! Mock research service for testing.
//!
//! Returns preconfigured responses, counts calls per operation, records
//! search requests, and can park individual requests behind a gate until
//! the test releases them. Gates make request interleavings deterministic.

use super::error::{ServiceError, ServiceResult};
use super::types::*;
use super::ResearchService;
use crate::model::{BasicAnalysis, Consensus, DeepAnalysis, Note, Paper};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Service operations, for call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Search,
    Analyze,
    AnalyzeDeep,
    Consensus,
    Library,
    Notes,
    AddNote,
    Save,
    Graph,
    ValidateKey,
}

#[derive(Default)]
struct Script {
    corpora: HashMap<String, ServiceResult<Vec<Paper>>>,
    page_failures: HashMap<(String, usize), ServiceError>,
    analyses: HashMap<String, ServiceResult<AnalyzeResponse>>,
    deep: HashMap<String, ServiceResult<DeepAnalyzeResponse>>,
    consensus: HashMap<String, ServiceResult<ConsensusResponse>>,
    library: Option<ServiceResult<LibraryResponse>>,
    notes: Option<ServiceResult<Vec<Note>>>,
    saves: HashMap<String, ServiceError>,
    graph: Option<ServiceResult<GraphResponse>>,
    valid_keys: HashMap<String, String>,
}

/// Requests parked under one held key, numbered by arrival from 1
#[derive(Default)]
struct Gate {
    arrivals: usize,
    parked: HashMap<usize, Arc<Notify>>,
    /// Arrivals let through before they reached the gate
    released: HashSet<usize>,
}

/// Scripted research service.
///
/// Searches paginate over a per-query corpus: a request at `offset` with
/// `limit` returns that slice and `has_more` when papers remain beyond it.
#[derive(Default)]
pub struct MockService {
    script: Mutex<Script>,
    calls: Mutex<HashMap<MockOp, usize>>,
    search_log: Mutex<Vec<SearchRequest>>,
    analyze_log: Mutex<Vec<AnalyzeRequest>>,
    gates: Mutex<HashMap<String, Gate>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the full result corpus for a query.
    pub fn with_corpus(self, query: impl Into<String>, papers: Vec<Paper>) -> Self {
        lock(&self.script).corpora.insert(query.into(), Ok(papers));
        self
    }

    /// Make every search for `query` fail.
    pub fn with_search_failure(self, query: impl Into<String>, error: ServiceError) -> Self {
        lock(&self.script).corpora.insert(query.into(), Err(error));
        self
    }

    /// Make only the page of `query` starting at `offset` fail.
    pub fn with_page_failure(self, query: impl Into<String>, offset: usize, error: ServiceError) -> Self {
        lock(&self.script).page_failures.insert((query.into(), offset), error);
        self
    }

    pub fn with_analysis(self, paper_id: impl Into<String>, analysis: BasicAnalysis) -> Self {
        let paper_id = paper_id.into();
        let response = AnalyzeResponse {
            paper_id: paper_id.clone(),
            analysis: Some(analysis),
        };
        lock(&self.script).analyses.insert(paper_id, Ok(response));
        self
    }

    pub fn with_deep_analysis(
        self,
        paper_id: impl Into<String>,
        page_count: u32,
        analysis: DeepAnalysis,
    ) -> Self {
        let paper_id = paper_id.into();
        let response = DeepAnalyzeResponse {
            paper_id: paper_id.clone(),
            page_count,
            sections_extracted: analysis.section_analyses.len() as u32,
            analysis: Some(analysis),
        };
        lock(&self.script).deep.insert(paper_id, Ok(response));
        self
    }

    pub fn with_consensus(self, paper_id: impl Into<String>, consensus: Consensus) -> Self {
        let paper_id = paper_id.into();
        let response = ConsensusResponse {
            paper_id: paper_id.clone(),
            consensus: Some(consensus),
        };
        lock(&self.script).consensus.insert(paper_id, Ok(response));
        self
    }

    /// Make one tier fail for a paper.
    pub fn with_tier_failure(self, op: MockOp, paper_id: impl Into<String>, error: ServiceError) -> Self {
        let paper_id = paper_id.into();
        {
            let mut script = lock(&self.script);
            match op {
                MockOp::Analyze => {
                    script.analyses.insert(paper_id, Err(error));
                }
                MockOp::AnalyzeDeep => {
                    script.deep.insert(paper_id, Err(error));
                }
                MockOp::Consensus => {
                    script.consensus.insert(paper_id, Err(error));
                }
                _ => {}
            }
        }
        self
    }

    /// Answer one tier for a paper with a response that carries no payload.
    pub fn with_empty_payload(self, op: MockOp, paper_id: impl Into<String>) -> Self {
        let paper_id = paper_id.into();
        {
            let mut script = lock(&self.script);
            match op {
                MockOp::Analyze => {
                    let response = AnalyzeResponse { paper_id: paper_id.clone(), analysis: None };
                    script.analyses.insert(paper_id, Ok(response));
                }
                MockOp::AnalyzeDeep => {
                    let response = DeepAnalyzeResponse { paper_id: paper_id.clone(), ..Default::default() };
                    script.deep.insert(paper_id, Ok(response));
                }
                MockOp::Consensus => {
                    let response = ConsensusResponse { paper_id: paper_id.clone(), consensus: None };
                    script.consensus.insert(paper_id, Ok(response));
                }
                _ => {}
            }
        }
        self
    }

    pub fn with_library(self, result: ServiceResult<Vec<Paper>>) -> Self {
        lock(&self.script).library = Some(result.map(|papers| LibraryResponse { papers }));
        self
    }

    pub fn with_notes(self, result: ServiceResult<Vec<Note>>) -> Self {
        lock(&self.script).notes = Some(result);
        self
    }

    pub fn with_save_failure(self, paper_id: impl Into<String>, error: ServiceError) -> Self {
        lock(&self.script).saves.insert(paper_id.into(), error);
        self
    }

    pub fn with_graph(self, result: ServiceResult<GraphResponse>) -> Self {
        lock(&self.script).graph = Some(result);
        self
    }

    /// Accept `api_key` for `provider`, reporting `model`.
    pub fn with_valid_key(self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        lock(&self.script).valid_keys.insert(provider.into(), model.into());
        self
    }

    /// Park requests with this key until `release` is called.
    ///
    /// Keys are `search:<query>`, `<op>:<paper_id>` for the tiers
    /// (`analyze`, `deep`, `consensus`), and `library`, `notes`, `graph`.
    pub fn hold(&self, key: impl Into<String>) {
        lock(&self.gates).entry(key.into()).or_default();
    }

    /// Let every request parked on `key` proceed. Later requests are not held.
    pub fn release(&self, key: &str) {
        if let Some(gate) = lock(&self.gates).remove(key) {
            for notify in gate.parked.values() {
                notify.notify_one();
            }
        }
    }

    /// Let only the `nth` request to arrive at `key` proceed, counting from 1.
    ///
    /// The key stays held for every other request.
    pub fn release_nth(&self, key: &str, nth: usize) {
        let mut gates = lock(&self.gates);
        let Some(gate) = gates.get_mut(key) else {
            return;
        };
        match gate.parked.remove(&nth) {
            Some(notify) => notify.notify_one(),
            None => {
                gate.released.insert(nth);
            }
        }
    }

    /// Number of calls made to an operation so far
    pub fn calls(&self, op: MockOp) -> usize {
        lock(&self.calls).get(&op).copied().unwrap_or(0)
    }

    /// Every search request received, in order
    pub fn search_requests(&self) -> Vec<SearchRequest> {
        lock(&self.search_log).clone()
    }

    /// Every analysis request (any tier) received, in order
    pub fn analyze_requests(&self) -> Vec<AnalyzeRequest> {
        lock(&self.analyze_log).clone()
    }

    async fn enter(&self, op: MockOp, key: &str) {
        *lock(&self.calls).entry(op).or_insert(0) += 1;
        let parked = lock(&self.gates).get_mut(key).and_then(|gate| {
            gate.arrivals += 1;
            let nth = gate.arrivals;
            if gate.released.remove(&nth) {
                return None;
            }
            let notify = Arc::new(Notify::new());
            gate.parked.insert(nth, Arc::clone(&notify));
            Some(notify)
        });
        if let Some(notify) = parked {
            notify.notified().await;
        }
    }

    fn not_scripted<T>(what: &str, id: &str) -> ServiceResult<T> {
        Err(ServiceError::Status {
            status: 404,
            detail: Some(format!("no mock {} for '{}'", what, id)),
        })
    }
}

#[async_trait]
impl ResearchService for MockService {
    async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResponse> {
        lock(&self.search_log).push(request.clone());
        self.enter(MockOp::Search, &format!("search:{}", request.query)).await;

        let (corpus, page_failure) = {
            let script = lock(&self.script);
            let key = (request.query.clone(), request.offset);
            (script.corpora.get(&request.query).cloned(), script.page_failures.get(&key).cloned())
        };
        if let Some(error) = page_failure {
            return Err(error);
        }
        let papers = match corpus {
            Some(result) => result?,
            None => Vec::new(),
        };
        let start = request.offset.min(papers.len());
        let end = (request.offset + request.limit).min(papers.len());
        let results: Vec<Paper> = papers[start..end].to_vec();
        Ok(SearchResponse {
            count: results.len(),
            has_more: end < papers.len(),
            offset: request.offset,
            results,
        })
    }

    async fn analyze(&self, request: AnalyzeRequest) -> ServiceResult<AnalyzeResponse> {
        lock(&self.analyze_log).push(request.clone());
        self.enter(MockOp::Analyze, &format!("analyze:{}", request.paper_id)).await;
        let scripted = lock(&self.script).analyses.get(&request.paper_id).cloned();
        scripted.unwrap_or_else(|| Self::not_scripted("analysis", &request.paper_id))
    }

    async fn analyze_deep(&self, request: AnalyzeRequest) -> ServiceResult<DeepAnalyzeResponse> {
        lock(&self.analyze_log).push(request.clone());
        self.enter(MockOp::AnalyzeDeep, &format!("deep:{}", request.paper_id)).await;
        let scripted = lock(&self.script).deep.get(&request.paper_id).cloned();
        scripted.unwrap_or_else(|| Self::not_scripted("deep analysis", &request.paper_id))
    }

    async fn consensus(&self, request: AnalyzeRequest) -> ServiceResult<ConsensusResponse> {
        lock(&self.analyze_log).push(request.clone());
        self.enter(MockOp::Consensus, &format!("consensus:{}", request.paper_id)).await;
        let scripted = lock(&self.script).consensus.get(&request.paper_id).cloned();
        scripted.unwrap_or_else(|| Self::not_scripted("consensus", &request.paper_id))
    }

    async fn library(&self) -> ServiceResult<LibraryResponse> {
        self.enter(MockOp::Library, "library").await;
        lock(&self.script)
            .library
            .clone()
            .unwrap_or_else(|| Ok(LibraryResponse::default()))
    }

    async fn notes(&self) -> ServiceResult<NotesResponse> {
        self.enter(MockOp::Notes, "notes").await;
        let notes = lock(&self.script)
            .notes
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(NotesResponse { notes })
    }

    async fn add_note(&self, request: NoteRequest) -> ServiceResult<NotesResponse> {
        self.enter(MockOp::AddNote, "add_note").await;
        let mut script = lock(&self.script);
        let mut notes = match script.notes.clone() {
            Some(result) => result?,
            None => Vec::new(),
        };
        notes.push(Note {
            id: notes.len() as i64 + 1,
            paper_id: request.paper_id,
            content: request.content,
            tags: request.tags,
            created_at: None,
            updated_at: None,
        });
        script.notes = Some(Ok(notes.clone()));
        Ok(NotesResponse { notes })
    }

    async fn save(&self, request: SaveRequest) -> ServiceResult<SaveResponse> {
        self.enter(MockOp::Save, &format!("save:{}", request.paper_id)).await;
        if let Some(error) = lock(&self.script).saves.get(&request.paper_id).cloned() {
            return Err(error);
        }
        Ok(SaveResponse {
            status: "saved".to_string(),
            paper_id: request.paper_id,
        })
    }

    async fn graph(&self) -> ServiceResult<GraphResponse> {
        self.enter(MockOp::Graph, "graph").await;
        lock(&self.script)
            .graph
            .clone()
            .unwrap_or_else(|| Ok(GraphResponse::default()))
    }

    async fn validate_key(&self, request: ValidateKeyRequest) -> ServiceResult<ValidateKeyResponse> {
        self.enter(MockOp::ValidateKey, "validate_key").await;
        let model = lock(&self.script).valid_keys.get(&request.provider).cloned();
        Ok(match model {
            Some(model) if !request.api_key.is_empty() => ValidateKeyResponse {
                valid: true,
                provider: request.provider,
                model,
                error: None,
            },
            _ => ValidateKeyResponse {
                valid: false,
                provider: request.provider,
                model: String::new(),
                error: Some("invalid API key".to_string()),
            },
        })
    }
}

/// Helper to build `n` numbered papers for a corpus.
pub fn numbered_papers(prefix: &str, n: usize) -> Vec<Paper> {
    (0..n)
        .map(|i| Paper::new(format!("{}.{:05}", prefix, i), format!("Paper {}", i)).with_source("hysts"))
        .collect()
}
