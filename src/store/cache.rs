//! PaperCacheStore: owns the visible papers for a query and the side collections

use super::session::SearchSession;
use crate::model::{Note, Paper, PaperStatus};
use crate::notice::NoticeEmitter;
use crate::service::types::{GraphResponse, NoteRequest, SaveRequest, SearchRequest};
use crate::service::ResearchService;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// What a `search` call did
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Empty or whitespace query; nothing was requested
    Skipped,
    /// The response was committed as the new session
    Committed(Vec<Paper>),
    /// A newer search was issued while this one was in flight; the response was discarded
    Superseded,
    /// The request failed; the session is empty and carries this message
    Failed(String),
}

/// What a `load_more` call did
#[derive(Debug, Clone, PartialEq)]
pub enum LoadMoreOutcome {
    /// No committed session, or a load-more already in flight
    Skipped,
    /// The page was appended to the session
    Appended(Vec<Paper>),
    /// The session was replaced while the page was in flight; the page was discarded
    Superseded,
    /// The page failed; already-loaded papers are kept
    Failed(String),
}

/// Point-in-time view of the search side of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub query: Option<String>,
    pub papers: Vec<Paper>,
    pub offset: usize,
    pub has_more: bool,
    pub searching: bool,
    pub loading_more: bool,
    pub search_error: Option<String>,
    pub load_more_error: Option<String>,
}

#[derive(Debug, Default)]
struct StoreState {
    /// Bumped by every search; only the response carrying the latest token commits
    search_token: u64,
    searching: bool,
    session: Option<SearchSession>,
    search_error: Option<String>,
    loading_more: bool,
    load_more_error: Option<String>,
    library: Vec<Paper>,
    notes: Vec<Note>,
    graph: Option<GraphResponse>,
    graph_error: Option<String>,
}

fn lock_state(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears an in-flight flag when a request future is dropped before it settles.
///
/// Only touches the flag while `token` is still the latest search.
struct InFlight<'a> {
    state: &'a Mutex<StoreState>,
    token: u64,
    flag: fn(&mut StoreState) -> &mut bool,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<StoreState>, token: u64, flag: fn(&mut StoreState) -> &mut bool) -> Self {
        Self {
            state,
            token,
            flag,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock_state(self.state);
        if state.search_token == self.token {
            debug!(token = self.token, "request abandoned before settling");
            *(self.flag)(&mut state) = false;
        }
    }
}

/// Memory-resident cache of search results and related collections.
///
/// State transitions happen in short critical sections between awaits; the
/// lock is never held while a request is in flight.
pub struct PaperCacheStore {
    service: Arc<dyn ResearchService>,
    state: Mutex<StoreState>,
    notices: NoticeEmitter,
}

impl PaperCacheStore {
    pub fn new(service: Arc<dyn ResearchService>) -> Self {
        Self {
            service,
            state: Mutex::new(StoreState::default()),
            notices: NoticeEmitter::disconnected(),
        }
    }

    pub fn with_notices(mut self, notices: NoticeEmitter) -> Self {
        self.notices = notices;
        self
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        lock_state(&self.state)
    }

    /// Start a new search session, discarding the current one.
    ///
    /// Only the most recently issued search may commit: a response arriving
    /// after a newer `search` call is discarded.
    pub async fn search(&self, query: &str, source: &str, limit: usize) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            debug!("ignoring empty search query");
            return SearchOutcome::Skipped;
        }

        let token = {
            let mut state = self.lock();
            state.search_token += 1;
            state.searching = true;
            state.session = None;
            state.search_error = None;
            state.loading_more = false;
            state.load_more_error = None;
            state.search_token
        };

        debug!(query, source, limit, token, "search issued");
        let mut pending = InFlight::new(&self.state, token, |s| &mut s.searching);
        let result = self
            .service
            .search(SearchRequest {
                query: query.to_string(),
                limit,
                source: source.to_string(),
                offset: 0,
            })
            .await;
        pending.disarm();

        let failure = {
            let mut state = self.lock();
            if state.search_token != token {
                debug!(query, token, latest = state.search_token, "discarding stale search response");
                return SearchOutcome::Superseded;
            }
            state.searching = false;
            match result {
                Ok(response) => {
                    info!(query, results = response.results.len(), has_more = response.has_more, "search committed");
                    let papers = response.results;
                    state.session = Some(SearchSession::first_page(
                        query,
                        source,
                        papers.clone(),
                        limit,
                        response.has_more,
                    ));
                    return SearchOutcome::Committed(papers);
                }
                Err(e) => {
                    let message = e.message_or("Search failed");
                    warn!(query, error = %e, "search failed");
                    state.search_error = Some(message.clone());
                    message
                }
            }
        };
        self.notices.error(failure.clone());
        SearchOutcome::Failed(failure)
    }

    /// Request the next page of the current session and append it.
    ///
    /// No-op when no search has committed or a load-more is already in flight.
    pub async fn load_more(&self, limit: usize) -> LoadMoreOutcome {
        let (token, request) = {
            let mut state = self.lock();
            if state.loading_more {
                debug!("load-more already in flight");
                return LoadMoreOutcome::Skipped;
            }
            let Some(session) = state.session.as_ref() else {
                debug!("load-more without a committed search");
                return LoadMoreOutcome::Skipped;
            };
            let request = SearchRequest {
                query: session.query.clone(),
                limit,
                source: session.source.clone(),
                offset: session.offset(),
            };
            state.loading_more = true;
            state.load_more_error = None;
            (state.search_token, request)
        };

        debug!(query = %request.query, offset = request.offset, limit, "load-more issued");
        let mut pending = InFlight::new(&self.state, token, |s| &mut s.loading_more);
        let result = self.service.search(request).await;
        pending.disarm();

        let failure = {
            let mut state = self.lock();
            if state.search_token != token {
                debug!("discarding load-more page for a replaced session");
                return LoadMoreOutcome::Superseded;
            }
            state.loading_more = false;
            match result {
                Ok(response) => {
                    let Some(session) = state.session.as_mut() else {
                        return LoadMoreOutcome::Superseded;
                    };
                    session.append_page(response.results.clone(), limit, response.has_more);
                    info!(total = session.len(), has_more = session.has_more(), "page appended");
                    return LoadMoreOutcome::Appended(response.results);
                }
                Err(e) => {
                    let message = e.message_or("Load more failed");
                    warn!(error = %e, "load-more failed");
                    state.load_more_error = Some(message.clone());
                    message
                }
            }
        };
        self.notices.error(failure.clone());
        LoadMoreOutcome::Failed(failure)
    }

    /// Mark a paper saved locally. Does not contact the service.
    pub fn mark_saved(&self, paper_id: &str) -> bool {
        self.advance_status(paper_id, PaperStatus::Saved)
    }

    /// Record that a paper has a finished analysis.
    pub fn mark_analyzed(&self, paper_id: &str) -> bool {
        self.advance_status(paper_id, PaperStatus::Analyzed)
    }

    fn advance_status(&self, paper_id: &str, status: PaperStatus) -> bool {
        let mut state = self.lock();
        let mut changed = state
            .session
            .as_mut()
            .map(|s| s.advance_status(paper_id, status))
            .unwrap_or(false);
        for paper in state.library.iter_mut().filter(|p| p.id == paper_id) {
            changed |= paper.advance_status(status);
        }
        changed
    }

    /// Save a paper to the remote library, then mark it saved locally.
    pub async fn save(&self, paper_id: &str) -> bool {
        let result = self
            .service
            .save(SaveRequest {
                paper_id: paper_id.to_string(),
            })
            .await;
        match result {
            Ok(_) => {
                self.mark_saved(paper_id);
                self.notices.success(format!("Saved {}", paper_id));
                true
            }
            Err(e) => {
                warn!(paper_id, error = %e, "save failed");
                self.notices.error(e.message_or("Save failed"));
                false
            }
        }
    }

    /// Refresh the library collection. A failure leaves it empty.
    pub async fn fetch_library(&self) -> Vec<Paper> {
        let papers = match self.service.library().await {
            Ok(response) => response.papers,
            Err(e) => {
                debug!(error = %e, "library unavailable; treating as empty");
                Vec::new()
            }
        };
        self.lock().library = papers.clone();
        papers
    }

    /// Refresh the notes collection. A failure leaves it empty.
    pub async fn fetch_notes(&self) -> Vec<Note> {
        let notes = match self.service.notes().await {
            Ok(response) => response.notes,
            Err(e) => {
                debug!(error = %e, "notes unavailable; treating as empty");
                Vec::new()
            }
        };
        self.lock().notes = notes.clone();
        notes
    }

    /// Add a note; on success the notes collection is replaced by the service's list.
    pub async fn add_note(&self, content: &str, tags: Vec<String>, paper_id: Option<&str>) -> bool {
        let result = self
            .service
            .add_note(NoteRequest {
                content: content.to_string(),
                tags,
                paper_id: paper_id.map(str::to_string),
            })
            .await;
        match result {
            Ok(response) => {
                self.lock().notes = response.notes;
                self.notices.success("Note added");
                true
            }
            Err(e) => {
                warn!(error = %e, "add note failed");
                self.notices.error(e.message_or("Failed to add note"));
                false
            }
        }
    }

    /// Fetch the relationship graph. On failure the previous graph is kept
    /// and `None` is returned.
    pub async fn fetch_graph(&self) -> Option<GraphResponse> {
        match self.service.graph().await {
            Ok(graph) => {
                let mut state = self.lock();
                state.graph = Some(graph.clone());
                state.graph_error = None;
                Some(graph)
            }
            Err(e) => {
                let message = e.message_or("Failed to load graph");
                warn!(error = %e, "graph fetch failed");
                self.lock().graph_error = Some(message);
                None
            }
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.lock();
        let (query, papers, offset, has_more) = match &state.session {
            Some(s) => (Some(s.query.clone()), s.papers().to_vec(), s.offset(), s.has_more()),
            None => (None, Vec::new(), 0, false),
        };
        StoreSnapshot {
            query,
            papers,
            offset,
            has_more,
            searching: state.searching,
            loading_more: state.loading_more,
            search_error: state.search_error.clone(),
            load_more_error: state.load_more_error.clone(),
        }
    }

    pub fn papers(&self) -> Vec<Paper> {
        self.lock()
            .session
            .as_ref()
            .map(|s| s.papers().to_vec())
            .unwrap_or_default()
    }

    pub fn session(&self) -> Option<SearchSession> {
        self.lock().session.clone()
    }

    pub fn paper(&self, paper_id: &str) -> Option<Paper> {
        let state = self.lock();
        state
            .session
            .as_ref()
            .and_then(|s| s.get(paper_id))
            .or_else(|| state.library.iter().find(|p| p.id == paper_id))
            .cloned()
    }

    pub fn library(&self) -> Vec<Paper> {
        self.lock().library.clone()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    pub fn graph(&self) -> Option<GraphResponse> {
        self.lock().graph.clone()
    }

    pub fn graph_error(&self) -> Option<String> {
        self.lock().graph_error.clone()
    }
}
