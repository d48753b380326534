//! The result set of one search query

use crate::model::{Paper, PaperStatus};
use serde::Serialize;

/// An open-ended, paginated result set for a single query.
///
/// Papers are kept in rank order; later pages only ever append.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSession {
    pub query: String,
    pub source: String,
    papers: Vec<Paper>,
    /// Offset of the next page to request
    offset: usize,
    has_more: bool,
}

impl SearchSession {
    /// A session holding the first page, requested with `limit`.
    pub fn first_page(
        query: impl Into<String>,
        source: impl Into<String>,
        papers: Vec<Paper>,
        limit: usize,
        has_more: bool,
    ) -> Self {
        Self {
            query: query.into(),
            source: source.into(),
            papers,
            offset: limit,
            has_more,
        }
    }

    /// Append a page. The cursor advances by the page size requested, not
    /// by the number of papers returned.
    pub fn append_page(&mut self, papers: Vec<Paper>, requested: usize, has_more: bool) {
        self.papers.extend(papers);
        self.offset += requested;
        self.has_more = has_more;
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn get(&self, paper_id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == paper_id)
    }

    /// Advance the status of every copy of `paper_id`. Returns true if any changed.
    pub fn advance_status(&mut self, paper_id: &str, status: PaperStatus) -> bool {
        let mut changed = false;
        for paper in self.papers.iter_mut().filter(|p| p.id == paper_id) {
            changed |= paper.advance_status(status);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn papers(ids: &[&str]) -> Vec<Paper> {
        ids.iter().map(|id| Paper::new(*id, *id)).collect()
    }

    #[test]
    fn cursor_advances_by_requested_size() {
        let mut session = SearchSession::first_page("q", "hysts", papers(&["a", "b"]), 10, true);
        assert_eq!(session.offset(), 10);

        session.append_page(papers(&["c"]), 10, false);
        assert_eq!(session.offset(), 20);
        assert_eq!(session.len(), 3);
        assert!(!session.has_more());
    }

    #[test]
    fn append_preserves_rank_order() {
        let mut session = SearchSession::first_page("q", "hysts", papers(&["a", "b"]), 2, true);
        session.append_page(papers(&["c", "d"]), 2, true);
        let ids: Vec<_> = session.papers().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn status_advance_is_monotonic() {
        let mut session = SearchSession::first_page("q", "hysts", papers(&["a"]), 10, false);
        assert!(session.advance_status("a", PaperStatus::Analyzed));
        assert!(!session.advance_status("a", PaperStatus::Saved));
        assert!(!session.advance_status("missing", PaperStatus::Saved));
        assert_eq!(session.get("a").unwrap().status, PaperStatus::Analyzed);
    }
}
