//! Paper and note records

use serde::{Deserialize, Serialize};

/// Lifecycle status of a paper within a session.
///
/// Ordered: a status only ever advances (`new < saved < analyzed < cited`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PaperStatus {
    #[default]
    New,
    Saved,
    Analyzed,
    Cited,
}

impl PaperStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Saved => "saved",
            Self::Analyzed => "analyzed",
            Self::Cited => "cited",
        }
    }
}

impl From<String> for PaperStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "saved" => Self::Saved,
            "analyzed" => Self::Analyzed,
            "cited" => Self::Cited,
            _ => Self::New,
        }
    }
}

impl std::fmt::Display for PaperStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A paper as returned by the research service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Stable identity (e.g. an arXiv accession number)
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub status: PaperStatus,
    /// Which corpus the paper came from (`hysts`, `hf`, `arxiv`)
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub added_at: Option<String>,
}

impl Paper {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            abstract_text: String::new(),
            url: String::new(),
            status: PaperStatus::New,
            source: String::new(),
            added_at: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Advance the status. Returns false when `status` would move it backwards.
    pub fn advance_status(&mut self, status: PaperStatus) -> bool {
        if status > self.status {
            self.status = status;
            true
        } else {
            false
        }
    }
}

/// A research note, optionally attached to a paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    #[serde(default)]
    pub paper_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
