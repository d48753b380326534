//! Errors from the remote research service

use thiserror::Error;

/// Failure of a single request to the research service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The request never produced a response (connection, timeout, body read)
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status; `detail` is the server's explanation if it sent one
    #[error("service returned {status}{}", .detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },

    /// An enveloped response flagged `isError`
    #[error("{0}")]
    Remote(String),
}

impl ServiceError {
    /// The message the server supplied, if any.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            Self::Transport(_) => None,
            Self::Status { detail, .. } => detail.as_deref(),
            Self::Remote(msg) => Some(msg.as_str()),
        }
    }

    /// The upstream message, or `fallback` when the server gave none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.upstream_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Result type for service requests
pub type ServiceResult<T> = Result<T, ServiceError>;
