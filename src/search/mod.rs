pub mod providers;
pub mod record;

pub use record::{RegistryId, ResultRecord};

/// Text surfaced when no better description of a failure is available.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to fetch data.";

/// Lookup backend abstraction - the controller only ever talks to this
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Look up records matching an already-trimmed, non-empty query
    async fn lookup(&self, query: &str) -> Result<Vec<ResultRecord>, SearchError>;
}

/// Lookup errors
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("<no error message>"))]
    HttpStatus { status: u16, message: Option<String> },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl SearchError {
    /// Message shown to the user for this failure.
    ///
    /// A server-supplied message wins, then a status-coded one; everything
    /// else collapses to the generic text.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::HttpStatus {
                message: Some(message),
                ..
            } => message.clone(),
            SearchError::HttpStatus { status, .. } => format!("HTTP error! status: {}", status),
            SearchError::InvalidEndpoint(_)
            | SearchError::Transport(_)
            | SearchError::Malformed(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
