//! Error types for the plandesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; the top-level
//! [`Error`] names them after the failure kinds the request pipeline
//! reasons about.

use thiserror::Error;

/// The top-level error type for all plandesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion backend ---
    #[error("Completion failed: {0}")]
    CompletionFailed(#[from] ProviderError),

    // --- Chat history store ---
    #[error("History unavailable: {0}")]
    HistoryUnavailable(#[from] HistoryError),

    // --- Vector search ---
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(#[from] RetrievalError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::MalformedResponse(_) | Self::NotConfigured(_) => {
                false
            }
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    #[error("History store unreachable: {0}")]
    Unreachable(String),

    #[error("History query failed: {0}")]
    QueryFailed(String),

    #[error("Malformed history response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Search service returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),
}
