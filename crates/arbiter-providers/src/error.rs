use thiserror::Error;

/// Errors that can occur while talking to a retrieval or generation backend
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend this operation needs is not configured
    #[error("{kind} provider is not configured")]
    NotConfigured {
        /// "retrieval" or "generation"
        kind: &'static str,
    },

    /// Upstream backend returned an error or was unreachable
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Upstream response could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether retrying the same call may succeed
    ///
    /// Transport and upstream failures are transient; a response we could
    /// not decode will not decode better on a second attempt.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

/// Convenience result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
