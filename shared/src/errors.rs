//! Shared error types for provider communication

use thiserror::Error;

/// Failure modes for LLM provider calls (generation and embeddings)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("provider '{provider}' does not support embeddings")]
    EmbeddingsUnsupported { provider: String },

    #[error("no embedding returned")]
    EmptyEmbedding,
}

pub type ProviderResult<T> = Result<T, ProviderError>;
