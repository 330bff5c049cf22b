//! Embedding provider boundary.
//!
//! The pipeline only ever sees [`EmbeddingProvider`]: an ordered batch of
//! texts in, one vector per text out, in the same order. Anything else —
//! transport retries, authentication, response parsing — is the provider
//! implementation's business and stays behind the trait.

pub mod mock;
pub mod openai;

use async_trait::async_trait;

use crate::types::EmbeddingVector;

pub use mock::MockEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;

/// Errors surfaced by an embedding provider for a single batch.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request never produced a usable response (connect, timeout, TLS).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be parsed into embeddings.
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),

    /// The provider returned a different number of vectors than inputs.
    /// Never treated as a partial success.
    #[error("provider returned {got} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

impl ProviderError {
    /// Whether a bounded in-client retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::InvalidResponse(_) | ProviderError::CountMismatch { .. } => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// A batch embedding backend.
///
/// Implementations must return exactly one vector per input string, in input
/// order, or fail the whole batch. An empty batch resolves to an empty list
/// without contacting anything.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every text in `texts`, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, ProviderError>;

    /// Short human-readable identifier for logs and telemetry.
    fn name(&self) -> &str {
        "unnamed"
    }
}
