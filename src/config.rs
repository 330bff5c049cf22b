//! Configuration for chunking budgets and the OpenAI-compatible provider.

use std::time::Duration;

use thiserror::Error;

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-ada-002";

/// Default token budget per provider request.
///
/// text-embedding-ada-002 accepts 8191 tokens per request; 6000 leaves
/// headroom for provider-side accounting differences.
pub const DEFAULT_MAX_TOKENS_PER_CHUNK: usize = 6000;

/// Provider-imposed cap on entries per request.
///
/// https://platform.openai.com/docs/api-reference/embeddings/create
pub const DEFAULT_MAX_ENTRIES_PER_CHUNK: usize = 2048;

/// Default embedding price per 1000 tokens, in USD.
pub const DEFAULT_COST_PER_1K_TOKENS: f64 = 0.0001;

/// Errors raised while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The API key was neither passed in nor present in the environment.
    #[error("missing OpenAI API key: set {var} or pass the key explicitly")]
    MissingApiKey { var: &'static str },
}

/// Budgets and model selection for a pipeline run.
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    /// Embedding model name, used both for tokenization and provider calls.
    pub model: String,
    /// Maximum token sum per chunk; single records are truncated to fit.
    pub max_tokens_per_chunk: usize,
    /// Maximum number of records per chunk.
    pub max_entries_per_chunk: usize,
    /// Price per 1000 tokens, used for the telemetry cost estimate.
    pub cost_per_1k_tokens: f64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens_per_chunk: DEFAULT_MAX_TOKENS_PER_CHUNK,
            max_entries_per_chunk: DEFAULT_MAX_ENTRIES_PER_CHUNK,
            cost_per_1k_tokens: DEFAULT_COST_PER_1K_TOKENS,
        }
    }
}

impl EmbeddingConfig {
    /// Config for a specific model with default budgets.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Estimated cost in USD for embedding `total_tokens` tokens.
    pub fn estimated_cost(&self, total_tokens: usize) -> f64 {
        (total_tokens as f64 / 1000.0) * self.cost_per_1k_tokens
    }
}

/// Connection settings for the OpenAI-compatible embeddings endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Bearer token for the `Authorization` header.
    pub api_key: String,
    /// Full URL of the embeddings endpoint.
    pub endpoint: String,
    /// Bounded retry budget for transient transport failures.
    pub max_retries: u32,
    /// Per-request timeout covering connect, send, and response body.
    pub timeout: Duration,
}

impl OpenAiConfig {
    const API_KEY_VAR: &'static str = "OPENAI_API_KEY";
    const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1/embeddings";

    /// Settings with the given key and stock defaults.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            max_retries: 5,
            timeout: Duration::from_secs(60),
        }
    }

    /// Loads the API key from the environment (honoring a `.env` file).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Best effort: a missing .env file is not an error.
        let _ = dotenvy::dotenv();
        let api_key = std::env::var(Self::API_KEY_VAR)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey {
                var: Self::API_KEY_VAR,
            })?;
        Ok(Self::new(api_key))
    }

    /// Point requests at an OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the transient-failure retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
