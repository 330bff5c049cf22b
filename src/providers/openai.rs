//! OpenAI-compatible embeddings client over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{EmbeddingProvider, ProviderError};
use crate::config::OpenAiConfig;
use crate::types::EmbeddingVector;

const BACKOFF_BASE: Duration = Duration::from_millis(500);
const BACKOFF_CAP: Duration = Duration::from_secs(8);

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Batch embedding client for the OpenAI `/v1/embeddings` endpoint.
///
/// Applies its own bounded exponential backoff to transient failures
/// (transport errors, 429, 5xx) before surfacing a [`ProviderError`]; callers
/// never see a retry in flight. Count mismatches and malformed bodies are
/// surfaced immediately.
#[derive(Clone, Debug)]
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
    model: String,
}

impl OpenAiEmbeddingProvider {
    /// Builds a client for `model` against the configured endpoint.
    pub fn new(config: OpenAiConfig, model: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            model: model.into(),
        })
    }

    /// Model sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, ProviderError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;

        // The API documents input-order responses; ordering by the returned
        // index field keeps the 1:1 mapping even if that ever changes.
        let mut data = body.data;
        data.sort_by_key(|datum| datum.index);
        Ok(data.into_iter().map(|datum| datum.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    #[instrument(skip(self, texts), fields(model = %self.model, batch_size = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, ProviderError> {
        if texts.is_empty() {
            debug!("empty batch, skipping provider call");
            return Ok(Vec::new());
        }

        let mut attempt = 0u32;
        let vectors = loop {
            match self.request(texts).await {
                Ok(vectors) => break vectors,
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let backoff = BACKOFF_BASE
                        .saturating_mul(1 << attempt.min(16))
                        .min(BACKOFF_CAP);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient provider failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        if vectors.len() != texts.len() {
            return Err(ProviderError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }

        debug!(
            count = vectors.len(),
            dimension = vectors.first().map(Vec::len).unwrap_or(0),
            "embedding batch complete"
        );
        Ok(vectors)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
