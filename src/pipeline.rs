//! Resumable embedding pipeline orchestration.
//!
//! One run moves through `INIT → RESUMING → CHUNKING → SUBMITTING(i) →
//! COMPLETE | FAILED`. The pipeline loads any prior checkpoint for the input
//! hash, chunks only the unprocessed remainder, submits chunks to the
//! provider strictly in order, and rewrites the checkpoint after every
//! successful chunk. A provider failure leaves the checkpoint at the last
//! completed chunk boundary and surfaces a resumable error; re-invoking with
//! the identical `(records, hash)` picks up exactly where the failed run
//! stopped. The pipeline never retries on its own — resumption is always
//! caller-initiated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::chunking::{Chunker, ChunkingError};
use crate::config::EmbeddingConfig;
use crate::providers::{EmbeddingProvider, ProviderError};
use crate::types::{is_valid_hash_key, EmbeddingVector, Record};

/// Terminal failure of a pipeline invocation.
///
/// Resumability is structural: [`PipelineError::is_resumable`] distinguishes
/// "retry with the same hash" from "do not retry automatically" without
/// inspecting messages.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Malformed input, rejected before any provider call. No checkpoint is
    /// written or altered.
    #[error(transparent)]
    Validation(#[from] ChunkingError),

    /// The checkpoint key cannot be used as a storage identifier.
    #[error("invalid checkpoint hash '{hash}': expected ASCII alphanumerics, '-' or '_'")]
    InvalidHash { hash: String },

    /// The provider failed on a chunk. Everything before that chunk is
    /// durably checkpointed under `hash`; re-invoking with the same records
    /// and hash resumes from `saved_count`.
    #[error(
        "provider failed on chunk {chunk_index}; {saved_count} embeddings are checkpointed \
         under '{hash}' and the attempt is resumable with the same input and hash"
    )]
    Provider {
        hash: String,
        chunk_index: usize,
        saved_count: usize,
        #[source]
        source: ProviderError,
    },

    /// A cancellation signal was observed between chunks. Equivalent to a
    /// transient provider failure from the caller's perspective.
    #[error("run cancelled; {saved_count} embeddings are checkpointed under '{hash}'")]
    Cancelled { hash: String, saved_count: usize },

    /// The durable store failed. Fatal: prior checkpoint state can no longer
    /// be trusted.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// A structural impossibility — a bug, not an operational condition.
    /// Never retried.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl PipelineError {
    /// Whether re-invoking with the same `(records, hash)` is expected to
    /// make forward progress rather than redo completed work.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            PipelineError::Provider { .. } | PipelineError::Cancelled { .. }
        )
    }

    /// For resumable failures, the checkpoint key and the count already
    /// durably saved under it.
    pub fn resume_hint(&self) -> Option<(&str, usize)> {
        match self {
            PipelineError::Provider {
                hash, saved_count, ..
            }
            | PipelineError::Cancelled { hash, saved_count } => Some((hash, *saved_count)),
            _ => None,
        }
    }
}

/// Cooperative cancellation handle checked between chunk submissions.
///
/// Raising it mid-chunk has no effect until the in-flight chunk settles;
/// the checkpoint is always left at a completed chunk boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the run stop before the next chunk.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Summary statistics for a completed run.
#[derive(Clone, Debug)]
pub struct RunTelemetry {
    /// Provider identifier (e.g. "openai", "mock").
    pub provider: String,
    /// Embeddings restored from a prior checkpoint before this run started.
    pub resumed_from: usize,
    /// Chunks submitted to the provider by this run.
    pub chunks_submitted: usize,
    /// Token count across this run's chunks, after truncation.
    pub total_tokens: usize,
    /// Estimated provider cost in USD for this run's tokens.
    pub estimated_cost: f64,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

/// Successful pipeline result: the full ordered embeddings plus run stats.
#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    /// One embedding per input record, in input order.
    pub embeddings: Vec<EmbeddingVector>,
    pub telemetry: RunTelemetry,
}

impl PipelineOutcome {
    /// Discards telemetry and yields the ordered embeddings.
    pub fn into_embeddings(self) -> Vec<EmbeddingVector> {
        self.embeddings
    }
}

/// Orchestrates chunking, provider submission, and checkpointing.
///
/// Collaborators are injected explicitly; the pipeline holds no mutable state
/// across calls, so one instance can serve many runs (for distinct hashes —
/// see [`CheckpointStore`] for the one-run-per-hash assumption).
pub struct EmbeddingPipeline {
    chunker: Chunker,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn CheckpointStore>,
    config: EmbeddingConfig,
}

impl EmbeddingPipeline {
    /// Create a new builder for constructing an `EmbeddingPipeline`.
    pub fn builder() -> EmbeddingPipelineBuilder {
        EmbeddingPipelineBuilder::default()
    }

    /// Budgets and model this pipeline runs under.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Embeds `records` under the checkpoint key `hash`.
    ///
    /// See [`Self::run_with_cancel`]; this variant never cancels.
    pub async fn run(
        &self,
        records: &[String],
        hash: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.run_with_cancel(records, hash, &CancelSignal::new())
            .await
    }

    /// Embeds `records` under the checkpoint key `hash`, stopping cleanly at
    /// the next chunk boundary if `cancel` is raised.
    ///
    /// On success the checkpoint for `hash` is deleted and the returned
    /// embeddings are in exactly the input order. On a resumable failure the
    /// checkpoint reflects every fully completed chunk; invoke again with the
    /// identical `(records, hash)` to continue.
    #[instrument(
        skip(self, records, cancel),
        fields(provider = self.provider.name(), records = records.len())
    )]
    pub async fn run_with_cancel(
        &self,
        records: &[String],
        hash: &str,
        cancel: &CancelSignal,
    ) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();

        if !is_valid_hash_key(hash) {
            return Err(PipelineError::InvalidHash {
                hash: hash.to_string(),
            });
        }

        // RESUMING: restore any prior progress for this hash.
        let checkpoint = self.store.load(hash).await?;
        let resumed_from = checkpoint.len();
        if resumed_from > records.len() {
            return Err(PipelineError::Invariant(format!(
                "checkpoint for '{hash}' holds {resumed_from} embeddings but only {} records \
                 were supplied; the checkpoint cannot be a prefix of this input",
                records.len()
            )));
        }
        if resumed_from > 0 {
            info!(
                resumed_from,
                total = records.len(),
                "resuming from existing checkpoint"
            );
        }

        // CHUNKING: only the unprocessed remainder, keeping absolute indices
        // so validation errors point at the caller's record positions.
        let remainder: Vec<Record> = records[resumed_from..]
            .iter()
            .enumerate()
            .map(|(offset, text)| Record::new(resumed_from + offset, text.clone()))
            .collect();
        let chunking = self.chunker.split(&remainder)?;
        let estimated_cost = self.config.estimated_cost(chunking.total_tokens);
        info!(
            model = %self.config.model,
            records = remainder.len(),
            chunks = chunking.chunks.len(),
            total_tokens = chunking.total_tokens,
            estimated_cost_usd = estimated_cost,
            "chunking complete"
        );

        // SUBMITTING(i): fold chunks through the provider, checkpointing the
        // full accumulated prefix after each success.
        let mut accumulated = checkpoint.embeddings;
        let chunk_total = chunking.chunks.len();
        for (chunk_index, chunk) in chunking.chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    saved = accumulated.len(),
                    "cancellation observed, stopping at chunk boundary"
                );
                return Err(PipelineError::Cancelled {
                    hash: hash.to_string(),
                    saved_count: accumulated.len(),
                });
            }

            info!(
                chunk = chunk_index + 1,
                of = chunk_total,
                entries = chunk.len(),
                tokens = chunk.token_count(),
                saved = accumulated.len(),
                "submitting chunk"
            );

            let texts = chunk.texts();
            let vectors = match self.provider.embed_batch(&texts).await {
                Ok(vectors) if vectors.len() == texts.len() => vectors,
                Ok(vectors) => {
                    return Err(PipelineError::Provider {
                        hash: hash.to_string(),
                        chunk_index,
                        saved_count: accumulated.len(),
                        source: ProviderError::CountMismatch {
                            expected: texts.len(),
                            got: vectors.len(),
                        },
                    });
                }
                Err(source) => {
                    return Err(PipelineError::Provider {
                        hash: hash.to_string(),
                        chunk_index,
                        saved_count: accumulated.len(),
                        source,
                    });
                }
            };

            accumulated.extend(vectors);
            self.store.save(hash, &accumulated).await?;
        }

        // COMPLETE: full result validated, checkpoint retired.
        if accumulated.len() != records.len() {
            return Err(PipelineError::Invariant(format!(
                "run finished with {} embeddings for {} records",
                accumulated.len(),
                records.len()
            )));
        }
        self.store.delete(hash).await?;

        let telemetry = RunTelemetry {
            provider: self.provider.name().to_string(),
            resumed_from,
            chunks_submitted: chunk_total,
            total_tokens: chunking.total_tokens,
            estimated_cost,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            embeddings = accumulated.len(),
            chunks = telemetry.chunks_submitted,
            duration_ms = telemetry.duration_ms,
            "pipeline complete"
        );

        Ok(PipelineOutcome {
            embeddings: accumulated,
            telemetry,
        })
    }
}

/// Builder for [`EmbeddingPipeline`] instances.
#[derive(Default)]
pub struct EmbeddingPipelineBuilder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn CheckpointStore>>,
    config: Option<EmbeddingConfig>,
}

impl EmbeddingPipelineBuilder {
    /// Set the embedding provider.
    ///
    /// This is required before calling [`build()`](Self::build).
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the checkpoint store.
    ///
    /// This is required before calling [`build()`](Self::build).
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the default budgets/model.
    #[must_use]
    pub fn with_config(mut self, config: EmbeddingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline, constructing the chunker for the configured model.
    ///
    /// Fails when the model has no registered tokenizer or a chunk limit is
    /// zero.
    ///
    /// # Panics
    ///
    /// Panics if [`with_provider`](Self::with_provider) or
    /// [`with_store`](Self::with_store) was not called.
    pub fn build(self) -> Result<EmbeddingPipeline, ChunkingError> {
        let provider = self
            .provider
            .expect("EmbeddingPipelineBuilder requires a provider");
        let store = self
            .store
            .expect("EmbeddingPipelineBuilder requires a checkpoint store");
        let config = self.config.unwrap_or_default();
        let chunker = Chunker::new(&config)?;
        Ok(EmbeddingPipeline {
            chunker,
            provider,
            store,
            config,
        })
    }

    /// Build the pipeline, returning `None` if the provider or store is not
    /// set. Chunker construction errors are still surfaced in the inner
    /// `Result`.
    pub fn try_build(self) -> Option<Result<EmbeddingPipeline, ChunkingError>> {
        let provider = self.provider?;
        let store = self.store?;
        let config = self.config.unwrap_or_default();
        Some(Chunker::new(&config).map(|chunker| EmbeddingPipeline {
            chunker,
            provider,
            store,
            config,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::InMemoryCheckpointStore;
    use crate::config::DEFAULT_MODEL;
    use crate::providers::MockEmbeddingProvider;

    #[test]
    fn builder_without_collaborators_does_not_build() {
        let builder = EmbeddingPipelineBuilder::default();
        assert!(builder.try_build().is_none());

        // A provider alone is not enough either.
        let builder =
            EmbeddingPipeline::builder().with_provider(Arc::new(MockEmbeddingProvider::new()));
        assert!(builder.try_build().is_none());
    }

    #[test]
    fn builder_with_collaborators_uses_default_config() {
        let pipeline = EmbeddingPipeline::builder()
            .with_provider(Arc::new(MockEmbeddingProvider::new()))
            .with_store(Arc::new(InMemoryCheckpointStore::new()))
            .try_build()
            .expect("both collaborators are set")
            .unwrap();
        assert_eq!(pipeline.config().model, DEFAULT_MODEL);
    }
}
