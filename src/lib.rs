//! Resumable chunked embedding pipeline.
//!
//! Turns a large ordered collection of text records into embedding vectors by
//! calling a rate- and size-limited provider, persisting progress after every
//! batch so a failed run resumes exactly where it stopped instead of paying
//! for completed work again.
//!
//! ```text
//! records ──► pipeline::EmbeddingPipeline::run(records, hash)
//!                 │
//!                 ├─► checkpoint::CheckpointStore::load(hash)   (prior prefix)
//!                 ├─► chunking::Chunker::split(remainder)       (token budgets)
//!                 │
//!                 └─► loop per chunk:
//!                         providers::EmbeddingProvider::embed_batch
//!                         CheckpointStore::save(hash, accumulated)
//!                 │
//!                 └─► CheckpointStore::delete(hash) on full success
//!
//! embeddings ──► projection::EmbeddingProjector (external collaborator)
//! ```
//!
//! Collaborators are injected as `Arc<dyn …>` trait objects; there is no
//! process-wide state. See [`pipeline::PipelineError`] for how resumable
//! failures are distinguished from fatal ones.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use embedsmith::checkpoint::FsCheckpointStore;
//! use embedsmith::config::{EmbeddingConfig, OpenAiConfig};
//! use embedsmith::pipeline::EmbeddingPipeline;
//! use embedsmith::providers::OpenAiEmbeddingProvider;
//! use embedsmith::types::content_hash;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EmbeddingConfig::default();
//! let provider = OpenAiEmbeddingProvider::new(OpenAiConfig::from_env()?, &config.model)?;
//!
//! let pipeline = EmbeddingPipeline::builder()
//!     .with_provider(Arc::new(provider))
//!     .with_store(Arc::new(FsCheckpointStore::new(".embedsmith")))
//!     .with_config(config)
//!     .build()?;
//!
//! let records: Vec<String> = vec!["first text".into(), "second text".into()];
//! let hash = content_hash(&records);
//! let outcome = pipeline.run(&records, &hash).await?;
//! println!("embedded {} records", outcome.embeddings.len());
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod chunking;
pub mod config;
pub mod pipeline;
pub mod projection;
pub mod providers;
pub mod tokenizer;
pub mod types;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use chunking::{Chunk, Chunker, ChunkingError, ChunkingOutcome};
pub use config::{EmbeddingConfig, OpenAiConfig};
pub use pipeline::{
    CancelSignal, EmbeddingPipeline, PipelineError, PipelineOutcome, RunTelemetry,
};
pub use providers::{EmbeddingProvider, ProviderError};
pub use types::{content_hash, EmbeddingVector, Record};
