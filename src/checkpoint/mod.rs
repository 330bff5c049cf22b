//! Durable checkpoint persistence keyed by input-content hash.
//!
//! A checkpoint is always an order-preserving prefix of the eventual full
//! result: `embeddings[i]` corresponds to `records[i]` for every stored
//! vector. The pipeline rewrites the whole accumulated prefix after each
//! chunk, so a crash never leaves a torn append behind — the worst case is
//! losing the single in-flight chunk.

pub mod fs;
pub mod memory;

use async_trait::async_trait;

use crate::types::EmbeddingVector;

pub use fs::FsCheckpointStore;
pub use memory::InMemoryCheckpointStore;

/// Errors from reading or writing durable checkpoint state.
///
/// These are fatal for the current invocation: once the store misbehaves the
/// caller cannot trust any previously persisted prefix.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// The backing storage could not be read or written.
    #[error("checkpoint I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state exists but could not be decoded.
    #[error("corrupt checkpoint for '{hash}': {message}")]
    Corrupt { hash: String, message: String },
}

/// The persisted prefix of embeddings computed so far for one input hash.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Checkpoint {
    /// Ordered prefix of the eventual full result.
    pub embeddings: Vec<EmbeddingVector>,
}

impl Checkpoint {
    /// A checkpoint with no prior embeddings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of embeddings already computed and persisted.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Whether any prior progress exists.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Key-value persistence for pipeline progress.
///
/// The design assumes one active pipeline run per hash at a time; two runs
/// racing `save` under the same hash are last-writer-wins and can corrupt the
/// stored prefix. Callers own that serialization.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Loads the checkpoint for `hash`, or an empty one if none exists.
    async fn load(&self, hash: &str) -> Result<Checkpoint, CheckpointError>;

    /// Atomically replaces the persisted state for `hash` with the full
    /// accumulated prefix. Must be flushed to stable storage before
    /// returning, so the pipeline can safely move on to the next chunk.
    async fn save(&self, hash: &str, embeddings: &[EmbeddingVector])
        -> Result<(), CheckpointError>;

    /// Removes persisted state for `hash`; a no-op when absent.
    async fn delete(&self, hash: &str) -> Result<(), CheckpointError>;
}
