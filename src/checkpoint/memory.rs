//! In-memory checkpoint store for tests and single-process runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Checkpoint, CheckpointError, CheckpointStore};
use crate::types::EmbeddingVector;

/// Keeps checkpoints in a shared map; clones see the same state.
///
/// Offers no durability across process restarts — it exists so pipeline
/// logic can be exercised without touching the filesystem.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCheckpointStore {
    state: Arc<RwLock<HashMap<String, Vec<EmbeddingVector>>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any state is held for `hash`.
    pub fn contains(&self, hash: &str) -> bool {
        self.state.read().contains_key(hash)
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, hash: &str) -> Result<Checkpoint, CheckpointError> {
        let embeddings = self.state.read().get(hash).cloned().unwrap_or_default();
        Ok(Checkpoint { embeddings })
    }

    async fn save(
        &self,
        hash: &str,
        embeddings: &[EmbeddingVector],
    ) -> Result<(), CheckpointError> {
        self.state
            .write()
            .insert(hash.to_string(), embeddings.to_vec());
        Ok(())
    }

    async fn delete(&self, hash: &str) -> Result<(), CheckpointError> {
        self.state.write().remove(hash);
        Ok(())
    }
}
