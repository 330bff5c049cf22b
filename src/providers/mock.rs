//! Deterministic in-process embedding provider for tests and CI.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use super::{EmbeddingProvider, ProviderError};
use crate::types::EmbeddingVector;

/// Produces stable pseudo-embeddings derived from the input text.
///
/// The same text always maps to the same vector, distinct texts to distinct
/// vectors, with no network involved. Useful for exercising the pipeline's
/// ordering and resumption logic deterministically.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    /// Mock provider emitting vectors of the default (small) dimension.
    pub fn new() -> Self {
        Self { dimension: 8 }
    }

    /// Mock provider emitting vectors of the given dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Dimension of every vector this provider emits.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_one(&self, text: &str) -> EmbeddingVector {
        (0..self.dimension)
            .map(|component| {
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                component.hash(&mut hasher);
                let bits = hasher.finish();
                // Map the hash onto [-1.0, 1.0).
                (bits as f64 / u64::MAX as f64 * 2.0 - 1.0) as f32
            })
            .collect()
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, ProviderError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
