//! Downstream projection/clustering collaborator boundary.
//!
//! Dimensionality reduction and clustering are applied to a finished
//! embedding set by an external collaborator; this module only pins down its
//! contract. Implementations live outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::EmbeddingVector;

/// Errors from a projection backend.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// Projection needs at least two samples to be meaningful.
    #[error("projection requires at least 2 embeddings, got {0}")]
    TooFewSamples(usize),

    /// The backend failed for its own reasons.
    #[error("projection backend failure: {0}")]
    Backend(String),
}

/// A 2-D projection of one embedding vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f32,
    pub y: f32,
}

/// Projection result: one point and one cluster label per input vector,
/// both in input order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectionOutcome {
    pub points: Vec<ProjectedPoint>,
    pub clusters: Vec<i32>,
}

/// Validates that an embedding set is large enough to project.
pub fn ensure_projectable(embeddings: &[EmbeddingVector]) -> Result<(), ProjectionError> {
    if embeddings.len() < 2 {
        return Err(ProjectionError::TooFewSamples(embeddings.len()));
    }
    Ok(())
}

/// Contract for the dimensionality-reduction/clustering step.
#[async_trait]
pub trait EmbeddingProjector: Send + Sync {
    /// Projects a full ordered embedding set (`n >= 2`) into 2-D points with
    /// integer cluster labels, one of each per input vector, in input order.
    async fn project(
        &self,
        embeddings: &[EmbeddingVector],
    ) -> Result<ProjectionOutcome, ProjectionError>;
}
