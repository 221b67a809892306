//! Embedding collaborator contract.
//!
//! The store never computes embeddings itself; it calls whatever implements
//! [`Embedder`]. Implementations must be deterministic for identical input,
//! otherwise retrieval stops being reproducible.

use async_trait::async_trait;
use thiserror::Error;

/// Errors an embedding collaborator can surface.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The embedding backend could not be reached.
    #[error("embedding backend unreachable: {0}")]
    Unavailable(String),
    /// The backend answered with something unusable.
    #[error("embedding backend returned an unusable response: {0}")]
    BadResponse(String),
    /// The backend produced a vector of the wrong dimension.
    #[error("expected a {expected}-dimensional embedding, got {actual}")]
    Dimension { expected: usize, actual: usize },
}

/// Maps text to a fixed-dimension vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text`. Must return a vector of exactly
    /// [`dimension`][Embedder::dimension] entries, and the same vector for
    /// the same input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// The fixed output dimension of this embedder.
    fn dimension(&self) -> usize;
}
