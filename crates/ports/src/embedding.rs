//! Embedding boundary contract.

use crate::BoxFuture;
use hybrid_rag_domain::ProviderId;
use hybrid_rag_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::sync::Arc;

/// An embedding vector payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    vector: Arc<[f32]>,
}

impl EmbeddingVector {
    /// Build an embedding vector from a shared slice.
    #[must_use]
    pub const fn new(vector: Arc<[f32]>) -> Self {
        Self { vector }
    }

    /// Build an embedding vector from an owned vector.
    #[must_use]
    pub fn from_vec(vector: Vec<f32>) -> Self {
        Self::new(Arc::from(vector))
    }

    /// Borrow the vector as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.vector
    }

    /// Return the embedding dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// Consume and return the shared vector buffer.
    #[must_use]
    pub fn into_vector(self) -> Arc<[f32]> {
        self.vector
    }

    /// Fail unless the vector has exactly `expected` components.
    pub fn ensure_dimension(&self, expected: usize) -> Result<()> {
        if self.dimension() == expected {
            return Ok(());
        }
        Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!(
                "embedding dimension mismatch (expected {expected}, got {})",
                self.dimension()
            ),
        )
        .with_metadata("expected", expected.to_string())
        .with_metadata("actual", self.dimension().to_string()))
    }
}

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingProviderInfo {
    /// Stable provider identifier.
    pub id: ProviderId,
    /// Human-readable provider name.
    pub name: Box<str>,
}

/// Owned request to embed a single text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRequest {
    /// Text to embed.
    pub text: Box<str>,
}

impl From<Box<str>> for EmbedRequest {
    fn from(text: Box<str>) -> Self {
        Self { text }
    }
}

impl From<String> for EmbedRequest {
    fn from(text: String) -> Self {
        Self {
            text: text.into_boxed_str(),
        }
    }
}

impl From<&str> for EmbedRequest {
    fn from(text: &str) -> Self {
        Self { text: text.into() }
    }
}

/// Boundary contract for embedding generation.
pub trait EmbeddingPort: Send + Sync {
    /// Provider info for this implementation.
    fn provider(&self) -> &EmbeddingProviderInfo;

    /// Embed a single text.
    fn embed(
        &self,
        ctx: &RequestContext,
        request: EmbedRequest,
    ) -> BoxFuture<'_, Result<EmbeddingVector>>;
}
