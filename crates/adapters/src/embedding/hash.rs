//! Deterministic offline embedding.
//!
//! Each lowercase alphanumeric token is hashed with SHA-256 into one signed
//! bucket; the bucket counts are L2-normalized. Texts sharing words land close
//! under cosine similarity, which is enough for local runs and tests without
//! network access.

use hybrid_rag_ports::{
    BoxFuture, EmbedRequest, EmbeddingPort, EmbeddingProviderInfo, EmbeddingVector, ProviderId,
};
use hybrid_rag_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use sha2::{Digest, Sha256};

/// Hash-bucket embedding with a fixed dimension.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    provider: EmbeddingProviderInfo,
    dimension: usize,
}

impl HashEmbedding {
    /// Build an embedder producing `dimension`-component vectors.
    pub fn new(dimension: u32) -> Result<Self> {
        if dimension == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "embedding dimension must be positive",
            ));
        }
        Ok(Self {
            provider: EmbeddingProviderInfo {
                id: ProviderId::parse("test").map_err(ErrorEnvelope::from)?,
                name: "Hash embedding".into(),
            },
            dimension: dimension as usize,
        })
    }

    /// Embed synchronously; used by the in-memory corpus when seeding.
    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for token in text
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let bucket_bytes = digest.first_chunk::<8>().copied().unwrap_or_default();
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest.get(8).copied().unwrap_or_default() & 1 == 0 {
                1.0
            } else {
                -1.0
            };
            if let Some(slot) = vector.get_mut(bucket) {
                *slot += sign;
            }
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl EmbeddingPort for HashEmbedding {
    fn provider(&self) -> &EmbeddingProviderInfo {
        &self.provider
    }

    fn embed(
        &self,
        ctx: &RequestContext,
        request: EmbedRequest,
    ) -> BoxFuture<'_, Result<EmbeddingVector>> {
        let result = ctx
            .ensure_not_cancelled("hash_embedding.embed")
            .map(|()| EmbeddingVector::from_vec(self.vector_for(&request.text)));
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn embeddings_are_deterministic_and_normalized() -> Result<()> {
        let embedder = HashEmbedding::new(32)?;
        let ctx = RequestContext::new_request();
        let a = embedder.embed(&ctx, "Rotate the API token".into()).await?;
        let b = embedder.embed(&ctx, "rotate the api TOKEN".into()).await?;

        assert_eq!(a, b);
        assert_eq!(a.dimension(), 32);
        let norm = cosine(a.as_slice(), a.as_slice());
        assert!((norm - 1.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn shared_words_score_higher_than_disjoint_text() -> Result<()> {
        let embedder = HashEmbedding::new(256)?;
        let query = embedder.vector_for("kubernetes deployment rollback");
        let related = embedder.vector_for("how to rollback a kubernetes deployment");
        let unrelated = embedder.vector_for("quarterly marketing budget");

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
        Ok(())
    }

    #[test]
    fn empty_text_is_the_zero_vector() -> Result<()> {
        let embedder = HashEmbedding::new(4)?;
        assert_eq!(embedder.vector_for("  ... "), vec![0.0; 4]);
        assert!(HashEmbedding::new(0).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() -> Result<()> {
        let embedder = HashEmbedding::new(4)?;
        let ctx = RequestContext::new_request();
        ctx.cancel();
        let result = embedder.embed(&ctx, "anything".into()).await;
        assert!(matches!(result, Err(ref e) if e.is_cancelled()));
        Ok(())
    }
}
