//! Vector store boundary contract.

use crate::BoxFuture;
use hybrid_rag_domain::{ChannelHit, CollectionName, ProviderId, SourceTypeFilter};
use hybrid_rag_shared::{RequestContext, Result};
use std::fmt;
use std::sync::Arc;

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorStoreProviderInfo {
    /// Stable provider identifier.
    pub id: ProviderId,
    /// Human-readable provider name.
    pub name: Box<str>,
}

/// Distance metric of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// Cosine similarity.
    #[default]
    Cosine,
    /// Dot product.
    Dot,
    /// Euclidean distance.
    Euclid,
}

impl DistanceMetric {
    /// Wire name used by Qdrant.
    #[must_use]
    pub const fn as_qdrant_str(self) -> &'static str {
        match self {
            Self::Cosine => "Cosine",
            Self::Dot => "Dot",
            Self::Euclid => "Euclid",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Cosine => "cosine",
            Self::Dot => "dot",
            Self::Euclid => "euclid",
        })
    }
}

/// Collection shape used when creating a missing collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    /// Collection name.
    pub name: CollectionName,
    /// Vector dimension.
    pub dimension: u32,
    /// Distance metric.
    pub distance: DistanceMetric,
}

/// Owned request for dense vector search.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    /// Target collection.
    pub collection: CollectionName,
    /// Dense query vector.
    pub vector: Arc<[f32]>,
    /// Maximum number of hits to return.
    pub limit: u32,
    /// Minimum similarity for a hit to count.
    pub score_threshold: Option<f32>,
    /// Source-type restriction pushed down to the backend.
    pub filter: Option<SourceTypeFilter>,
}

/// Boundary contract for vector retrieval.
pub trait VectorStorePort: Send + Sync {
    /// Provider info for this implementation.
    fn provider(&self) -> &VectorStoreProviderInfo;

    /// Return true when the collection exists.
    fn collection_exists(
        &self,
        ctx: &RequestContext,
        collection: CollectionName,
    ) -> BoxFuture<'_, Result<bool>>;

    /// Create a collection.
    fn create_collection(
        &self,
        ctx: &RequestContext,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<()>>;

    /// Nearest-neighbour search. Hits are returned in backend order.
    fn search(
        &self,
        ctx: &RequestContext,
        query: VectorQuery,
    ) -> BoxFuture<'_, Result<Vec<ChannelHit>>>;
}
