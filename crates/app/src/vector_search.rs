//! Dense retrieval channel over a [`VectorStorePort`].

use hybrid_rag_domain::{ChannelHit, CollectionName, SourceTypeFilter};
use hybrid_rag_ports::{
    CollectionSpec, DistanceMetric, LogFields, LoggerPort, VectorQuery, VectorStorePort,
};
use hybrid_rag_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::sync::Arc;

/// Default dimension when creating a missing collection.
pub const DEFAULT_VECTOR_DIMENSION: u32 = 1536;

/// Outcome of [`VectorSearchAdapter::ensure_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureCollectionOutcome {
    /// The collection was already present.
    Existing,
    /// The collection was created.
    Created,
}

/// Dense retrieval channel bound to one collection.
#[derive(Clone)]
pub struct VectorSearchAdapter {
    store: Arc<dyn VectorStorePort>,
    collection: CollectionName,
}

impl VectorSearchAdapter {
    /// Bind the adapter to a store and collection.
    #[must_use]
    pub fn new(store: Arc<dyn VectorStorePort>, collection: CollectionName) -> Self {
        Self { store, collection }
    }

    /// Target collection.
    #[must_use]
    pub const fn collection(&self) -> &CollectionName {
        &self.collection
    }

    /// Create the collection when it does not exist.
    pub async fn ensure_collection(
        &self,
        ctx: &RequestContext,
        dimension: u32,
        distance: DistanceMetric,
        logger: Option<&dyn LoggerPort>,
    ) -> Result<EnsureCollectionOutcome> {
        let exists = self
            .store
            .collection_exists(ctx, self.collection.clone())
            .await
            .map_err(|error| self.unavailable("collection_exists", error))?;
        if exists {
            return Ok(EnsureCollectionOutcome::Existing);
        }

        self.store
            .create_collection(
                ctx,
                CollectionSpec {
                    name: self.collection.clone(),
                    dimension,
                    distance,
                },
            )
            .await
            .map_err(|error| self.unavailable("create_collection", error))?;

        if let Some(logger) = logger {
            let mut fields = LogFields::new();
            fields.insert(
                "collectionName".into(),
                Value::String(self.collection.as_str().to_owned()),
            );
            fields.insert("dimension".into(), Value::from(dimension));
            fields.insert("distance".into(), Value::String(distance.to_string()));
            logger.info(
                "engine.collection_created",
                "Vector collection created",
                Some(fields),
            );
        }
        Ok(EnsureCollectionOutcome::Created)
    }

    /// Nearest-neighbour search, sorted by score descending (stable).
    pub async fn search(
        &self,
        ctx: &RequestContext,
        vector: Arc<[f32]>,
        limit: u32,
        score_threshold: Option<f32>,
        filter: Option<SourceTypeFilter>,
    ) -> Result<Vec<ChannelHit>> {
        ctx.ensure_not_cancelled("vector_search.search")?;

        let mut hits = self
            .store
            .search(
                ctx,
                VectorQuery {
                    collection: self.collection.clone(),
                    vector,
                    limit,
                    score_threshold,
                    filter,
                },
            )
            .await
            .map_err(|error| self.unavailable("search", error))?;

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }

    fn unavailable(&self, operation: &'static str, error: ErrorEnvelope) -> ErrorEnvelope {
        as_provider_unavailable(self.store.provider().id.as_str(), operation, error)
    }
}

/// Re-tag a backend failure as `provider_unavailable`, keeping cancellation,
/// timeouts, and errors that are already tagged.
pub(crate) fn as_provider_unavailable(
    provider: &str,
    operation: &'static str,
    error: ErrorEnvelope,
) -> ErrorEnvelope {
    let passthrough = error.is_cancelled()
        || error.code == ErrorCode::provider_unavailable()
        || error.code == ErrorCode::timeout();
    if passthrough {
        return error;
    }

    let mut mapped = ErrorEnvelope::provider_unavailable(
        provider,
        operation,
        format!("{provider} {operation} failed: {}", error.message),
        error.class,
    )
    .with_metadata("cause", error.code.to_string());
    for (key, value) in error.metadata {
        mapped.metadata.entry(key).or_insert(value);
    }
    mapped
}
