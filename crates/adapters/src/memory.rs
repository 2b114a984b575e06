//! In-process corpus serving both retrieval channels.
//!
//! Seed files use the Qdrant point shape (`id`, optional `vector`, `payload`),
//! so a collection exported from Qdrant can be replayed locally. Points
//! without a vector are embedded at load time when an embedder is supplied;
//! otherwise they are only visible to the lexical channel.

use crate::point::{candidate_payload, point_id};
use hybrid_rag_ports::{
    BoxFuture, CandidatePayload, ChannelHit, CollectionName, CollectionSpec, DistanceMetric,
    DocumentId, LexicalDocument, LexicalScanRequest, LexicalSourcePort, ProviderId,
    SourceTypeFilter, VectorQuery, VectorStorePort, VectorStoreProviderInfo,
};
use hybrid_rag_domain::passes_filter;
use hybrid_rag_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

const PROVIDER: &str = "memory";

/// One stored point.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPoint {
    /// Point identity.
    pub id: Option<DocumentId>,
    /// Dense vector, when one was stored.
    pub vector: Option<Arc<[f32]>>,
    /// Stored payload.
    pub payload: CandidatePayload,
}

#[derive(Debug, Clone, Default)]
struct MemoryCollection {
    dimension: Option<u32>,
    distance: DistanceMetric,
    points: Vec<MemoryPoint>,
}

/// Vector store and lexical source over points held in memory.
#[derive(Debug)]
pub struct InMemoryCorpus {
    provider: VectorStoreProviderInfo,
    collections: RwLock<BTreeMap<CollectionName, MemoryCollection>>,
}

#[derive(Debug, Deserialize)]
struct SeedPoint {
    id: Option<Value>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

impl InMemoryCorpus {
    /// Create an empty corpus with no collections.
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: VectorStoreProviderInfo {
                id: ProviderId::parse(PROVIDER).map_err(ErrorEnvelope::from)?,
                name: "In-memory corpus".into(),
            },
            collections: RwLock::new(BTreeMap::new()),
        })
    }

    /// Append points to `collection`, creating it when missing.
    pub fn insert(&self, collection: &CollectionName, points: Vec<MemoryPoint>) -> Result<()> {
        let mut collections = self.write("insert")?;
        collections
            .entry(collection.clone())
            .or_default()
            .points
            .extend(points);
        Ok(())
    }

    /// Parse a JSON array of seed points.
    ///
    /// Points without a UUID or integer id get a fresh v4 UUID.
    pub fn parse_seed(
        input: &str,
        embed: Option<&dyn Fn(&str) -> Vec<f32>>,
    ) -> Result<Vec<MemoryPoint>> {
        let seeds: Vec<SeedPoint> = serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("memory", "invalid_seed"),
                format!("invalid seed JSON: {error}"),
            )
        })?;

        Ok(seeds
            .into_iter()
            .map(|seed| {
                let payload = candidate_payload(seed.payload.as_ref());
                let vector = match (seed.vector, embed) {
                    (Some(vector), _) => Some(Arc::from(vector)),
                    (None, Some(embed)) => payload
                        .text
                        .as_deref()
                        .map(|text| Arc::from(embed(text))),
                    (None, None) => None,
                };
                let id = point_id(seed.id.as_ref()).or_else(|| {
                    DocumentId::parse(uuid::Uuid::new_v4().hyphenated().to_string()).ok()
                });
                MemoryPoint {
                    id,
                    vector,
                    payload,
                }
            })
            .collect())
    }

    /// Load a seed file into `collection`.
    pub fn load_seed_file(
        &self,
        path: &Path,
        collection: &CollectionName,
        embed: Option<&dyn Fn(&str) -> Vec<f32>>,
    ) -> Result<usize> {
        let input = std::fs::read_to_string(path).map_err(|error| {
            ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
        })?;
        let points = Self::parse_seed(&input, embed)
            .map_err(|error| error.with_metadata("path", path.display().to_string()))?;
        let count = points.len();
        self.insert(collection, points)?;
        tracing::debug!(path = %path.display(), count, "memory corpus seeded");
        Ok(count)
    }

    fn read(
        &self,
        operation: &'static str,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<CollectionName, MemoryCollection>>> {
        self.collections
            .read()
            .map_err(|_| lock_poisoned(operation))
    }

    fn write(
        &self,
        operation: &'static str,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<CollectionName, MemoryCollection>>> {
        self.collections
            .write()
            .map_err(|_| lock_poisoned(operation))
    }

    fn search_sync(&self, query: &VectorQuery) -> Result<Vec<ChannelHit>> {
        let collections = self.read("search")?;
        let collection = collections
            .get(&query.collection)
            .ok_or_else(|| missing_collection("search", &query.collection))?;
        if let Some(dimension) = collection.dimension {
            if query.vector.len() != dimension as usize {
                return Err(ErrorEnvelope::provider_unavailable(
                    PROVIDER,
                    "search",
                    format!(
                        "query vector has {} components, collection expects {dimension}",
                        query.vector.len()
                    ),
                    ErrorClass::NonRetriable,
                )
                .with_metadata("cause", "dimension_mismatch"));
            }
        }

        let mut hits: Vec<ChannelHit> = collection
            .points
            .iter()
            .filter(|point| passes(query.filter.as_ref(), &point.payload))
            .filter_map(|point| {
                let vector = point.vector.as_deref()?;
                let score = similarity(collection.distance, &query.vector, vector)?;
                Some(ChannelHit {
                    id: point.id.clone(),
                    score,
                    payload: point.payload.clone(),
                })
            })
            .filter(|hit| query.score_threshold.is_none_or(|threshold| hit.score >= threshold))
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.limit as usize);
        Ok(hits)
    }

    fn scan_sync(&self, request: &LexicalScanRequest) -> Result<Vec<LexicalDocument>> {
        let collections = self.read("scan")?;
        let collection = collections
            .get(&request.collection)
            .ok_or_else(|| missing_collection("scan", &request.collection))?;

        Ok(collection
            .points
            .iter()
            .filter(|point| passes(request.filter.as_ref(), &point.payload))
            .take(request.limit as usize)
            .map(|point| LexicalDocument {
                id: point.id.clone(),
                payload: point.payload.clone(),
            })
            .collect())
    }
}

fn passes(filter: Option<&SourceTypeFilter>, payload: &CandidatePayload) -> bool {
    passes_filter(filter, payload.resolved_source_type())
}

/// Higher is better for every metric; euclidean distance maps to `1 / (1 + d)`.
fn similarity(metric: DistanceMetric, query: &[f32], stored: &[f32]) -> Option<f32> {
    if query.len() != stored.len() || query.is_empty() {
        return None;
    }
    let dot: f32 = query.iter().zip(stored).map(|(a, b)| a * b).sum();
    let score = match metric {
        DistanceMetric::Dot => dot,
        DistanceMetric::Cosine => {
            let norms = norm(query) * norm(stored);
            if norms == 0.0 {
                return Some(0.0);
            }
            dot / norms
        },
        DistanceMetric::Euclid => {
            let distance = query
                .iter()
                .zip(stored)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f32>()
                .sqrt();
            1.0 / (1.0 + distance)
        },
    };
    score.is_finite().then_some(score)
}

fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|value| value * value).sum::<f32>().sqrt()
}

fn lock_poisoned(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::invariant(ErrorCode::internal(), "memory corpus lock poisoned")
        .with_metadata("operation", operation)
}

fn missing_collection(operation: &'static str, collection: &CollectionName) -> ErrorEnvelope {
    ErrorEnvelope::provider_unavailable(
        PROVIDER,
        operation,
        format!("collection not found: {}", collection.as_str()),
        ErrorClass::NonRetriable,
    )
    .with_metadata("cause", "not_found")
    .with_metadata("collection", collection.as_str())
}

impl VectorStorePort for InMemoryCorpus {
    fn provider(&self) -> &VectorStoreProviderInfo {
        &self.provider
    }

    fn collection_exists(
        &self,
        ctx: &RequestContext,
        collection: CollectionName,
    ) -> BoxFuture<'_, Result<bool>> {
        let result = ctx
            .ensure_not_cancelled("memory.collection_exists")
            .and_then(|()| Ok(self.read("collection_exists")?.contains_key(&collection)));
        Box::pin(async move { result })
    }

    fn create_collection(
        &self,
        ctx: &RequestContext,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<()>> {
        let result = ctx
            .ensure_not_cancelled("memory.create_collection")
            .and_then(|()| {
                let mut collections = self.write("create_collection")?;
                let collection = collections.entry(spec.name).or_default();
                collection.dimension = Some(spec.dimension);
                collection.distance = spec.distance;
                Ok(())
            });
        Box::pin(async move { result })
    }

    fn search(
        &self,
        ctx: &RequestContext,
        query: VectorQuery,
    ) -> BoxFuture<'_, Result<Vec<ChannelHit>>> {
        let result = ctx
            .ensure_not_cancelled("memory.search")
            .and_then(|()| self.search_sync(&query));
        Box::pin(async move { result })
    }
}

impl LexicalSourcePort for InMemoryCorpus {
    fn scan(
        &self,
        ctx: &RequestContext,
        request: LexicalScanRequest,
    ) -> BoxFuture<'_, Result<Vec<LexicalDocument>>> {
        let result = ctx
            .ensure_not_cancelled("memory.scan")
            .and_then(|()| self.scan_sync(&request));
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_ports::SourceType;

    fn collection() -> Result<CollectionName> {
        CollectionName::parse("docs").map_err(ErrorEnvelope::from)
    }

    fn point(id: u64, vector: &[f32], source: SourceType, text: &str) -> MemoryPoint {
        MemoryPoint {
            id: Some(DocumentId::from_u64(id)),
            vector: Some(Arc::from(vector)),
            payload: CandidatePayload {
                text: Some(text.into()),
                source_type: Some(source),
                ..CandidatePayload::default()
            },
        }
    }

    fn corpus() -> Result<InMemoryCorpus> {
        let corpus = InMemoryCorpus::new()?;
        corpus.insert(
            &collection()?,
            vec![
                point(1, &[1.0, 0.0], SourceType::Git, "alpha"),
                point(2, &[0.6, 0.8], SourceType::Jira, "beta"),
                point(3, &[0.0, 1.0], SourceType::Git, "gamma"),
            ],
        )?;
        Ok(corpus)
    }

    fn query(filter: Option<SourceTypeFilter>, threshold: Option<f32>) -> Result<VectorQuery> {
        Ok(VectorQuery {
            collection: collection()?,
            vector: Arc::from([1.0_f32, 0.0].as_slice()),
            limit: 10,
            score_threshold: threshold,
            filter,
        })
    }

    #[tokio::test]
    async fn search_orders_by_cosine_and_applies_threshold() -> Result<()> {
        let corpus = corpus()?;
        let ctx = RequestContext::new_request();
        let hits = corpus.search(&ctx, query(None, Some(0.5))?).await?;

        let ids: Vec<_> = hits
            .iter()
            .filter_map(|hit| hit.id.as_ref().map(DocumentId::as_str))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!((hits.first().map_or(0.0, |hit| hit.score) - 1.0).abs() < 1e-6);
        Ok(())
    }

    #[tokio::test]
    async fn filters_apply_to_both_channels() -> Result<()> {
        let corpus = corpus()?;
        let ctx = RequestContext::new_request();
        let filter = SourceTypeFilter::from_types([SourceType::Jira]);

        let hits = corpus.search(&ctx, query(filter.clone(), None)?).await?;
        assert_eq!(hits.len(), 1);

        let documents = corpus
            .scan(
                &ctx,
                LexicalScanRequest {
                    collection: collection()?,
                    filter,
                    limit: 10,
                },
            )
            .await?;
        assert_eq!(documents.len(), 1);
        assert_eq!(
            documents.first().and_then(|d| d.payload.text.as_deref()),
            Some("beta")
        );
        Ok(())
    }

    #[tokio::test]
    async fn scan_respects_limit_and_insertion_order() -> Result<()> {
        let corpus = corpus()?;
        let ctx = RequestContext::new_request();
        let documents = corpus
            .scan(
                &ctx,
                LexicalScanRequest {
                    collection: collection()?,
                    filter: None,
                    limit: 2,
                },
            )
            .await?;
        let texts: Vec<_> = documents
            .iter()
            .filter_map(|d| d.payload.text.as_deref())
            .collect();
        assert_eq!(texts, vec!["alpha", "beta"]);
        Ok(())
    }

    #[tokio::test]
    async fn collections_are_created_on_demand() -> Result<()> {
        let corpus = InMemoryCorpus::new()?;
        let ctx = RequestContext::new_request();
        assert!(!corpus.collection_exists(&ctx, collection()?).await?);

        corpus
            .create_collection(
                &ctx,
                CollectionSpec {
                    name: collection()?,
                    dimension: 2,
                    distance: DistanceMetric::Cosine,
                },
            )
            .await?;
        assert!(corpus.collection_exists(&ctx, collection()?).await?);
        assert!(corpus.search(&ctx, query(None, None)?).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_collection_is_a_provider_failure() -> Result<()> {
        let corpus = InMemoryCorpus::new()?;
        let ctx = RequestContext::new_request();
        let error = corpus.search(&ctx, query(None, None)?).await.err();
        assert!(matches!(error, Some(ref e) if e.code == ErrorCode::provider_unavailable()));
        Ok(())
    }

    #[test]
    fn seed_points_are_embedded_and_identified() -> Result<()> {
        let seed = r#"[
            {"id": 7, "vector": [0.1, 0.2], "payload": {"content": "stored vector"}},
            {"payload": {"content": "needs embedding", "source_type": "git"}}
        ]"#;
        let embed = |text: &str| vec![text.len() as f32, 0.0];
        let points = InMemoryCorpus::parse_seed(seed, Some(&embed))?;

        assert_eq!(points.len(), 2);
        assert_eq!(
            points.first().and_then(|p| p.id.as_ref()).map(DocumentId::as_str),
            Some("7")
        );
        let second = points.get(1).ok_or_else(|| ErrorEnvelope::invalid_input("missing"))?;
        assert!(second.id.is_some());
        assert_eq!(second.vector.as_deref(), Some([15.0_f32, 0.0].as_slice()));
        Ok(())
    }

    #[test]
    fn euclid_similarity_is_bounded() {
        assert_eq!(similarity(DistanceMetric::Euclid, &[1.0], &[1.0]), Some(1.0));
        assert_eq!(similarity(DistanceMetric::Dot, &[1.0], &[1.0, 2.0]), None);
    }
}
