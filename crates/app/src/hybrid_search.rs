//! Hybrid search use-case: expand, fan out to both channels, fuse, filter.
//!
//! Intent classification runs alongside the two retrieval branches; its
//! result only feeds the `search.completed` event.

use crate::fusion::{FusionOutcome, fuse};
use crate::lexical_search::LexicalSearchAdapter;
use crate::query_expander::{ExpandedQuery, QueryExpander};
use crate::vector_search::{
    DEFAULT_VECTOR_DIMENSION, EnsureCollectionOutcome, VectorSearchAdapter,
    as_provider_unavailable,
};
use hybrid_rag_domain::{FusionWeights, SearchResult, SourceTypeFilter, passes_filter};
use hybrid_rag_ports::{DistanceMetric, EmbeddingPort, LogFields, LogLevel, LoggerPort};
use hybrid_rag_shared::{
    ErrorCode, ErrorEnvelope, RequestContext, Result, timeout_with_context,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Tunables for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Limit used when the caller gives none.
    pub default_limit: u32,
    /// Largest accepted limit.
    pub max_limit: u32,
    /// Channel weights for the combined score.
    pub weights: FusionWeights,
    /// Minimum vector similarity.
    pub score_threshold: Option<f32>,
    /// Candidates fetched per channel, as a multiple of the limit.
    pub candidate_pool_factor: u32,
    /// Deadline for one whole search call.
    pub timeout: Duration,
    /// Create the collection on `initialize` when missing.
    pub ensure_collection: bool,
    /// Dimension for a created collection.
    pub vector_dimension: u32,
    /// Distance metric for a created collection.
    pub distance: DistanceMetric,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            weights: FusionWeights::default(),
            score_threshold: Some(0.3),
            candidate_pool_factor: 2,
            timeout: Duration::from_secs(30),
            ensure_collection: true,
            vector_dimension: DEFAULT_VECTOR_DIMENSION,
            distance: DistanceMetric::Cosine,
        }
    }
}

/// Long-lived adapters the engine searches through.
#[derive(Clone)]
pub struct SearchBackends {
    /// Query expander (with optional classifier).
    pub expander: QueryExpander,
    /// Embedding adapter.
    pub embedding: Arc<dyn EmbeddingPort>,
    /// Dense channel.
    pub vector: VectorSearchAdapter,
    /// Lexical channel.
    pub lexical: LexicalSearchAdapter,
}

/// One search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Raw query text.
    pub query: Box<str>,
    /// Optional source-type restriction.
    pub source_types: Option<SourceTypeFilter>,
    /// Optional result cap (defaults to `SearchSettings::default_limit`).
    pub limit: Option<u32>,
}

impl SearchRequest {
    /// Query with default limit and no filter.
    #[must_use]
    pub fn new(query: impl Into<Box<str>>) -> Self {
        Self {
            query: query.into(),
            source_types: None,
            limit: None,
        }
    }

    /// Restrict results to the given source types.
    #[must_use]
    pub fn with_source_types(mut self, filter: Option<SourceTypeFilter>) -> Self {
        self.source_types = filter;
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Hybrid dense + lexical search engine.
///
/// Holds no per-query state. Backends are swapped in by [`initialize`] and
/// removed by [`shutdown`]; searches take an `Arc` snapshot so the lock is
/// never held across backend calls.
///
/// [`initialize`]: HybridSearchEngine::initialize
/// [`shutdown`]: HybridSearchEngine::shutdown
pub struct HybridSearchEngine {
    backends: RwLock<Option<Arc<SearchBackends>>>,
    settings: SearchSettings,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl HybridSearchEngine {
    /// Create an engine with no backends wired.
    #[must_use]
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            backends: RwLock::new(None),
            settings,
            logger: None,
        }
    }

    /// Attach a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Engine settings.
    #[must_use]
    pub const fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Wire backends, creating the collection first when configured.
    pub async fn initialize(&self, ctx: &RequestContext, backends: SearchBackends) -> Result<()> {
        let mut created = false;
        if self.settings.ensure_collection {
            let outcome = backends
                .vector
                .ensure_collection(
                    ctx,
                    self.settings.vector_dimension,
                    self.settings.distance,
                    self.logger.as_deref(),
                )
                .await?;
            created = outcome == EnsureCollectionOutcome::Created;
        }

        let collection = backends.vector.collection().as_str().to_owned();
        let embedding_provider = backends.embedding.provider().id.as_str().to_owned();
        *self.backends.write().await = Some(Arc::new(backends));

        if let Some(logger) = self.logger.as_ref() {
            let mut fields = LogFields::new();
            fields.insert("collectionName".into(), Value::String(collection));
            fields.insert("embeddingProvider".into(), Value::String(embedding_provider));
            fields.insert("collectionCreated".into(), Value::Bool(created));
            logger.info("engine.initialized", "Search engine initialized", Some(fields));
        }
        Ok(())
    }

    /// Drop the backends. Later searches fail with `not_initialized`.
    pub async fn shutdown(&self) {
        let previous = self.backends.write().await.take();
        if previous.is_some() {
            if let Some(logger) = self.logger.as_ref() {
                logger.info("engine.shutdown", "Search engine shut down", None);
            }
        }
    }

    /// Returns true while backends are wired.
    pub async fn is_initialized(&self) -> bool {
        self.backends.read().await.is_some()
    }

    /// Run one hybrid search.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        request: SearchRequest,
    ) -> Result<Vec<SearchResult>> {
        let limit = self.validate(&request)?;
        let backends = self
            .backends
            .read()
            .await
            .clone()
            .ok_or_else(|| ErrorEnvelope::not_initialized("search engine"))?;

        let logger = self.request_logger(ctx);
        let started_at = Instant::now();
        if let Some(logger) = logger.as_deref() {
            logger.info(
                "search.start",
                "Hybrid search started",
                Some(log_fields_start(&request, limit)),
            );
        }

        let outcome = timeout_with_context(
            ctx,
            self.settings.timeout,
            "hybrid_search.search",
            self.run(ctx, &backends, &request, limit, logger.as_deref()),
        )
        .await;

        match outcome {
            Ok(completed) => {
                if let Some(logger) = logger.as_deref() {
                    logger.info(
                        "search.completed",
                        "Hybrid search completed",
                        Some(log_fields_completed(&completed, started_at)),
                    );
                }
                Ok(completed.results)
            },
            Err(error) => {
                if let Some(logger) = logger.as_deref() {
                    let mut fields = LogFields::new();
                    fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
                    if error.is_cancelled() {
                        logger.info("search.aborted", "Hybrid search aborted", Some(fields));
                    } else {
                        logger.log_error(
                            LogLevel::Error,
                            "search.failed",
                            "Hybrid search failed",
                            Some(fields),
                            &error,
                        );
                    }
                }
                Err(error)
            },
        }
    }

    fn validate(&self, request: &SearchRequest) -> Result<u32> {
        if request.query.trim().is_empty() {
            return Err(ErrorEnvelope::invalid_input("query must be a non-empty string")
                .with_metadata("field", "query"));
        }

        let limit = request.limit.unwrap_or(self.settings.default_limit);
        if limit == 0 || limit > self.settings.max_limit {
            return Err(ErrorEnvelope::invalid_input(format!(
                "limit must be between 1 and {}",
                self.settings.max_limit
            ))
            .with_metadata("field", "limit")
            .with_metadata("limit", limit.to_string()));
        }
        Ok(limit)
    }

    fn request_logger(&self, ctx: &RequestContext) -> Option<Box<dyn LoggerPort>> {
        self.logger.as_ref().map(|logger| {
            let mut base = LogFields::new();
            base.insert(
                "correlationId".into(),
                Value::String(ctx.correlation_id().as_str().to_owned()),
            );
            logger.child(base)
        })
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        backends: &SearchBackends,
        request: &SearchRequest,
        limit: u32,
        logger: Option<&dyn LoggerPort>,
    ) -> Result<CompletedSearch> {
        let prepared = backends.expander.prepare(&request.query);
        let pool = limit.saturating_mul(self.settings.candidate_pool_factor.max(1));
        let pool_len = usize::try_from(pool).unwrap_or(usize::MAX);

        let vector_branch = async {
            let embedding = backends
                .embedding
                .embed(ctx, prepared.expanded.clone().into())
                .await
                .map_err(|error| {
                    as_provider_unavailable(
                        backends.embedding.provider().id.as_str(),
                        "embed",
                        error,
                    )
                })?;
            backends
                .vector
                .search(
                    ctx,
                    embedding.into_vector(),
                    pool,
                    self.settings.score_threshold,
                    request.source_types.clone(),
                )
                .await
        };
        let lexical_branch = async {
            let mut hits = backends
                .lexical
                .search(ctx, &prepared.expanded, request.source_types.clone())
                .await?;
            hits.truncate(pool_len);
            Ok::<_, ErrorEnvelope>(hits)
        };

        let classify_branch = async {
            Ok::<_, ErrorEnvelope>(backends.expander.classify(ctx, &prepared.cleaned).await)
        };

        let (vector_hits, lexical_hits, intent) =
            tokio::try_join!(vector_branch, lexical_branch, classify_branch)?;
        let analysis = prepared.with_intent(intent);
        let vector_candidates = vector_hits.len();
        let lexical_candidates = lexical_hits.len();

        let FusionOutcome { results, malformed } =
            fuse(vector_hits, lexical_hits, self.settings.weights);
        if let Some(logger) = logger {
            for hit in &malformed {
                let mut fields = LogFields::new();
                fields.insert(
                    "code".into(),
                    Value::String(ErrorCode::malformed_result().to_string()),
                );
                fields.insert("channel".into(), Value::String(hit.channel.to_string()));
                fields.insert("rank".into(), Value::from(hit.rank));
                fields.insert("reason".into(), Value::String(hit.reason.as_str().to_owned()));
                if let Some(id) = hit.id.as_ref() {
                    fields.insert("documentId".into(), Value::String(id.as_str().to_owned()));
                }
                logger.warn(
                    "search.malformed_result",
                    "Skipped malformed backend result",
                    Some(fields),
                );
            }
        }

        let results = results
            .into_iter()
            .filter(|result| passes_filter(request.source_types.as_ref(), result.source_type))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();

        Ok(CompletedSearch {
            analysis,
            results,
            vector_candidates,
            lexical_candidates,
            malformed: malformed.len(),
        })
    }
}

struct CompletedSearch {
    analysis: ExpandedQuery,
    results: Vec<SearchResult>,
    vector_candidates: usize,
    lexical_candidates: usize,
    malformed: usize,
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn log_fields_start(request: &SearchRequest, limit: u32) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("queryLength".into(), Value::from(request.query.len()));
    fields.insert("limit".into(), Value::from(limit));
    if let Some(filter) = request.source_types.as_ref() {
        fields.insert("sourceTypes".into(), Value::from(filter.as_strs()));
    }
    fields
}

fn log_fields_completed(completed: &CompletedSearch, started_at: Instant) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
    fields.insert("results".into(), Value::from(completed.results.len()));
    fields.insert(
        "vectorCandidates".into(),
        Value::from(completed.vector_candidates),
    );
    fields.insert(
        "lexicalCandidates".into(),
        Value::from(completed.lexical_candidates),
    );
    fields.insert("malformed".into(), Value::from(completed.malformed));
    fields.insert(
        "intent".into(),
        Value::String(completed.analysis.intent.as_str().to_owned()),
    );
    fields.insert(
        "sourceHint".into(),
        completed
            .analysis
            .source_hint
            .map_or(Value::Null, |hint| Value::String(hint.as_str().to_owned())),
    );
    fields.insert(
        "expandedLength".into(),
        Value::from(completed.analysis.expanded.len()),
    );
    fields
}
