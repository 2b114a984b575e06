//! Adapter selection and engine composition.

use crate::InfraResult;
use hybrid_rag_adapters::classifier::openai::{OpenAiClassifierConfig, OpenAiIntentClassifier};
use hybrid_rag_adapters::embedding::hash::HashEmbedding;
use hybrid_rag_adapters::embedding::openai::{OpenAiEmbedding, OpenAiEmbeddingConfig};
use hybrid_rag_adapters::logger::JsonLogger;
use hybrid_rag_adapters::memory::InMemoryCorpus;
use hybrid_rag_adapters::qdrant::{QdrantConfig, QdrantRestClient};
use hybrid_rag_app::{
    HybridSearchEngine, LexicalSearchAdapter, QueryExpander, SearchBackends, SearchSettings,
    VectorSearchAdapter,
};
use hybrid_rag_config::{
    DistanceSetting, EmbeddingProviderKind, ValidatedRuntimeConfig, VectorStoreProvider,
};
use hybrid_rag_ports::{
    DistanceMetric, EmbeddingPort, IntentClassifierPort, LexicalSourcePort, LoggerPort,
    VectorStorePort,
};
use hybrid_rag_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use std::sync::Arc;

/// Vector store and lexical source selected from config.
///
/// Both halves usually point at the same backend.
#[derive(Clone)]
pub struct StoreBackends {
    /// Dense similarity search.
    pub vector: Arc<dyn VectorStorePort>,
    /// Filtered listing for lexical scoring.
    pub lexical: Arc<dyn LexicalSourcePort>,
}

/// Structured JSON logger on stderr at the configured level.
#[must_use]
pub fn build_logger(config: &ValidatedRuntimeConfig) -> Arc<dyn LoggerPort> {
    Arc::new(JsonLogger::stderr(config.server.log_level))
}

/// Dimension produced by the offline embedding.
#[must_use]
pub fn test_embedding_dimension(config: &ValidatedRuntimeConfig) -> u32 {
    config
        .embedding
        .dimension
        .unwrap_or(config.vector_store.vector_dimension)
}

/// Build the embedding port selected by `embedding.provider`.
pub fn build_embedding_port(config: &ValidatedRuntimeConfig) -> InfraResult<Arc<dyn EmbeddingPort>> {
    match config.embedding.provider {
        EmbeddingProviderKind::Test => Ok(Arc::new(HashEmbedding::new(test_embedding_dimension(
            config,
        ))?)),
        EmbeddingProviderKind::Openai => {
            let api_key = config
                .embedding
                .api_key
                .as_ref()
                .filter(|key| !key.is_blank())
                .ok_or_else(|| {
                    missing_api_key(
                        "embedding.apiKey",
                        "OpenAI API key is required (set HRAG_EMBEDDING_API_KEY or OPENAI_API_KEY)",
                    )
                })?;
            let adapter = OpenAiEmbedding::new(&OpenAiEmbeddingConfig::from_embedding_config(
                api_key.expose().into(),
                &config.embedding,
            ))?;
            Ok(Arc::new(adapter))
        },
    }
}

/// Build the optional intent classifier; `None` when disabled.
pub fn build_classifier_port(
    config: &ValidatedRuntimeConfig,
) -> InfraResult<Option<Arc<dyn IntentClassifierPort>>> {
    if !config.classifier.enabled {
        return Ok(None);
    }
    let api_key = config
        .classifier_api_key()
        .filter(|key| !key.is_blank())
        .ok_or_else(|| {
            missing_api_key(
                "classifier.apiKey",
                "classifier API key is required when the classifier is enabled",
            )
        })?;
    let classifier = OpenAiIntentClassifier::new(&OpenAiClassifierConfig {
        api_key: api_key.expose().into(),
        model: config.classifier.model.clone(),
        base_url: config.classifier_base_url().into(),
        timeout_ms: config.classifier.timeout_ms,
    })?;
    Ok(Some(Arc::new(classifier)))
}

/// Build the vector store and lexical source selected by `vectorStore.provider`.
///
/// The memory provider loads `vectorStore.seedPath` when set. Seed points
/// without vectors are embedded with the hash embedding when the embedding
/// provider is `test`; otherwise they only take part in lexical scoring.
pub fn build_store_backends(config: &ValidatedRuntimeConfig) -> InfraResult<StoreBackends> {
    match config.vector_store.provider {
        VectorStoreProvider::Qdrant => {
            let client = Arc::new(QdrantRestClient::new(
                &QdrantConfig::from_vector_store_config(&config.vector_store),
            )?);
            Ok(StoreBackends {
                vector: Arc::clone(&client) as Arc<dyn VectorStorePort>,
                lexical: client,
            })
        },
        VectorStoreProvider::Memory => {
            let corpus = Arc::new(InMemoryCorpus::new()?);
            if let Some(path) = config.vector_store.seed_path.as_deref() {
                let collection = config.collection_name()?;
                let count = if config.embedding.provider == EmbeddingProviderKind::Test {
                    let hasher = HashEmbedding::new(test_embedding_dimension(config))?;
                    let embed = |text: &str| hasher.vector_for(text);
                    corpus.load_seed_file(path, &collection, Some(&embed))?
                } else {
                    corpus.load_seed_file(path, &collection, None)?
                };
                tracing::info!(
                    path = %path.display(),
                    collection = collection.as_str(),
                    count,
                    "seeded in-memory corpus"
                );
            }
            Ok(StoreBackends {
                vector: Arc::clone(&corpus) as Arc<dyn VectorStorePort>,
                lexical: corpus,
            })
        },
    }
}

/// Engine tunables from the `search` and `vectorStore` sections.
pub fn search_settings(config: &ValidatedRuntimeConfig) -> InfraResult<SearchSettings> {
    Ok(SearchSettings {
        default_limit: config.search.default_limit,
        max_limit: config.search.max_limit,
        weights: config.fusion_weights()?,
        score_threshold: config.search.score_threshold,
        candidate_pool_factor: config.search.candidate_pool_factor,
        timeout: config.search.timeout(),
        ensure_collection: config.vector_store.ensure_collection,
        vector_dimension: config.vector_store.vector_dimension,
        distance: distance_metric(config.vector_store.distance),
    })
}

/// Assemble every backend the engine searches through.
pub fn build_search_backends(
    config: &ValidatedRuntimeConfig,
    logger: &Arc<dyn LoggerPort>,
) -> InfraResult<SearchBackends> {
    let collection = config.collection_name()?;
    let embedding = build_embedding_port(config)?;
    let stores = build_store_backends(config)?;

    let mut expander = QueryExpander::new()
        .with_classify_timeout(config.classifier.timeout())
        .with_logger(Arc::clone(logger));
    if let Some(classifier) = build_classifier_port(config)? {
        expander = expander.with_classifier(classifier);
    }

    let provider_name = stores.vector.provider().id.as_str().to_owned();
    Ok(SearchBackends {
        expander,
        embedding,
        vector: VectorSearchAdapter::new(stores.vector, collection.clone()),
        lexical: LexicalSearchAdapter::new(stores.lexical, collection, provider_name)
            .with_scan_limit(config.vector_store.scan_limit),
    })
}

/// Build, wire, and initialize the engine.
///
/// Initialization creates the collection when it is missing and
/// `vectorStore.ensureCollection` is set.
pub async fn start_engine(
    ctx: &RequestContext,
    config: &ValidatedRuntimeConfig,
    logger: Arc<dyn LoggerPort>,
) -> InfraResult<Arc<HybridSearchEngine>> {
    let backends = build_search_backends(config, &logger)?;
    let engine = HybridSearchEngine::new(search_settings(config)?).with_logger(logger);
    engine.initialize(ctx, backends).await?;
    tracing::info!(
        vector_store = config.vector_store.provider.as_str(),
        embedding = config.embedding.provider.as_str(),
        classifier = config.classifier.enabled,
        "search engine ready"
    );
    Ok(Arc::new(engine))
}

const fn distance_metric(setting: DistanceSetting) -> DistanceMetric {
    match setting {
        DistanceSetting::Cosine => DistanceMetric::Cosine,
        DistanceSetting::Dot => DistanceMetric::Dot,
        DistanceSetting::Euclid => DistanceMetric::Euclid,
    }
}

fn missing_api_key(field: &'static str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::new("config", "missing_api_key"), message)
        .with_metadata("field", field)
}
