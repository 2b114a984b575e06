//! Qdrant REST client implementing the vector store and lexical source ports.

use crate::http::{build_client, insert_secret_header, normalize_base_url, send_with_cancellation};
use crate::point::{candidate_payload, point_id};
use crate::provider_error::ProviderErrorContext;
use hybrid_rag_config::VectorStoreConfig;
use hybrid_rag_ports::{
    BoxFuture, ChannelHit, CollectionName, CollectionSpec, LexicalDocument, LexicalScanRequest,
    LexicalSourcePort, ProviderId, SourceTypeFilter, VectorQuery, VectorStorePort,
    VectorStoreProviderInfo,
};
use hybrid_rag_shared::{ErrorEnvelope, RequestContext, Result};
use reqwest::header::{HeaderMap, HeaderName};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

const PROVIDER: &str = "qdrant";
const SCROLL_PAGE_MAX: u32 = 256;

/// Qdrant REST client settings.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// REST base URL, e.g. `http://localhost:6333`.
    pub url: Box<str>,
    /// Optional API key sent as `api-key`.
    pub api_key: Option<Box<str>>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl QdrantConfig {
    /// Build from the runtime vector store section.
    #[must_use]
    pub fn from_vector_store_config(config: &VectorStoreConfig) -> Self {
        Self {
            url: config.url.clone(),
            api_key: config
                .api_key
                .as_ref()
                .map(|key| Box::from(key.expose()))
                .filter(|key: &Box<str>| !key.trim().is_empty()),
            timeout_ms: config.timeout_ms,
        }
    }
}

/// Qdrant over its REST API.
pub struct QdrantRestClient {
    provider: VectorStoreProviderInfo,
    client: reqwest::Client,
    base_url: Box<str>,
}

impl QdrantRestClient {
    /// Create a client; no request is made until the first call.
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.url)?;
        let mut headers = HeaderMap::new();
        if let Some(api_key) = config.api_key.as_deref() {
            insert_secret_header(&mut headers, HeaderName::from_static("api-key"), api_key.trim())?;
        }
        let client = build_client(PROVIDER, Duration::from_millis(config.timeout_ms), headers)?;

        Ok(Self {
            provider: VectorStoreProviderInfo {
                id: ProviderId::parse(PROVIDER).map_err(ErrorEnvelope::from)?,
                name: "Qdrant".into(),
            },
            client,
            base_url,
        })
    }

    fn collection_url(&self, collection: &CollectionName, suffix: &str) -> String {
        format!(
            "{}/collections/{}{suffix}",
            self.base_url,
            collection.as_str()
        )
    }

    async fn call<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        request: reqwest::RequestBuilder,
        error_ctx: ProviderErrorContext,
        collection: Option<&CollectionName>,
    ) -> Result<T> {
        let with_collection = |envelope: ErrorEnvelope| match collection {
            Some(name) => envelope.with_metadata("collection", name.as_str()),
            None => envelope,
        };

        let (status, payload) = send_with_cancellation(ctx, request, error_ctx)
            .await
            .map_err(with_collection)?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<QdrantErrorResponse>(&payload)
                .ok()
                .and_then(|body| body.status)
                .and_then(|status| status.error);
            return Err(with_collection(error_ctx.status(status, detail.as_deref())));
        }

        let envelope: QdrantResponse<T> = serde_json::from_slice(&payload)
            .map_err(|error| with_collection(error_ctx.decode(&error)))?;
        Ok(envelope.result)
    }

    async fn list_collections(&self, ctx: &RequestContext) -> Result<Vec<String>> {
        let error_ctx = ProviderErrorContext::new(PROVIDER, "collection_exists");
        let request = self.client.get(format!("{}/collections", self.base_url));
        let result: CollectionsResult = self.call(ctx, request, error_ctx, None).await?;
        Ok(result
            .collections
            .into_iter()
            .map(|collection| collection.name)
            .collect())
    }

    async fn create(&self, ctx: &RequestContext, spec: &CollectionSpec) -> Result<()> {
        let error_ctx = ProviderErrorContext::new(PROVIDER, "create_collection");
        let body = json!({
            "vectors": {
                "size": spec.dimension,
                "distance": spec.distance.as_qdrant_str(),
            }
        });
        let request = self
            .client
            .put(self.collection_url(&spec.name, ""))
            .json(&body);
        let _: Value = self.call(ctx, request, error_ctx, Some(&spec.name)).await?;
        Ok(())
    }

    async fn search_points(&self, ctx: &RequestContext, query: VectorQuery) -> Result<Vec<ChannelHit>> {
        let error_ctx = ProviderErrorContext::new(PROVIDER, "search");
        let body = SearchBody {
            vector: &query.vector,
            limit: query.limit,
            with_payload: true,
            score_threshold: query.score_threshold,
            filter: query.filter.as_ref().map(source_type_filter),
        };
        let request = self
            .client
            .post(self.collection_url(&query.collection, "/points/search"))
            .json(&body);
        let points: Vec<ScoredPoint> = self
            .call(ctx, request, error_ctx, Some(&query.collection))
            .await?;

        Ok(points
            .into_iter()
            .map(|point| ChannelHit {
                id: point_id(point.id.as_ref()),
                score: point.score,
                payload: candidate_payload(point.payload.as_ref()),
            })
            .collect())
    }

    async fn scroll(
        &self,
        ctx: &RequestContext,
        request: LexicalScanRequest,
    ) -> Result<Vec<LexicalDocument>> {
        let error_ctx = ProviderErrorContext::new(PROVIDER, "scan");
        let filter = request.filter.as_ref().map(source_type_filter);
        let url = self.collection_url(&request.collection, "/points/scroll");
        let mut documents = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let remaining = request
                .limit
                .saturating_sub(u32::try_from(documents.len()).unwrap_or(u32::MAX));
            if remaining == 0 {
                break;
            }
            let body = ScrollBody {
                limit: remaining.min(SCROLL_PAGE_MAX),
                with_payload: true,
                with_vector: false,
                filter: filter.clone(),
                offset: offset.take(),
            };
            let page: ScrollResult = self
                .call(
                    ctx,
                    self.client.post(url.as_str()).json(&body),
                    error_ctx,
                    Some(&request.collection),
                )
                .await?;

            documents.extend(page.points.into_iter().map(|point| LexicalDocument {
                id: point_id(point.id.as_ref()),
                payload: candidate_payload(point.payload.as_ref()),
            }));

            match page.next_page_offset {
                Some(next) if !next.is_null() => offset = Some(next),
                _ => break,
            }
        }

        documents.truncate(request.limit as usize);
        Ok(documents)
    }
}

/// Qdrant filter restricting `source_type` to the allowed values.
fn source_type_filter(filter: &SourceTypeFilter) -> Value {
    json!({
        "must": [
            { "key": "source_type", "match": { "any": filter.as_strs() } }
        ]
    })
}

impl VectorStorePort for QdrantRestClient {
    fn provider(&self) -> &VectorStoreProviderInfo {
        &self.provider
    }

    fn collection_exists(
        &self,
        ctx: &RequestContext,
        collection: CollectionName,
    ) -> BoxFuture<'_, Result<bool>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let names = self.list_collections(&ctx).await?;
            Ok(names.iter().any(|name| name == collection.as_str()))
        })
    }

    fn create_collection(
        &self,
        ctx: &RequestContext,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.create(&ctx, &spec).await })
    }

    fn search(
        &self,
        ctx: &RequestContext,
        query: VectorQuery,
    ) -> BoxFuture<'_, Result<Vec<ChannelHit>>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.search_points(&ctx, query).await })
    }
}

impl LexicalSourcePort for QdrantRestClient {
    fn scan(
        &self,
        ctx: &RequestContext,
        request: LexicalScanRequest,
    ) -> BoxFuture<'_, Result<Vec<LexicalDocument>>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.scroll(&ctx, request).await })
    }
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct QdrantErrorResponse {
    status: Option<QdrantErrorStatus>,
}

#[derive(Debug, Deserialize)]
struct QdrantErrorStatus {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionsResult {
    #[serde(default)]
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    vector: &'a [f32],
    limit: u32,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    score_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ScrollBody {
    limit: u32,
    with_payload: bool,
    with_vector: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Option<Value>,
    score: f32,
    payload: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<RecordPoint>,
    next_page_offset: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RecordPoint {
    id: Option<Value>,
    payload: Option<Map<String, Value>>,
}
