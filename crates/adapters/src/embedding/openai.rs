//! OpenAI embedding adapter.

use crate::http::{build_client, insert_secret_header, normalize_base_url, send_with_cancellation};
use crate::provider_error::ProviderErrorContext;
use hybrid_rag_config::EmbeddingConfig;
use hybrid_rag_ports::{
    BoxFuture, EmbedRequest, EmbeddingPort, EmbeddingProviderInfo, EmbeddingVector, ProviderId,
};
use hybrid_rag_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ERROR_CTX: ProviderErrorContext = ProviderErrorContext::new("openai", "embed");

/// OpenAI embedding adapter configuration.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API key used for authentication.
    pub api_key: Box<str>,
    /// Embedding model name.
    pub model: Box<str>,
    /// API root (`https://api.openai.com/v1` or a compatible server).
    pub base_url: Box<str>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Optional output dimension override.
    pub dimension: Option<u32>,
}

impl OpenAiEmbeddingConfig {
    /// Build from the runtime embedding section plus a resolved API key.
    #[must_use]
    pub fn from_embedding_config(api_key: Box<str>, config: &EmbeddingConfig) -> Self {
        Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout_ms: config.timeout_ms,
            dimension: config.dimension,
        }
    }
}

/// OpenAI embedding adapter implementation.
pub struct OpenAiEmbedding {
    provider: EmbeddingProviderInfo,
    client: reqwest::Client,
    endpoint: Box<str>,
    model: Box<str>,
    dimension: Option<u32>,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding adapter.
    pub fn new(config: &OpenAiEmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(ErrorEnvelope::invalid_input("api key must be set"));
        }
        let model = config.model.trim();
        if model.is_empty() {
            return Err(ErrorEnvelope::invalid_input("model must be non-empty"));
        }
        let base_url = normalize_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        insert_secret_header(&mut headers, AUTHORIZATION, &format!("Bearer {api_key}"))?;
        let client = build_client(
            "openai",
            Duration::from_millis(config.timeout_ms),
            headers,
        )?;

        Ok(Self {
            provider: EmbeddingProviderInfo {
                id: ProviderId::parse("openai").map_err(ErrorEnvelope::from)?,
                name: "OpenAI".into(),
            },
            client,
            endpoint: format!("{base_url}/embeddings").into_boxed_str(),
            model: model.into(),
            dimension: config.dimension,
        })
    }

    async fn embed_one(&self, ctx: &RequestContext, text: Box<str>) -> Result<EmbeddingVector> {
        if text.trim().is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "embedding input must be non-empty",
            ));
        }

        let body = OpenAiEmbeddingRequest {
            model: &self.model,
            input: &text,
            dimensions: self.dimension,
        };
        let request = self.client.post(self.endpoint.as_ref()).json(&body);
        let (status, payload) = send_with_cancellation(ctx, request, ERROR_CTX).await?;

        if !status.is_success() {
            return Err(map_openai_http_error(ERROR_CTX, status, &payload));
        }

        let response: OpenAiEmbeddingResponse =
            serde_json::from_slice(&payload).map_err(|error| ERROR_CTX.decode(&error))?;
        map_embedding(response, self.dimension)
    }
}

impl EmbeddingPort for OpenAiEmbedding {
    fn provider(&self) -> &EmbeddingProviderInfo {
        &self.provider
    }

    fn embed(
        &self,
        ctx: &RequestContext,
        request: EmbedRequest,
    ) -> BoxFuture<'_, Result<EmbeddingVector>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.embed_one(&ctx, request.text).await })
    }
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

/// Map an OpenAI error body (`{"error":{"message",...}}`) onto a provider failure.
pub(crate) fn map_openai_http_error(
    error_ctx: ProviderErrorContext,
    status: reqwest::StatusCode,
    payload: &[u8],
) -> ErrorEnvelope {
    let Ok(parsed) = serde_json::from_slice::<OpenAiErrorResponse>(payload) else {
        return error_ctx.status(status, None);
    };

    let mut envelope = error_ctx.status(status, Some(&parsed.error.message));
    if let Some(error_type) = parsed.error.error_type {
        envelope = envelope.with_metadata("error_type", error_type);
    }
    if let Some(error_code) = parsed.error.code {
        envelope = envelope.with_metadata("error_code", error_code);
    }
    envelope
}

fn map_embedding(
    response: OpenAiEmbeddingResponse,
    expected_dimension: Option<u32>,
) -> Result<EmbeddingVector> {
    let datum = response
        .data
        .into_iter()
        .min_by_key(|datum| datum.index)
        .ok_or_else(|| ERROR_CTX.invalid_response("OpenAI returned no embeddings"))?;
    if datum.embedding.is_empty() {
        return Err(ERROR_CTX.invalid_response("OpenAI returned an empty embedding"));
    }

    let vector = EmbeddingVector::from_vec(datum.embedding);
    if let Some(expected) = expected_dimension {
        vector
            .ensure_dimension(expected as usize)
            .map_err(|error| ERROR_CTX.invalid_response(error.message))?;
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_shared::ErrorClass;

    fn config() -> OpenAiEmbeddingConfig {
        OpenAiEmbeddingConfig {
            api_key: "sk-test".into(),
            model: "text-embedding-3-small".into(),
            base_url: "https://api.openai.com/v1/".into(),
            timeout_ms: 1_000,
            dimension: None,
        }
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let mut config = config();
        config.api_key = "  ".into();
        assert!(matches!(OpenAiEmbedding::new(&config), Err(ref e) if e.is_invalid_input()));
    }

    #[test]
    fn endpoint_joins_normalized_base_url() -> Result<()> {
        let adapter = OpenAiEmbedding::new(&config())?;
        assert_eq!(
            adapter.endpoint.as_ref(),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(adapter.provider().id.as_str(), "openai");
        Ok(())
    }

    #[test]
    fn error_body_is_folded_into_message() {
        let payload = br#"{"error":{"message":"Incorrect API key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let envelope =
            map_openai_http_error(ERROR_CTX, reqwest::StatusCode::UNAUTHORIZED, payload);
        assert_eq!(envelope.code, ErrorCode::provider_unavailable());
        assert_eq!(envelope.class, ErrorClass::NonRetriable);
        assert!(envelope.message.contains("Incorrect API key"));
        assert_eq!(
            envelope.metadata.get("error_code").map(String::as_str),
            Some("invalid_api_key")
        );
    }

    #[test]
    fn dimension_mismatch_is_a_provider_failure() {
        let response = OpenAiEmbeddingResponse {
            data: vec![OpenAiEmbeddingDatum {
                embedding: vec![0.1, 0.2],
                index: 0,
            }],
        };
        let error = map_embedding(response, Some(3)).err();
        assert!(matches!(error, Some(ref e) if e.code == ErrorCode::provider_unavailable()));
    }
}
