//! Intent classification through an OpenAI-compatible chat completions API.

use crate::embedding::openai::map_openai_http_error;
use crate::http::{build_client, insert_secret_header, normalize_base_url, send_with_cancellation};
use crate::provider_error::ProviderErrorContext;
use hybrid_rag_ports::{BoxFuture, IntentClassifierPort, QueryIntent};
use hybrid_rag_shared::{ErrorEnvelope, RequestContext, Result};
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ERROR_CTX: ProviderErrorContext = ProviderErrorContext::new("openai", "classify");

const SYSTEM_PROMPT: &str = "Classify the user's search query. Answer with exactly one word: \
code, documentation, issue, or general.";

/// Classifier configuration.
#[derive(Debug, Clone)]
pub struct OpenAiClassifierConfig {
    /// API key used for authentication.
    pub api_key: Box<str>,
    /// Chat model name.
    pub model: Box<str>,
    /// API root.
    pub base_url: Box<str>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// LLM-backed [`IntentClassifierPort`].
pub struct OpenAiIntentClassifier {
    client: reqwest::Client,
    endpoint: Box<str>,
    model: Box<str>,
}

impl OpenAiIntentClassifier {
    /// Create a classifier.
    pub fn new(config: &OpenAiClassifierConfig) -> Result<Self> {
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
            client,
            endpoint: format!("{base_url}/chat/completions").into_boxed_str(),
            model: model.into(),
        })
    }

    async fn classify_text(&self, ctx: &RequestContext, text: &str) -> Result<QueryIntent> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
            max_tokens: 4,
        };
        let request = self.client.post(self.endpoint.as_ref()).json(&body);
        let (status, payload) = send_with_cancellation(ctx, request, ERROR_CTX).await?;
        if !status.is_success() {
            return Err(map_openai_http_error(ERROR_CTX, status, &payload));
        }

        let response: ChatResponse =
            serde_json::from_slice(&payload).map_err(|error| ERROR_CTX.decode(&error))?;
        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        QueryIntent::parse(&answer).map_err(|error| {
            ERROR_CTX
                .invalid_response(format!("classifier answer not understood: {error}"))
                .with_metadata("answer", answer.trim().to_owned())
        })
    }
}

impl IntentClassifierPort for OpenAiIntentClassifier {
    fn classify(&self, ctx: &RequestContext, text: Box<str>) -> BoxFuture<'_, Result<QueryIntent>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.classify_text(&ctx, &text).await })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
