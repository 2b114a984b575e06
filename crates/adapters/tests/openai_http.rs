// OpenAI adapter integration tests against a mock server.
#![allow(missing_docs, reason = "integration test crate")]

#[cfg(feature = "openai")]
mod openai {
    use hybrid_rag_adapters::classifier::openai::{OpenAiClassifierConfig, OpenAiIntentClassifier};
    use hybrid_rag_adapters::embedding::openai::{OpenAiEmbedding, OpenAiEmbeddingConfig};
    use hybrid_rag_ports::{EmbeddingPort, IntentClassifierPort, QueryIntent};
    use hybrid_rag_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedding_config(server: &MockServer, dimension: Option<u32>) -> OpenAiEmbeddingConfig {
        OpenAiEmbeddingConfig {
            api_key: "example".into(), // pragma: allowlist secret
            model: "text-embedding-3-small".into(),
            base_url: server.uri().into(),
            timeout_ms: 5_000,
            dimension,
        }
    }

    fn classifier_config(server: &MockServer, timeout_ms: u64) -> OpenAiClassifierConfig {
        OpenAiClassifierConfig {
            api_key: "example".into(), // pragma: allowlist secret
            model: "gpt-4o-mini".into(),
            base_url: format!("{}/v1", server.uri()).into(),
            timeout_ms,
        }
    }

    #[tokio::test]
    async fn embed_sends_model_input_and_dimensions() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer example"))
            .and(body_json(json!({
                "model": "text-embedding-3-small",
                "input": "api token rotation",
                "dimensions": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [0.1, 0.2], "index": 0 }]
            })))
            .mount(&server)
            .await;

        let adapter = OpenAiEmbedding::new(&embedding_config(&server, Some(2)))?;
        let ctx = RequestContext::new_request();
        let embedding = adapter.embed(&ctx, "api token rotation".into()).await?;
        assert_eq!(embedding.as_slice(), &[0.1, 0.2]);
        Ok(())
    }

    #[tokio::test]
    async fn embed_maps_rate_limits_to_retriable_provider_failures() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached", "type": "requests", "code": null }
            })))
            .mount(&server)
            .await;

        let adapter = OpenAiEmbedding::new(&embedding_config(&server, None))?;
        let ctx = RequestContext::new_request();
        let error = adapter
            .embed(&ctx, "hello".into())
            .await
            .err()
            .ok_or_else(|| ErrorEnvelope::invalid_input("expected a provider failure"))?;

        assert_eq!(error.code, ErrorCode::provider_unavailable());
        assert_eq!(error.class, ErrorClass::Retriable);
        assert_eq!(error.metadata.get("status").map(String::as_str), Some("429"));
        assert_eq!(error.metadata.get("provider").map(String::as_str), Some("openai"));
        Ok(())
    }

    #[tokio::test]
    async fn embed_rejects_undecodable_bodies() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let adapter = OpenAiEmbedding::new(&embedding_config(&server, None))?;
        let ctx = RequestContext::new_request();
        let error = adapter.embed(&ctx, "hello".into()).await.err();
        assert!(matches!(
            error,
            Some(ref e) if e.class == ErrorClass::NonRetriable
                && e.metadata.get("cause").map(String::as_str) == Some("decode")
        ));
        Ok(())
    }

    #[tokio::test]
    async fn classifier_parses_first_choice() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer example"))
            .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": " Code.\n" } },
                    { "message": { "role": "assistant", "content": "issue" } }
                ]
            })))
            .mount(&server)
            .await;

        let classifier = OpenAiIntentClassifier::new(&classifier_config(&server, 5_000))?;
        let ctx = RequestContext::new_request();
        let intent = classifier
            .classify(&ctx, "where is the retry loop implemented".into())
            .await?;
        assert_eq!(intent, QueryIntent::Code);
        Ok(())
    }

    #[tokio::test]
    async fn classifier_rejects_unknown_answers() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "banana" } }]
            })))
            .mount(&server)
            .await;

        let classifier = OpenAiIntentClassifier::new(&classifier_config(&server, 5_000))?;
        let ctx = RequestContext::new_request();
        let error = classifier.classify(&ctx, "anything".into()).await.err();
        assert!(matches!(
            error,
            Some(ref e) if e.metadata.get("answer").map(String::as_str) == Some("banana")
        ));
        Ok(())
    }

    #[tokio::test]
    async fn classifier_timeouts_are_retriable() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let classifier = OpenAiIntentClassifier::new(&classifier_config(&server, 50))?;
        let ctx = RequestContext::new_request();
        let error = classifier.classify(&ctx, "anything".into()).await.err();
        assert!(matches!(
            error,
            Some(ref e) if e.class == ErrorClass::Retriable
                && e.metadata.get("cause").map(String::as_str) == Some("timeout")
        ));
        Ok(())
    }
}
