// Qdrant REST adapter integration tests against a mock server.
#![allow(missing_docs, reason = "integration test crate")]

#[cfg(feature = "qdrant")]
mod qdrant {
    use hybrid_rag_adapters::qdrant::{QdrantConfig, QdrantRestClient};
    use hybrid_rag_ports::{
        CollectionName, CollectionSpec, DistanceMetric, DocumentId, LexicalScanRequest,
        LexicalSourcePort, SourceType, SourceTypeFilter, VectorQuery, VectorStorePort,
    };
    use hybrid_rag_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Result<QdrantRestClient> {
        QdrantRestClient::new(&QdrantConfig {
            url: server.uri().into(),
            api_key: Some("qdrant-key".into()), // pragma: allowlist secret
            timeout_ms: 5_000,
        })
    }

    fn collection() -> Result<CollectionName> {
        CollectionName::parse("knowledge_base").map_err(ErrorEnvelope::from)
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "result": result,
            "status": "ok",
            "time": 0.001
        }))
    }

    #[tokio::test]
    async fn collection_exists_lists_collections() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections"))
            .and(header("api-key", "qdrant-key"))
            .respond_with(ok(json!({
                "collections": [{ "name": "other" }, { "name": "knowledge_base" }]
            })))
            .mount(&server)
            .await;

        let ctx = RequestContext::new_request();
        assert!(client(&server)?.collection_exists(&ctx, collection()?).await?);
        let missing = CollectionName::parse("missing").map_err(ErrorEnvelope::from)?;
        assert!(!client(&server)?.collection_exists(&ctx, missing).await?);
        Ok(())
    }

    #[tokio::test]
    async fn create_collection_sends_vector_params() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/knowledge_base"))
            .and(body_json(json!({ "vectors": { "size": 1536, "distance": "Cosine" } })))
            .respond_with(ok(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = RequestContext::new_request();
        client(&server)?
            .create_collection(
                &ctx,
                CollectionSpec {
                    name: collection()?,
                    dimension: 1536,
                    distance: DistanceMetric::Cosine,
                },
            )
            .await
    }

    #[tokio::test]
    async fn search_pushes_filter_and_threshold_down() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/knowledge_base/points/search"))
            .and(body_partial_json(json!({
                "limit": 4,
                "with_payload": true,
                "score_threshold": 0.3,
                "filter": {
                    "must": [{ "key": "source_type", "match": { "any": ["git"] } }]
                }
            })))
            .respond_with(ok(json!([
                {
                    "id": 11,
                    "version": 1,
                    "score": 0.91,
                    "payload": {
                        "content": "fn refresh_token()",
                        "source_type": "git",
                        "metadata": { "title": "auth.rs", "url": "https://git/auth.rs" },
                        "file_path": "src/auth.rs",
                        "repo_name": "gateway"
                    }
                },
                {
                    "id": "0b4f8f0e-3a59-4c1f-9d4c-8f1d2b7a6e55",
                    "version": 1,
                    "score": 0.42,
                    "payload": { "content": "token cache", "source_type": "git" }
                }
            ])))
            .mount(&server)
            .await;

        let ctx = RequestContext::new_request();
        let hits = client(&server)?
            .search(
                &ctx,
                VectorQuery {
                    collection: collection()?,
                    vector: Arc::from([0.1_f32, 0.2, 0.3].as_slice()),
                    limit: 4,
                    score_threshold: Some(0.3),
                    filter: SourceTypeFilter::from_types([SourceType::Git]),
                },
            )
            .await?;

        assert_eq!(hits.len(), 2);
        let first = hits.first().ok_or_else(|| ErrorEnvelope::invalid_input("no hits"))?;
        assert_eq!(first.id.as_ref().map(DocumentId::as_str), Some("11"));
        assert_eq!(first.payload.title.as_deref(), Some("auth.rs"));
        assert_eq!(first.payload.repo_name.as_deref(), Some("gateway"));
        assert_eq!(
            hits.get(1).and_then(|hit| hit.id.as_ref()).map(DocumentId::as_str),
            Some("0b4f8f0e-3a59-4c1f-9d4c-8f1d2b7a6e55")
        );
        Ok(())
    }

    #[tokio::test]
    async fn scan_follows_next_page_offset() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/knowledge_base/points/scroll"))
            .and(body_partial_json(json!({ "offset": 2 })))
            .respond_with(ok(json!({
                "points": [{ "id": 2, "payload": { "content": "third" } }],
                "next_page_offset": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/collections/knowledge_base/points/scroll"))
            .and(body_json(json!({ "limit": 5, "with_payload": true, "with_vector": false })))
            .respond_with(ok(json!({
                "points": [
                    { "id": 0, "payload": { "content": "first" } },
                    { "id": 1, "payload": { "content": "second" } }
                ],
                "next_page_offset": 2
            })))
            .mount(&server)
            .await;

        let ctx = RequestContext::new_request();
        let documents = client(&server)?
            .scan(
                &ctx,
                LexicalScanRequest {
                    collection: collection()?,
                    filter: None,
                    limit: 5,
                },
            )
            .await?;

        let texts: Vec<_> = documents
            .iter()
            .filter_map(|doc| doc.payload.text.as_deref())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_carry_qdrant_status_message() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/knowledge_base/points/search"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "status": { "error": "service is overloaded" },
                "time": 0.0
            })))
            .mount(&server)
            .await;

        let ctx = RequestContext::new_request();
        let error = client(&server)?
            .search(
                &ctx,
                VectorQuery {
                    collection: collection()?,
                    vector: Arc::from([0.5_f32].as_slice()),
                    limit: 1,
                    score_threshold: None,
                    filter: None,
                },
            )
            .await
            .err()
            .ok_or_else(|| ErrorEnvelope::invalid_input("expected failure"))?;

        assert_eq!(error.code, ErrorCode::provider_unavailable());
        assert_eq!(error.class, ErrorClass::Retriable);
        assert!(error.message.contains("service is overloaded"));
        assert_eq!(
            error.metadata.get("collection").map(String::as_str),
            Some("knowledge_base")
        );
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_server_is_retriable() -> Result<()> {
        let client = QdrantRestClient::new(&QdrantConfig {
            url: "http://127.0.0.1:9".into(),
            api_key: None,
            timeout_ms: 1_000,
        })?;
        let ctx = RequestContext::new_request();
        let error = client.collection_exists(&ctx, collection()?).await.err();
        assert!(matches!(
            error,
            Some(ref e) if e.class == ErrorClass::Retriable
                && e.code == ErrorCode::provider_unavailable()
        ));
        Ok(())
    }
}
