//! HTTP transport tests over a loopback listener.
#![allow(missing_docs, reason = "integration test crate")]

use hybrid_rag_app::{HybridSearchEngine, SearchSettings};
use hybrid_rag_infra::{RpcHandler, http};
use hybrid_rag_shared::CancellationToken;
use serde_json::{Value, json};
use std::sync::Arc;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn mcp_endpoint_and_health_check() -> TestResult {
    let listener = http::bind("127.0.0.1", 0).await?;
    let address = listener.local_addr()?;
    let shutdown = CancellationToken::new();
    let handler = RpcHandler::new(Arc::new(HybridSearchEngine::new(SearchSettings::default())));
    let server = tokio::spawn(http::serve_http(listener, handler, shutdown.clone()));

    let client = reqwest::Client::new();
    let base = format!("http://{address}");

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health, json!({ "status": "ok" }));

    let offerings: Value = client
        .post(format!("{base}/mcp"))
        .json(&json!({"jsonrpc":"2.0","id":"x","method":"listOfferings"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(offerings["id"], "x");
    assert_eq!(offerings["result"]["offerings"][0]["name"], "Hybrid RAG Search");

    let notification: Value = client
        .post(format!("{base}/mcp"))
        .json(&json!({"jsonrpc":"2.0","method":"listOfferings"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(notification, json!({}));

    let missing_query: Value = client
        .post(format!("{base}/mcp"))
        .json(&json!({"jsonrpc":"2.0","id":3,"method":"search","params":{}}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(missing_query["error"]["code"], -32602);

    shutdown.cancel();
    server.await??;
    Ok(())
}
