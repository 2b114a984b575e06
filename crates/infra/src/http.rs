//! JSON-RPC over HTTP with axum.

use crate::InfraResult;
use crate::rpc::RpcHandler;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use hybrid_rag_shared::{CancellationToken, ErrorEnvelope};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone)]
struct HttpState {
    handler: RpcHandler,
    shutdown: CancellationToken,
}

/// Routes: `POST /mcp` for JSON-RPC and `GET /health`.
pub fn router(handler: RpcHandler, shutdown: CancellationToken) -> Router {
    Router::new()
        .route("/mcp", post(handle_rpc))
        .route("/health", get(health))
        .with_state(HttpState { handler, shutdown })
}

/// Bind the HTTP listener on `host:port` (port 0 picks a free port).
pub async fn bind(host: &str, port: u16) -> InfraResult<TcpListener> {
    TcpListener::bind((host, port)).await.map_err(|error| {
        ErrorEnvelope::from(error)
            .with_metadata("host", host.to_owned())
            .with_metadata("port", port.to_string())
    })
}

/// Serve on `listener` until `shutdown` fires.
pub async fn serve_http(
    listener: TcpListener,
    handler: RpcHandler,
    shutdown: CancellationToken,
) -> InfraResult<()> {
    tracing::info!(address = ?listener.local_addr().ok(), "serving JSON-RPC over HTTP");
    let app = router(handler, shutdown.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_rpc(State(state): State<HttpState>, body: Bytes) -> Json<Value> {
    Json(state.handler.handle_frame(&body, &state.shutdown).await)
}
