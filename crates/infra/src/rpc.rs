//! JSON-RPC dispatch onto the search engine.
//!
//! This is the only place application errors become JSON-RPC error objects.
//! Notifications (requests without an `id`) still run; their reply is the
//! empty object, which transports treat as "write nothing".

use hybrid_rag_api::v1::{
    JsonRpcErrorDto, JsonRpcRequest, JsonRpcResponse, error_envelope_to_jsonrpc_error,
    list_offerings_response, parse_request_line, parse_search_params, search_results_to_response,
};
use hybrid_rag_app::{HybridSearchEngine, SearchRequest};
use hybrid_rag_ports::{LogFields, LogLevel, LoggerPort};
use hybrid_rag_shared::{CancellationToken, CorrelationId, ErrorEnvelope, RequestContext};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Method running a hybrid search.
pub const METHOD_SEARCH: &str = "search";
/// Method describing the offered tools.
pub const METHOD_LIST_OFFERINGS: &str = "listOfferings";

enum RpcFailure {
    Protocol(JsonRpcErrorDto),
    Application(ErrorEnvelope),
}

impl RpcFailure {
    fn to_dto(&self) -> JsonRpcErrorDto {
        match self {
            Self::Protocol(dto) => dto.clone(),
            Self::Application(envelope) => error_envelope_to_jsonrpc_error(envelope),
        }
    }
}

/// Dispatches JSON-RPC requests to the engine.
#[derive(Clone)]
pub struct RpcHandler {
    engine: Arc<HybridSearchEngine>,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl RpcHandler {
    /// Create a handler over an initialized (or not yet initialized) engine.
    #[must_use]
    pub const fn new(engine: Arc<HybridSearchEngine>) -> Self {
        Self {
            engine,
            logger: None,
        }
    }

    /// Attach a logger for `rpc.*` events.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Handle one raw frame; bytes that are not UTF-8 are a parse error.
    pub async fn handle_frame(&self, frame: &[u8], cancellation: &CancellationToken) -> Value {
        match std::str::from_utf8(frame) {
            Ok(line) => self.handle_line(line, cancellation).await,
            Err(error) => self.reject(
                Value::Null,
                JsonRpcErrorDto::parse_error(format!("frame is not valid UTF-8: {error}")),
            ),
        }
    }

    /// Handle one text frame.
    pub async fn handle_line(&self, line: &str, cancellation: &CancellationToken) -> Value {
        match parse_request_line(line) {
            Ok(request) => self.handle_request(request, cancellation).await,
            Err((id, error)) => self.reject(id, error),
        }
    }

    /// Handle one already-decoded JSON value.
    pub async fn handle_value(&self, value: Value, cancellation: &CancellationToken) -> Value {
        match JsonRpcRequest::from_value(value) {
            Ok(request) => self.handle_request(request, cancellation).await,
            Err((id, error)) => self.reject(id, error),
        }
    }

    /// Handle a shape-validated request.
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        cancellation: &CancellationToken,
    ) -> Value {
        let ctx = RequestContext::with_cancellation(
            CorrelationId::new_request_id(),
            cancellation.clone(),
        );
        let logger = self.request_logger(&ctx, &request);
        if let Some(logger) = logger.as_deref() {
            logger.info("rpc.request", "JSON-RPC request received", None);
        }

        let outcome = self.dispatch(&ctx, &request).await;
        if let (Err(failure), Some(logger)) = (&outcome, logger.as_deref()) {
            log_failure(logger, failure);
        }

        let Some(id) = request.id else {
            return Value::Object(Map::new());
        };
        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result).to_value(),
            Err(failure) => JsonRpcResponse::failure(id, failure.to_dto()).to_value(),
        }
    }

    async fn dispatch(
        &self,
        ctx: &RequestContext,
        request: &JsonRpcRequest,
    ) -> Result<Value, RpcFailure> {
        match request.method.as_ref() {
            METHOD_SEARCH => self.search(ctx, &request.params).await,
            METHOD_LIST_OFFERINGS => to_result(&list_offerings_response()),
            other => Err(RpcFailure::Protocol(JsonRpcErrorDto::method_not_found(other))),
        }
    }

    async fn search(
        &self,
        ctx: &RequestContext,
        params: &Map<String, Value>,
    ) -> Result<Value, RpcFailure> {
        let params = parse_search_params(params)
            .map_err(|issue| RpcFailure::Application(ErrorEnvelope::from(issue)))?;

        let mut request = SearchRequest::new(params.query).with_source_types(params.source_types);
        if let Some(limit) = params.limit {
            request = request.with_limit(limit);
        }

        let results = self
            .engine
            .search(ctx, request)
            .await
            .map_err(RpcFailure::Application)?;
        to_result(&search_results_to_response(results))
    }

    fn reject(&self, id: Value, error: JsonRpcErrorDto) -> Value {
        if let Some(logger) = self.logger.as_deref() {
            log_failure(logger, &RpcFailure::Protocol(error.clone()));
        }
        JsonRpcResponse::failure(id, error).to_value()
    }

    fn request_logger(
        &self,
        ctx: &RequestContext,
        request: &JsonRpcRequest,
    ) -> Option<Box<dyn LoggerPort>> {
        self.logger.as_ref().map(|logger| {
            let mut fields = LogFields::new();
            fields.insert(
                "correlationId".into(),
                Value::from(ctx.correlation_id().as_str()),
            );
            fields.insert("method".into(), Value::from(request.method.as_ref()));
            fields.insert("notification".into(), Value::Bool(request.is_notification()));
            logger.child(fields)
        })
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, RpcFailure> {
    serde_json::to_value(value)
        .map_err(|error| RpcFailure::Protocol(JsonRpcErrorDto::internal(error.to_string())))
}

fn log_failure(logger: &dyn LoggerPort, failure: &RpcFailure) {
    let dto = failure.to_dto();
    let mut fields = LogFields::new();
    fields.insert("rpcCode".into(), Value::from(dto.code));
    match failure {
        RpcFailure::Application(envelope) => {
            let level = if envelope.is_invalid_input() {
                LogLevel::Warn
            } else {
                LogLevel::Error
            };
            logger.log_error(level, "rpc.error", "JSON-RPC request failed", Some(fields), envelope);
        },
        RpcFailure::Protocol(dto) => {
            if let Some(data) = dto.data.clone() {
                fields.insert("data".into(), data);
            }
            logger.warn("rpc.error", &dto.message, Some(fields));
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_adapters::log_sink::MemoryLogSink;
    use hybrid_rag_adapters::logger::JsonLogger;
    use hybrid_rag_api::v1::{INTERNAL_ERROR, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
    use hybrid_rag_app::SearchSettings;
    use serde_json::json;

    fn handler() -> RpcHandler {
        RpcHandler::new(Arc::new(HybridSearchEngine::new(SearchSettings::default())))
    }

    #[tokio::test]
    async fn unknown_methods_are_rejected() {
        let token = CancellationToken::new();
        let reply = handler()
            .handle_line(r#"{"jsonrpc":"2.0","id":7,"method":"index"}"#, &token)
            .await;
        assert_eq!(reply["id"], 7);
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn garbage_is_a_parse_error_with_null_id() {
        let token = CancellationToken::new();
        let reply = handler().handle_line("{not json", &token).await;
        assert_eq!(reply["id"], Value::Null);
        assert_eq!(reply["error"]["code"], PARSE_ERROR);
    }

    #[tokio::test]
    async fn invalid_utf8_frames_are_parse_errors() {
        let token = CancellationToken::new();
        let reply = handler()
            .handle_frame(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"query\":\"\xff\xfe\"}", &token)
            .await;
        assert_eq!(reply["id"], Value::Null);
        assert_eq!(reply["error"]["code"], PARSE_ERROR);
    }

    #[tokio::test]
    async fn wrong_version_is_an_invalid_request() {
        let token = CancellationToken::new();
        let reply = handler()
            .handle_value(json!({"jsonrpc":"1.0","id":"a","method":"search"}), &token)
            .await;
        assert_eq!(reply["id"], "a");
        assert_eq!(reply["error"]["code"], INVALID_REQUEST);
    }

    #[tokio::test]
    async fn uninitialized_engine_is_an_internal_error() {
        let token = CancellationToken::new();
        let reply = handler()
            .handle_value(
                json!({"jsonrpc":"2.0","id":1,"method":"search","params":{"query":"x"}}),
                &token,
            )
            .await;
        assert_eq!(reply["error"]["code"], INTERNAL_ERROR);
        assert!(
            reply["error"]["data"]
                .as_str()
                .is_some_and(|data| data.contains("not_initialized"))
        );
    }

    #[tokio::test]
    async fn notifications_produce_an_empty_object_and_a_log_line() {
        let sink = Arc::new(MemoryLogSink::default());
        let handler = handler().with_logger(Arc::new(JsonLogger::new(sink.clone())));
        let token = CancellationToken::new();

        let reply = handler
            .handle_value(json!({"jsonrpc":"2.0","method":"listOfferings"}), &token)
            .await;
        assert_eq!(reply, json!({}));

        let lines = sink.take();
        assert_eq!(lines.len(), 1);
        assert!(lines.iter().all(|line| line.contains("\"rpc.request\"")));
    }

    #[tokio::test]
    async fn list_offerings_describes_the_search_tool() {
        let token = CancellationToken::new();
        let reply = handler()
            .handle_value(json!({"jsonrpc":"2.0","id":2,"method":"listOfferings"}), &token)
            .await;
        assert_eq!(reply["result"]["offerings"][0]["id"], "hybrid-rag");
        assert_eq!(reply["result"]["offerings"][0]["tools"][0]["name"], "search");
    }
}
