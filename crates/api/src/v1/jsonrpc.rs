//! JSON-RPC 2.0 request parsing and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version string carried by every frame.
pub const JSONRPC_VERSION: &str = "2.0";

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Internal error.
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcErrorDto {
    /// Numeric error code.
    pub code: i32,
    /// Short standard message.
    pub message: String,
    /// Human-readable cause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorDto {
    /// Build an error with the standard message for `code`.
    #[must_use]
    pub fn new(code: i32, data: Option<String>) -> Self {
        Self {
            code,
            message: standard_message(code).to_string(),
            data: data.map(Value::String),
        }
    }

    /// `-32700` with a cause.
    #[must_use]
    pub fn parse_error(cause: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, Some(cause.into()))
    }

    /// `-32600` with a cause.
    #[must_use]
    pub fn invalid_request(cause: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, Some(cause.into()))
    }

    /// `-32601` naming the method.
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, Some(format!("unknown method: {method}")))
    }

    /// `-32602` with a cause.
    #[must_use]
    pub fn invalid_params(cause: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, Some(cause.into()))
    }

    /// `-32603` with a cause.
    #[must_use]
    pub fn internal(cause: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, Some(cause.into()))
    }
}

const fn standard_message(code: i32) -> &'static str {
    match code {
        PARSE_ERROR => "Parse error",
        INVALID_REQUEST => "Invalid Request",
        METHOD_NOT_FOUND => "Method not found",
        INVALID_PARAMS => "Invalid params",
        _ => "Internal error",
    }
}

/// A shape-validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// Request id; `None` marks a notification.
    pub id: Option<Value>,
    /// Method name.
    pub method: Box<str>,
    /// Named parameters (empty when absent).
    pub params: Map<String, Value>,
}

impl JsonRpcRequest {
    /// True when the request carries no id.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Validate a decoded JSON value against the request shape.
    ///
    /// On failure the error is paired with whatever id could be recovered.
    pub fn from_value(value: Value) -> Result<Self, (Value, JsonRpcErrorDto)> {
        let Value::Object(mut object) = value else {
            return Err((
                Value::Null,
                JsonRpcErrorDto::invalid_request("request must be a JSON object"),
            ));
        };

        let id = object.remove("id");
        let echo_id = id.clone().unwrap_or(Value::Null);
        let fail = |cause: &str| Err((echo_id.clone(), JsonRpcErrorDto::invalid_request(cause)));

        if let Some(id) = &id {
            if !(id.is_number() || id.is_string() || id.is_null()) {
                return Err((
                    Value::Null,
                    JsonRpcErrorDto::invalid_request("id must be a number, string, or null"),
                ));
            }
        }

        match object.get("jsonrpc") {
            Some(Value::String(version)) if version == JSONRPC_VERSION => {},
            _ => return fail("jsonrpc must be \"2.0\""),
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) if !method.trim().is_empty() => method,
            _ => return fail("method must be a non-empty string"),
        };

        let params = match object.remove("params") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params,
            Some(_) => return fail("params must be an object"),
        };

        Ok(Self {
            id,
            method: method.into_boxed_str(),
            params,
        })
    }
}

/// Decode one frame of text into a request.
pub fn parse_request_line(line: &str) -> Result<JsonRpcRequest, (Value, JsonRpcErrorDto)> {
    let value: Value = serde_json::from_str(line)
        .map_err(|error| (Value::Null, JsonRpcErrorDto::parse_error(error.to_string())))?;
    JsonRpcRequest::from_value(value)
}

/// JSON-RPC response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Echoed request id (`null` when unknown).
    pub id: Value,
    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorDto>,
}

impl JsonRpcResponse {
    /// Build a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    #[must_use]
    pub fn failure(id: Value, error: JsonRpcErrorDto) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Serialize into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("jsonrpc".to_string(), Value::String(self.jsonrpc.clone()));
        object.insert("id".to_string(), self.id.clone());
        if let Some(result) = &self.result {
            object.insert("result".to_string(), result.clone());
        }
        if let Some(error) = &self.error {
            let mut error_object = Map::new();
            error_object.insert("code".to_string(), Value::from(error.code));
            error_object.insert("message".to_string(), Value::String(error.message.clone()));
            if let Some(data) = &error.data {
                error_object.insert("data".to_string(), data.clone());
            }
            object.insert("error".to_string(), Value::Object(error_object));
        }
        Value::Object(object)
    }
}
