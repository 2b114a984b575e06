//! API v1 DTOs and helpers.

mod jsonrpc;
mod mappers;
mod schema;
mod types;
mod validation;

pub use jsonrpc::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, JsonRpcErrorDto,
    JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, parse_request_line,
};
pub use mappers::{
    error_envelope_to_jsonrpc_error, jsonrpc_code_for, search_result_to_dto,
    search_results_to_response,
};
pub use schema::{list_offerings_response, search_params_schema};
pub use types::*;
pub use validation::{ValidatedSearchParams, ValidationIssue, parse_search_params};
