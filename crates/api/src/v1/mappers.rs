//! Mapping between domain values, error envelopes, and wire DTOs.

use crate::v1::{
    INTERNAL_ERROR, INVALID_PARAMS, JsonRpcErrorDto, SearchResponseDto, SearchResultDto,
};
use hybrid_rag_domain::SearchResult;
use hybrid_rag_shared::{ErrorEnvelope, is_secret_key};

/// JSON-RPC code for an application error.
///
/// Only invalid input is the caller's fault; everything else is internal.
#[must_use]
pub fn jsonrpc_code_for(envelope: &ErrorEnvelope) -> i32 {
    if envelope.is_invalid_input() {
        INVALID_PARAMS
    } else {
        INTERNAL_ERROR
    }
}

/// Map an `ErrorEnvelope` into a JSON-RPC error object.
///
/// `data` carries the message followed by non-secret metadata.
#[must_use]
pub fn error_envelope_to_jsonrpc_error(envelope: &ErrorEnvelope) -> JsonRpcErrorDto {
    let mut cause = format!("{}: {}", envelope.code, envelope.message);
    let details: Vec<String> = envelope
        .metadata
        .iter()
        .filter(|(key, _)| !is_secret_key(key))
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    if !details.is_empty() {
        cause.push_str(" (");
        cause.push_str(&details.join(", "));
        cause.push(')');
    }

    JsonRpcErrorDto::new(jsonrpc_code_for(envelope), Some(cause))
}

/// Map one fused result to its wire form.
#[must_use]
pub fn search_result_to_dto(result: SearchResult) -> SearchResultDto {
    SearchResultDto {
        score: result.score,
        text: result.text.into_string(),
        source_type: result.source_type.as_str().to_string(),
        source_title: result.source_title.into_string(),
        source_url: result.source_url.map(String::from),
        file_path: result.file_path.map(String::from),
        repo_name: result.repo_name.map(String::from),
    }
}

/// Map an ordered result list to the `search` response.
#[must_use]
pub fn search_results_to_response(results: Vec<SearchResult>) -> SearchResponseDto {
    SearchResponseDto {
        results: results.into_iter().map(search_result_to_dto).collect(),
    }
}
