//! Shared reqwest plumbing for the HTTP adapters.

use crate::provider_error::ProviderErrorContext;
use hybrid_rag_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Build a client with a request timeout and default headers.
pub fn build_client(provider: &str, timeout: Duration, headers: HeaderMap) -> Result<reqwest::Client> {
    if timeout.is_zero() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "timeout must be greater than zero",
        ));
    }
    reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("adapter", "http_client_init_failed"),
                format!("failed to build {provider} client: {error}"),
                ErrorClass::NonRetriable,
            )
            .with_metadata("provider", provider.to_owned())
        })
}

/// Insert a credential header, marked sensitive so it never shows in debug output.
pub fn insert_secret_header(
    headers: &mut HeaderMap,
    name: HeaderName,
    value: &str,
) -> Result<()> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "api key contains invalid header characters",
        )
    })?;
    header.set_sensitive(true);
    headers.insert(name, header);
    Ok(())
}

/// Trim a base URL and drop trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<Box<str>> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "base url must be non-empty",
        ));
    }
    Ok(trimmed.into())
}

/// Send a request and read the body, racing both against cancellation.
pub async fn send_with_cancellation(
    ctx: &RequestContext,
    request: reqwest::RequestBuilder,
    error_ctx: ProviderErrorContext,
) -> Result<(StatusCode, Vec<u8>)> {
    ctx.ensure_not_cancelled(error_ctx.operation)?;

    let response = tokio::select! {
        () = ctx.cancelled() => return Err(error_ctx.cancelled()),
        result = request.send() => result.map_err(|error| error_ctx.transport(&error))?,
    };

    let status = response.status();
    let payload = tokio::select! {
        () = ctx.cancelled() => return Err(error_ctx.cancelled()),
        result = response.bytes() => result.map_err(|error| error_ctx.transport(&error))?,
    };

    Ok((status, payload.to_vec()))
}
