//! Shared error mapping for HTTP-backed providers.
//!
//! Every failure leaves an adapter as `core:provider_unavailable` carrying
//! `provider`, `operation`, and `cause`; transport timeouts and connection
//! failures are retriable, everything else is not.

use hybrid_rag_shared::{ErrorClass, ErrorEnvelope};
use reqwest::StatusCode;

/// Identifies the failing call in error metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderErrorContext {
    /// Provider identifier (`openai`, `qdrant`).
    pub provider: &'static str,
    /// Operation label (`embed`, `search`, ...).
    pub operation: &'static str,
}

impl ProviderErrorContext {
    /// Build a context.
    #[must_use]
    pub const fn new(provider: &'static str, operation: &'static str) -> Self {
        Self {
            provider,
            operation,
        }
    }

    fn envelope(self, message: String, class: ErrorClass, cause: &str) -> ErrorEnvelope {
        ErrorEnvelope::provider_unavailable(self.provider, self.operation, message, class)
            .with_metadata("cause", cause)
    }

    /// The request was cancelled by the caller.
    #[must_use]
    pub fn cancelled(self) -> ErrorEnvelope {
        ErrorEnvelope::cancelled("operation cancelled")
            .with_metadata("provider", self.provider)
            .with_metadata("operation", self.operation)
    }

    /// Map a reqwest transport error.
    #[must_use]
    pub fn transport(self, error: &reqwest::Error) -> ErrorEnvelope {
        if error.is_timeout() {
            return self.envelope(
                format!("{} {} timed out", self.provider, self.operation),
                ErrorClass::Retriable,
                "timeout",
            );
        }
        if error.is_connect() {
            return self.envelope(
                format!("{} connection failed: {error}", self.provider),
                ErrorClass::Retriable,
                "connect",
            );
        }
        self.envelope(
            format!("{} request failed: {error}", self.provider),
            ErrorClass::NonRetriable,
            "request",
        )
    }

    /// Map a non-success HTTP status with an optional provider message.
    #[must_use]
    pub fn status(self, status: StatusCode, detail: Option<&str>) -> ErrorEnvelope {
        let (class, cause) = match status.as_u16() {
            401 | 403 => (ErrorClass::NonRetriable, "unauthorized"),
            404 => (ErrorClass::NonRetriable, "not_found"),
            408 => (ErrorClass::Retriable, "timeout"),
            429 => (ErrorClass::Retriable, "rate_limited"),
            _ if status.is_server_error() => (ErrorClass::Retriable, "server_error"),
            _ => (ErrorClass::NonRetriable, "http_error"),
        };
        let message = detail.map_or_else(
            || format!("{} returned HTTP {}", self.provider, status.as_u16()),
            |detail| {
                format!(
                    "{} returned HTTP {}: {detail}",
                    self.provider,
                    status.as_u16()
                )
            },
        );
        self.envelope(message, class, cause)
            .with_metadata("status", status.as_u16().to_string())
    }

    /// A success response body could not be decoded.
    #[must_use]
    pub fn decode(self, error: &serde_json::Error) -> ErrorEnvelope {
        self.envelope(
            format!("failed to decode {} response: {error}", self.provider),
            ErrorClass::NonRetriable,
            "decode",
        )
    }

    /// A decoded response violated the expected contract.
    #[must_use]
    pub fn invalid_response(self, detail: impl Into<String>) -> ErrorEnvelope {
        self.envelope(detail.into(), ErrorClass::NonRetriable, "invalid_response")
    }
}
