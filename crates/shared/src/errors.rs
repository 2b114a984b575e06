//! Error envelope types and helpers.
//!
//! Every fallible operation in the workspace returns an [`ErrorEnvelope`]. The
//! envelope carries a stable [`ErrorCode`] so the transport layer can map
//! failures onto protocol error codes without string matching.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

/// Metadata attached to errors for diagnostics.
pub type ErrorMetadata = BTreeMap<String, String>;

/// High-level classification of error origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Expected failures (validation, user input, cancellation, lifecycle).
    Expected,
    /// Invariant violations, including malformed backend records.
    Invariant,
    /// Unexpected failures (I/O, unavailable providers).
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => formatter.write_str("expected"),
            Self::Invariant => formatter.write_str("invariant"),
            Self::Unexpected => formatter.write_str("unexpected"),
        }
    }
}

/// Retry classification for failure handling.
///
/// Nothing inside the engine retries; the class is informational for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The operation can be retried safely.
    Retriable,
    /// The operation should not be retried.
    NonRetriable,
}

impl ErrorClass {
    /// Returns true when the error is considered retriable.
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retriable => formatter.write_str("retriable"),
            Self::NonRetriable => formatter.write_str("non-retriable"),
        }
    }
}

/// Stable error code with namespace and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Create a new error code with a namespace and code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Core cancellation code.
    pub fn cancelled() -> Self {
        Self::new("core", "cancelled")
    }

    /// Invalid input code.
    pub fn invalid_input() -> Self {
        Self::new("core", "invalid_input")
    }

    /// Not found code.
    pub fn not_found() -> Self {
        Self::new("core", "not_found")
    }

    /// Timeout code.
    pub fn timeout() -> Self {
        Self::new("core", "timeout")
    }

    /// I/O error code.
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// Internal failure code.
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// The engine was used before its backends were wired.
    pub fn not_initialized() -> Self {
        Self::new("core", "not_initialized")
    }

    /// An embedding, vector-store, lexical-store, or classifier call failed.
    pub fn provider_unavailable() -> Self {
        Self::new("core", "provider_unavailable")
    }

    /// A backend returned a record that cannot be interpreted.
    pub fn malformed_result() -> Self {
        Self::new("core", "malformed_result")
    }

    /// Returns the namespace portion.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the code identifier.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured error envelope shared across crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind describing the origin category.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Additional diagnostic metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    /// Create an expected error (always non-retriable).
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Expected,
            class: ErrorClass::NonRetriable,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Create an invariant error (always non-retriable).
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Invariant,
            class: ErrorClass::NonRetriable,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Create an unexpected error with the provided retry classification.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self {
            kind: ErrorKind::Unexpected,
            class,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Create a validation error for caller-supplied input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::invalid_input(), message)
    }

    /// Create a not-initialized error for the named component.
    pub fn not_initialized(component: &'static str) -> Self {
        Self::expected(
            ErrorCode::not_initialized(),
            format!("{component} is not initialized"),
        )
        .with_metadata("component", component)
    }

    /// Create a provider failure carrying the provider and failing operation.
    pub fn provider_unavailable(
        provider: impl Into<String>,
        operation: &'static str,
        message: impl Into<String>,
        class: ErrorClass,
    ) -> Self {
        Self::unexpected(ErrorCode::provider_unavailable(), message, class)
            .with_metadata("provider", provider)
            .with_metadata("operation", operation)
    }

    /// Create a cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::cancelled(), message)
    }

    /// Returns true if the error represents a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::cancelled()
    }

    /// Returns true if the error is a caller input problem.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        self.code == ErrorCode::invalid_input()
    }

    /// Attach a single metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {} {}: {}",
            self.kind, self.class, self.code, self.message
        )
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        let kind = error.kind();
        let code = match kind {
            io::ErrorKind::NotFound => ErrorCode::not_found(),
            io::ErrorKind::TimedOut => ErrorCode::timeout(),
            io::ErrorKind::Interrupted => ErrorCode::cancelled(),
            _ => ErrorCode::io(),
        };
        let class = if is_retriable_io(kind) {
            ErrorClass::Retriable
        } else {
            ErrorClass::NonRetriable
        };
        Self::unexpected(code, error.to_string(), class)
    }
}

const fn is_retriable_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_constructors() {
        let expected = ErrorEnvelope::invalid_input("query must not be empty");
        assert_eq!(expected.kind, ErrorKind::Expected);
        assert_eq!(expected.class, ErrorClass::NonRetriable);
        assert!(expected.is_invalid_input());

        let invariant = ErrorEnvelope::invariant(ErrorCode::internal(), "fused list grew");
        assert_eq!(invariant.kind, ErrorKind::Invariant);
        assert_eq!(invariant.class, ErrorClass::NonRetriable);

        let unexpected =
            ErrorEnvelope::unexpected(ErrorCode::timeout(), "timeout", ErrorClass::Retriable);
        assert_eq!(unexpected.kind, ErrorKind::Unexpected);
        assert!(unexpected.class.is_retriable());
    }

    #[test]
    fn provider_unavailable_records_provider_and_operation() {
        let error = ErrorEnvelope::provider_unavailable(
            "qdrant",
            "vector_store.search",
            "connection refused",
            ErrorClass::Retriable,
        );

        assert_eq!(error.code, ErrorCode::provider_unavailable());
        assert_eq!(
            error.metadata.get("provider").map(String::as_str),
            Some("qdrant")
        );
        assert_eq!(
            error.metadata.get("operation").map(String::as_str),
            Some("vector_store.search")
        );
    }

    #[test]
    fn not_initialized_names_component() {
        let error = ErrorEnvelope::not_initialized("hybrid search engine");
        assert_eq!(error.code, ErrorCode::not_initialized());
        assert_eq!(error.message, "hybrid search engine is not initialized");
    }

    #[test]
    fn io_errors_are_classified() {
        let envelope = ErrorEnvelope::from(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert_eq!(envelope.code, ErrorCode::timeout());
        assert!(envelope.class.is_retriable());

        let envelope = ErrorEnvelope::from(io::Error::other("boom"));
        assert_eq!(envelope.code, ErrorCode::io());
        assert_eq!(envelope.class, ErrorClass::NonRetriable);
    }
}
