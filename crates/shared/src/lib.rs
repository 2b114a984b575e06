//! # hybrid-rag-shared
//!
//! Shared result types, error envelopes, and request context for the
//! hybrid-rag workspace.
//!
//! - `ErrorEnvelope` + `Result<T>` used by every crate
//! - `RequestContext` for correlation ids and cooperative cancellation
//! - secret redaction helpers for logs and config output
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - Error types serialize for logs and transports

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// =============================================================================
// RESULT + ERROR ENVELOPE
// =============================================================================

pub mod errors;
pub mod redaction;
pub mod result;

// =============================================================================
// REQUEST CONTEXT
// =============================================================================

pub mod concurrency;
pub mod timeout;

pub use concurrency::{CancellationToken, CorrelationId, RequestContext};
pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret};
pub use result::Result;
pub use timeout::timeout_with_context;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
