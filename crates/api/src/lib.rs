//! # hybrid-rag-api
//!
//! JSON-RPC envelopes, search DTOs, and wire formats.
//! This crate depends only on `domain` and `shared`.

/// API v1 DTOs and JSON-RPC framing.
pub mod v1;

/// Returns the API crate version.
#[must_use]
pub const fn api_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
