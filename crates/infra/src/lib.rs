//! # hybrid-rag-infra
//!
//! Infrastructure wiring and runtime composition: adapter selection from
//! config, the JSON-RPC handler, and the stdio and HTTP transports.
//! This crate depends on `app`, `adapters`, `api`, `config`, and `shared`.

/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Adapter selection and engine composition.
pub mod factory;
/// JSON-RPC over HTTP.
pub mod http;
/// JSON-RPC dispatch.
pub mod rpc;
/// Line-delimited JSON-RPC transport.
pub mod stdio;

pub use config_check::{
    ConfigOutputFormat, load_effective_config, load_effective_config_json, render_config,
};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use factory::{
    StoreBackends, build_classifier_port, build_embedding_port, build_logger,
    build_search_backends, build_store_backends, search_settings, start_engine,
};
pub use rpc::{METHOD_LIST_OFFERINGS, METHOD_SEARCH, RpcHandler};
pub use stdio::{StdioExit, serve_lines, serve_stdio};

// Re-export redaction utilities for CLI boundary sanitization
pub use hybrid_rag_shared::{is_secret_key, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
