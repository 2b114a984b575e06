//! # hybrid-rag-adapters
//!
//! Adapter implementations for the ports: OpenAI embeddings and intent
//! classification, Qdrant over REST, an in-memory corpus, a hash embedding
//! for offline runs, and the JSON line logger.
//!
//! This crate depends on `ports`, `domain`, `config`, and `shared`; it never
//! sees the application or infrastructure layers.

pub mod classifier;
pub mod embedding;
pub mod log_sink;
pub mod logger;
pub mod memory;
pub mod point;

#[cfg(any(feature = "openai", feature = "qdrant"))]
pub mod http;
#[cfg(any(feature = "openai", feature = "qdrant"))]
pub mod provider_error;

#[cfg(feature = "qdrant")]
pub mod qdrant;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_ports::ports_crate_version;
    use hybrid_rag_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("hybrid-rag-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_infra() {
        let deps = workspace_deps();
        let forbidden = ["hybrid-rag-app", "hybrid-rag-infra", "hybrid-rag-api"];

        for dep in &deps {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
        assert!(deps.iter().any(|dep| dep == "hybrid-rag-ports"));
    }

    #[test]
    fn adapters_crate_compiles() {
        assert!(!adapters_crate_version().is_empty());
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
