//! # hybrid-rag-config
//!
//! Runtime configuration schema, validation, env parsing, and layered loading
//! for the search server. This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    ClassifierConfig, ConfigSchemaError, DEFAULT_OPENAI_BASE_URL, DistanceSetting,
    EmbeddingConfig, EmbeddingProviderKind, LogFormat, LogLevelSetting, RuntimeConfig,
    SearchConfig, ServerConfig, TransportKind, ValidatedRuntimeConfig, VectorStoreConfig,
    VectorStoreProvider, parse_runtime_config_json, parse_runtime_config_toml,
};

pub use env::{EnvParseError, RUNTIME_ENV_VARS, RuntimeEnv, apply_env_overrides};
pub use load::{
    load_runtime_config_from_path, load_runtime_config_from_sources,
    to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_domain::domain_crate_version;
    use hybrid_rag_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_can_use_domain_and_shared() {
        assert_eq!(domain_crate_version(), shared_crate_version());
        assert_eq!(config_crate_version(), shared_crate_version());
    }
}
