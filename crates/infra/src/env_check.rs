//! Environment validation helpers for CLI surfaces.

use hybrid_rag_config::{RuntimeConfig, RuntimeEnv, apply_env_overrides};
use hybrid_rag_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Validate that the provided env overrides parse and merge into a valid config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    let parsed = RuntimeEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let _ = apply_env_overrides(RuntimeConfig::default(), &parsed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn empty_env_is_valid() -> InfraResult<()> {
        validate_env_parsing(&BTreeMap::new())
    }

    #[test]
    fn malformed_port_is_rejected() {
        assert!(validate_env_parsing(&env(&[("HRAG_SERVER_PORT", "eighty")])).is_err());
    }

    #[test]
    fn aliases_are_accepted() -> InfraResult<()> {
        validate_env_parsing(&env(&[
            ("QDRANT_URL", "http://qdrant:6333"),
            ("LOG_LEVEL", "debug"),
        ]))
    }
}
